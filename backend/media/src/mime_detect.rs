//! Extension checks for uploaded files.

/// Lower-cased extension of a file name (text after the last `.`).
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Whether `filename` has a dot and an extension in `allowed`.
///
/// `allowed` entries are compared lower-case without the leading dot.
pub fn is_allowed_extension<S: AsRef<str>>(filename: &str, allowed: &[S]) -> bool {
    match extension_of(filename) {
        Some(ext) => allowed.iter().any(|a| a.as_ref() == ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_allowed_extension("IMG_0042.JPEG", &ALLOWED));
        assert!(is_allowed_extension("archive.tar.png", &ALLOWED));
    }

    #[test]
    fn rejects_text_and_bare_names() {
        assert!(!is_allowed_extension("notes.txt", &ALLOWED));
        assert!(!is_allowed_extension("png", &ALLOWED));
        assert!(!is_allowed_extension("photo.", &ALLOWED));
    }
}
