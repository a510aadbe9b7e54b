use thiserror::Error;

/// Top-level error type for the MedBuddy pipeline.
///
/// Only infrastructure failures are represented here. A sticker the model
/// could not read is not an error; it simply yields no schedule.
#[derive(Debug, Error)]
pub enum MedError {
    #[error("image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("Empty file uploaded")]
    EmptyImage,

    #[error("sticker detection failed ({detector}): {message}")]
    Detection { detector: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
