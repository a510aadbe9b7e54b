//! Media handling for uploaded sticker photos: file checks, decoding,
//! region cropping, detection, and artifact storage.

pub mod artifacts;
pub mod detect;
pub mod crop;
pub mod mime_detect;
pub mod upload;

pub use artifacts::ArtifactStore;
pub use detect::{FullFrameDetector, HttpDetector};
pub use crop::{crop_region, crop_to_png, decode_image, decode_image_blocking, encode_png, png_data_uri, StickerCrop};
pub use mime_detect::{extension_of, is_allowed_extension};
pub use upload::{sanitize_filename, save_upload, upload_file_name};
