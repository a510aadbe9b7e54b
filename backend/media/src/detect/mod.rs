//! Sticker region detectors.

pub mod full_frame;
pub mod http;

pub use full_frame::FullFrameDetector;
pub use http::HttpDetector;
