//! MedBuddy HTTP API.
//!
//! `GET /health` for liveness and `POST /process` for sticker photos
//! uploaded as multipart form-data.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{AppState, ProcessResponse};
pub use server::{build_router, start_server, RouterOptions};
