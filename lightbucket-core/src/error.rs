//! Error types for lightbucket-core

use thiserror::Error;

/// Main error type for the lightbucket-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential encryption or decryption failed
    #[error("credential error: {0}")]
    Credential(String),

    /// Thumbnail could not be produced from the frame
    #[error("thumbnail error: {0}")]
    Thumbnail(String),

    /// Image decoding or encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for lightbucket-core
pub type Result<T> = std::result::Result<T, Error>;
