//! Error types used by the crate.

use image::ImageError;
use thiserror::Error;

/// Geotile error type.
#[derive(Debug, Error)]
pub enum GeotileError {
    /// Network I/O error (connection, DNS, timeout).
    #[error("failed to load data: {0}")]
    IO(String),
    /// Server responded with a non-success status.
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        /// Requested url.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// Image decoding error.
    #[error("image decode error: {0:?}")]
    ImageDecode(#[from] ImageError),
    /// Error reading/writing data to the FS.
    #[error("failed to access file: {0}")]
    FsIo(#[from] std::io::Error),
    /// Url template of a tile source cannot be formatted.
    #[error("invalid url template '{template}': {reason}")]
    UrlTemplate {
        /// The template.
        template: String,
        /// Formatting error.
        reason: String,
    },
    /// A coordinate lies outside of the area covered by a spatial index.
    #[error("coordinate ({lon}, {lat}) is outside of the index bounds")]
    OutOfBounds {
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },
    /// No `tokio` runtime is available to run downloads on.
    #[error("no tokio runtime available: {0}")]
    Runtime(String),
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<reqwest::Error> for GeotileError {
    fn from(value: reqwest::Error) -> Self {
        Self::IO(value.to_string())
    }
}

impl From<tokio::task::JoinError> for GeotileError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Generic(format!("background task failed: {value}"))
    }
}
