//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum GeotileTypesError {
    /// The EPSG code does not correspond to a supported projection.
    #[error("unsupported projection EPSG:{0}")]
    UnsupportedProjection(u32),
}
