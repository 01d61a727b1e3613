use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GeotileTypesError;
use crate::geo::impls::projection::{Equirectangular, SphericalMercator};
use crate::geo::traits::projection::Projection;

/// Supported projection variants.
///
/// This is a serializable selector of a projection, used in configuration. The actual math is
/// provided by the [`Projection`] implementation returned by [`ProjectionType::projection`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionType {
    /// Spherical Mercator, EPSG:3857.
    SphericalMercator,
    /// Equirectangular, EPSG:4326.
    Equirectangular,
}

impl ProjectionType {
    /// EPSG code of the projection.
    pub fn epsg(&self) -> u32 {
        match self {
            ProjectionType::SphericalMercator => SphericalMercator::EPSG,
            ProjectionType::Equirectangular => Equirectangular::EPSG,
        }
    }

    /// Projection variant with the given EPSG code.
    pub fn from_epsg(epsg: u32) -> Result<Self, GeotileTypesError> {
        match epsg {
            SphericalMercator::EPSG => Ok(ProjectionType::SphericalMercator),
            Equirectangular::EPSG => Ok(ProjectionType::Equirectangular),
            other => Err(GeotileTypesError::UnsupportedProjection(other)),
        }
    }

    /// Creates the projection for tiles of the given size.
    pub fn projection(&self, tile_size: u32) -> Arc<dyn Projection> {
        match self {
            ProjectionType::SphericalMercator => Arc::new(SphericalMercator::new(tile_size)),
            ProjectionType::Equirectangular => Arc::new(Equirectangular::new(tile_size)),
        }
    }
}
