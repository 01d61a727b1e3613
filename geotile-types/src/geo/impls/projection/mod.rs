//! Implementations of the supported projections.
mod equirectangular;
mod spherical_mercator;

pub use equirectangular::Equirectangular;
pub use spherical_mercator::{SphericalMercator, MAX_MERCATOR_LATITUDE};

/// Tile size used by most public tile services.
pub const DEFAULT_TILE_SIZE: u32 = 256;
