//! Geographic coordinates (longitude and latitude, see [`WorldCoordinate`]) and their conversion
//! into pixel space at a zoom level (see [`Projection`]).

mod crs;
pub mod impls;
mod traits;

pub use crs::ProjectionType;
pub use impls::point::WorldCoordinate;
pub use impls::projection::{Equirectangular, SphericalMercator, MAX_MERCATOR_LATITUDE};
pub use traits::projection::{Projection, MAX_ZOOM};
