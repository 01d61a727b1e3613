//! Value types shared by the `geotile` map engine.
//!
//! * [`geo`] contains the geographic [`WorldCoordinate`](geo::WorldCoordinate) and the
//!   [`Projection`](geo::Projection) variants converting it into pixel space at a zoom level.
//! * [`cartesian`] contains pixel space points and the axis-aligned [`Rect`](cartesian::Rect)
//!   used as a bounding box in both coordinate spaces.
//! * [`geometry`] contains the overlay geometries an application draws over the tiles.

pub mod cartesian;
pub mod error;
pub mod geo;
pub mod geometry;

pub use geometry::Geometry;
