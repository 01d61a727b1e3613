//! Geotile is the data core of an interactive tile map: it turns tile requests into images and
//! answers spatial queries over overlay geometries fast enough to run on every repaint.
//!
//! # Main components
//!
//! * [`TileCache`](tile_cache::TileCache) resolves a [`TileKey`](tile::TileKey) into an image. It
//!   looks into the in-memory cache first, then into an optional persistent (file) cache, and
//!   finally schedules a download with the [`FetchQueue`](fetch::FetchQueue). Requests never block:
//!   while a tile is being loaded a placeholder image is returned, and a
//!   [`TileEvent::ImageUpdated`](tile_cache::TileEvent) is sent once the tile arrives.
//! * [`FetchQueue`](fetch::FetchQueue) runs downloads on a `tokio` runtime, coalescing concurrent
//!   requests for the same url into one download and supporting cancellation of all of them.
//! * [`QuadTree`](spatial_index::QuadTree) is a region quadtree mapping world coordinates to
//!   handles.
//! * [`GeometryLayer`](layer::GeometryLayer) owns a set of geometries and a quadtree over their
//!   vertices, and provides viewport culling and hit-testing.
//!
//! Coordinate math is provided by the [`geotile_types`] crate: a
//! [`Projection`](geotile_types::geo::Projection) value is passed explicitly to every component
//! that converts between world coordinates and pixels.
//!
//! ```no_run
//! use geotile::tile::TileSource;
//! use geotile::tile_cache::TileCacheBuilder;
//! use geotile_types::geo::SphericalMercator;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), geotile::error::GeotileError> {
//! let source = TileSource::new(
//!     "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
//!     Arc::new(SphericalMercator::new(256)),
//! );
//! let cache = TileCacheBuilder::new()
//!     .with_file_cache("target/tile_cache", std::time::Duration::from_secs(3600))
//!     .build()?;
//!
//! if let Some(key) = source.key(0, 0, 0) {
//!     let image = cache.get_image(&key);
//!     assert!(image.is_placeholder());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub(crate) mod async_runtime;
pub mod decoded_image;
pub mod error;
pub mod fetch;
pub mod layer;
mod messenger;
pub mod spatial_index;
pub mod tile;
pub mod tile_cache;

#[cfg(test)]
mod tests;

pub use messenger::{DummyMessenger, Messenger};

// Reexport geotile_types
pub use geotile_types;
