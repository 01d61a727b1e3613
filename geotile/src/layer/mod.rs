//! Overlay layers drawn on top of the tiles.

mod geometry_layer;

pub use geometry_layer::{GeometryId, GeometryLayer, DEFAULT_NODE_CAPACITY};
