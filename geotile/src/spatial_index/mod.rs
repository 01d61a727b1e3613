//! Spatial index used to find overlay geometries by world coordinate.

mod quadtree;

pub use quadtree::{QuadTree, MAX_DEPTH};
