//! Types and functions on geometries in cartesian coordinates.

mod impls;
mod rect;
mod traits;

pub use impls::{PixelPoint, Point2, Vector2};
pub use rect::Rect;
pub use traits::*;
