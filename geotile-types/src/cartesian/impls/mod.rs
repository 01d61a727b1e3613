mod point;

pub use point::{PixelPoint, Point2, Vector2};
