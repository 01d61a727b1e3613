use crate::cartesian::traits::cartesian_point::CartesianPoint2d;
pub use nalgebra::{Point2, Vector2};
use nalgebra::Scalar;
use num_traits::{Bounded, FromPrimitive};

/// Point in screen/tile pixel space at a specific zoom level.
///
/// Pixel points of different zoom levels are not comparable without reprojection.
pub type PixelPoint = Point2<f64>;

impl<Num: num_traits::Num + Copy + PartialOrd + Bounded + Scalar + FromPrimitive> CartesianPoint2d
    for Point2<Num>
{
    type Num = Num;

    fn x(&self) -> Num {
        self.x
    }
    fn y(&self) -> Num {
        self.y
    }
}
