use nalgebra::{Point2, Scalar};
use num_traits::{FromPrimitive, Num};
use serde::{Deserialize, Serialize};

use crate::cartesian::traits::cartesian_point::CartesianPoint2d;

/// Axis-aligned rectangle.
///
/// The same type is used as a bounding box in world coordinates (`x` is longitude, `y` is latitude)
/// and in pixel space. A rectangle constructed with [`Rect::from_corners`] is always normalized, so
/// `x_min <= x_max` and `y_min <= y_max` hold.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect<N = f64> {
    /// Minimum X coordinate.
    pub x_min: N,
    /// Minimum Y coordinate.
    pub y_min: N,
    /// Maximum X coordinate.
    pub x_max: N,
    /// Maximum Y coordinate.
    pub y_max: N,
}

impl<N: Num + Copy + PartialOrd + Scalar + FromPrimitive> Rect<N> {
    /// Creates a new rectangle from its bounds. The caller is responsible for the bounds being
    /// ordered, use [`Rect::from_corners`] otherwise.
    pub fn new(x_min: N, y_min: N, x_max: N, y_max: N) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a normalized rectangle from two opposite corners given in any order.
    ///
    /// ```
    /// use geotile_types::cartesian::{Point2, Rect};
    ///
    /// let rect = Rect::from_corners(&Point2::new(-180.0, 90.0), &Point2::new(180.0, -90.0));
    /// assert_eq!(rect, Rect::new(-180.0, -90.0, 180.0, 90.0));
    /// ```
    pub fn from_corners(
        a: &impl CartesianPoint2d<Num = N>,
        b: &impl CartesianPoint2d<Num = N>,
    ) -> Self {
        let (x_min, x_max) = if a.x() <= b.x() {
            (a.x(), b.x())
        } else {
            (b.x(), a.x())
        };
        let (y_min, y_max) = if a.y() <= b.y() {
            (a.y(), b.y())
        } else {
            (b.y(), a.y())
        };

        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Minimum X coordinate.
    pub fn x_min(&self) -> N {
        self.x_min
    }

    /// Maximum X coordinate.
    pub fn x_max(&self) -> N {
        self.x_max
    }

    /// Minimum Y coordinate.
    pub fn y_min(&self) -> N {
        self.y_min
    }

    /// Maximum Y coordinate.
    pub fn y_max(&self) -> N {
        self.y_max
    }

    /// Width of the rectangle.
    pub fn width(&self) -> N {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> N {
        self.y_max - self.y_min
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: if self.x_min < other.x_min {
                self.x_min
            } else {
                other.x_min
            },
            y_min: if self.y_min < other.y_min {
                self.y_min
            } else {
                other.y_min
            },
            x_max: if self.x_max > other.x_max {
                self.x_max
            } else {
                other.x_max
            },
            y_max: if self.y_max > other.y_max {
                self.y_max
            } else {
                other.y_max
            },
        }
    }

    /// Bounding rectangle of the given points. Returns `None` if the iterator is empty.
    pub fn from_points<'a, P: CartesianPoint2d<Num = N> + 'a>(
        mut points: impl Iterator<Item = &'a P>,
    ) -> Option<Self> {
        let first = points.next()?;
        let mut x_min = first.x();
        let mut y_min = first.y();
        let mut x_max = first.x();
        let mut y_max = first.y();

        for p in points {
            if x_min > p.x() {
                x_min = p.x();
            }
            if y_min > p.y() {
                y_min = p.y();
            }
            if x_max < p.x() {
                x_max = p.x();
            }
            if y_max < p.y() {
                y_max = p.y();
            }
        }

        Some(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Returns true if the point lies inside the rectangle or on its border.
    pub fn contains(&self, point: &impl CartesianPoint2d<Num = N>) -> bool {
        self.x_min <= point.x()
            && self.x_max >= point.x()
            && self.y_min <= point.y()
            && self.y_max >= point.y()
    }

    /// Returns true if the rectangles have at least one common point (touching borders count).
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Returns true if `other` lies completely inside `self`.
    pub fn contains_rect(&self, other: &Self) -> bool {
        self.x_min <= other.x_min
            && self.x_max >= other.x_max
            && self.y_min <= other.y_min
            && self.y_max >= other.y_max
    }

    /// Returns the rectangle grown by `amount` in every direction.
    pub fn expand(&self, amount: N) -> Self {
        Self {
            x_min: self.x_min - amount,
            x_max: self.x_max + amount,
            y_min: self.y_min - amount,
            y_max: self.y_max + amount,
        }
    }
}

impl Rect<f64> {
    /// Center point of the rectangle.
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Splits the rectangle into four quadrants through its center, in the order
    /// `[NE, NW, SE, SW]` (with `y` growing to the north).
    ///
    /// The quadrants share their inner borders and together cover the rectangle exactly.
    pub fn quadrants(&self) -> [Rect<f64>; 4] {
        let center = self.center();
        [
            Rect::new(center.x, center.y, self.x_max, self.y_max),
            Rect::new(self.x_min, center.y, center.x, self.y_max),
            Rect::new(center.x, self.y_min, self.x_max, center.y),
            Rect::new(self.x_min, self.y_min, center.x, center.y),
        ]
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes() {
        let rect = Rect::from_corners(&Point2::new(10.0, -5.0), &Point2::new(-10.0, 5.0));
        assert_eq!(rect, Rect::new(-10.0, -5.0, 10.0, 5.0));
    }

    #[test]
    fn contains_includes_border() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(&Point2::new(0.0, 10.0)));
        assert!(rect.contains(&Point2::new(5.0, 5.0)));
        assert!(!rect.contains(&Point2::new(10.1, 5.0)));
    }

    #[test]
    fn intersects() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.intersects(&Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(rect.intersects(&Rect::new(10.0, 10.0, 15.0, 15.0)));
        assert!(!rect.intersects(&Rect::new(11.0, 0.0, 15.0, 10.0)));
    }

    #[test]
    fn quadrants_cover_parent_exactly() {
        let rect = Rect::new(-180.0, -90.0, 180.0, 90.0);
        let quadrants = rect.quadrants();

        let total_area: f64 = quadrants.iter().map(|q| q.area()).sum();
        assert_eq!(total_area, rect.area());

        let merged = quadrants[1..]
            .iter()
            .fold(quadrants[0], |acc, q| acc.merge(*q));
        assert_eq!(merged, rect);

        assert_eq!(quadrants[0], Rect::new(0.0, 0.0, 180.0, 90.0));
        assert_eq!(quadrants[3], Rect::new(-180.0, -90.0, 0.0, 0.0));
    }
}
