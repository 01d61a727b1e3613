//! Overlay geometries drawn by the application on top of the tiles.

use serde::{Deserialize, Serialize};

use crate::cartesian::{CartesianPoint2d, PixelPoint, Rect};
use crate::geo::{Projection, WorldCoordinate};

/// Geometry in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Single point.
    Point(WorldCoordinate),
    /// Open chain of line segments.
    LineString(Vec<WorldCoordinate>),
    /// Closed ring. The closing segment from the last to the first vertex is implicit.
    Polygon(Vec<WorldCoordinate>),
}

impl Geometry {
    /// All vertices of the geometry.
    pub fn vertices(&self) -> &[WorldCoordinate] {
        match self {
            Geometry::Point(point) => std::slice::from_ref(point),
            Geometry::LineString(points) | Geometry::Polygon(points) => points,
        }
    }

    /// Bounding rectangle of the geometry in world coordinates. `None` for empty geometries.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.vertices().iter())
    }

    /// Returns true if the pixel point lies within `tolerance` pixels of the geometry as drawn at
    /// the given zoom level. Points inside a polygon always hit it.
    pub fn hit_test(
        &self,
        projection: &dyn Projection,
        zoom: u8,
        pixel: &PixelPoint,
        tolerance: f64,
    ) -> bool {
        let projected: Vec<PixelPoint> = self
            .vertices()
            .iter()
            .map(|vertex| projection.to_pixel(vertex, zoom))
            .collect();
        let tolerance_sq = tolerance * tolerance;

        match self {
            Geometry::Point(_) => projected
                .first()
                .is_some_and(|p| p.distance_sq(pixel) <= tolerance_sq),
            Geometry::LineString(_) => {
                if projected.len() == 1 {
                    return projected[0].distance_sq(pixel) <= tolerance_sq;
                }

                projected
                    .windows(2)
                    .any(|segment| {
                        segment_distance_sq(&segment[0], &segment[1], pixel) <= tolerance_sq
                    })
            }
            Geometry::Polygon(_) => {
                if projected.is_empty() {
                    return false;
                }

                if ring_contains(&projected, pixel) {
                    return true;
                }

                let closing = [projected[projected.len() - 1], projected[0]];
                projected
                    .windows(2)
                    .chain(std::iter::once(&closing[..]))
                    .any(|segment| {
                        segment_distance_sq(&segment[0], &segment[1], pixel) <= tolerance_sq
                    })
            }
        }
    }
}

impl From<WorldCoordinate> for Geometry {
    fn from(value: WorldCoordinate) -> Self {
        Geometry::Point(value)
    }
}

fn segment_distance_sq(a: &PixelPoint, b: &PixelPoint, p: &PixelPoint) -> f64 {
    let ab = b.sub(a);
    let length_sq = ab.x * ab.x + ab.y * ab.y;
    if length_sq == 0.0 {
        return a.distance_sq(p);
    }

    let ap = p.sub(a);
    let t = ((ap.x * ab.x + ap.y * ab.y) / length_sq).clamp(0.0, 1.0);
    let closest = PixelPoint::new(a.x + ab.x * t, a.y + ab.y * t);
    closest.distance_sq(p)
}

// Even-odd rule.
fn ring_contains(ring: &[PixelPoint], p: &PixelPoint) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }

    inside
}
