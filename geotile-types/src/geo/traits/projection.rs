use std::fmt::Debug;

use crate::cartesian::{PixelPoint, Rect};
use crate::geo::WorldCoordinate;

/// Highest zoom level a projection distinguishes. Larger zoom levels are treated as this one.
pub const MAX_ZOOM: u8 = 30;

/// Conversion between geographic coordinates and pixel space of a tile grid.
///
/// A projection is pure and stateless: every method is a function of its arguments and the tile
/// size the projection was created with. The pixel space at zoom `z` spans
/// `tiles_x(z) * tile_size` pixels horizontally and `tiles_y(z) * tile_size` pixels vertically,
/// with the origin in the top left (north-west) corner.
///
/// Zoom levels above [`MAX_ZOOM`] are clamped to it, so the pixel space is never degenerate.
///
/// There is no process-wide projection: the value is handed explicitly to every component that
/// needs coordinate math, so one render uses one projection consistently.
pub trait Projection: Debug + Send + Sync {
    /// EPSG code identifying the projection.
    fn epsg(&self) -> u32;

    /// Width and height of a single tile in pixels.
    fn tile_size(&self) -> u32;

    /// Number of tiles spanning the world horizontally at the given zoom.
    fn tiles_x(&self, zoom: u8) -> u64;

    /// Number of tiles spanning the world vertically at the given zoom.
    fn tiles_y(&self, zoom: u8) -> u64;

    /// Projects the coordinate into pixel space.
    fn to_pixel(&self, coordinate: &WorldCoordinate, zoom: u8) -> PixelPoint;

    /// Converts the pixel point back into a geographic coordinate. Exact inverse of
    /// [`Projection::to_pixel`] inside the valid domain of the projection.
    fn to_world(&self, pixel: &PixelPoint, zoom: u8) -> WorldCoordinate;

    /// Part of the world the projection can represent, in world coordinates.
    fn world_bounds(&self) -> Rect;

    /// Width of the whole world in pixels at the given zoom.
    fn world_width_px(&self, zoom: u8) -> f64 {
        self.tiles_x(zoom) as f64 * self.tile_size() as f64
    }

    /// Height of the whole world in pixels at the given zoom.
    fn world_height_px(&self, zoom: u8) -> f64 {
        self.tiles_y(zoom) as f64 * self.tile_size() as f64
    }

    /// Projects a world rectangle into a (normalized) pixel rectangle.
    fn to_pixel_rect(&self, rect: &Rect, zoom: u8) -> Rect {
        let a = self.to_pixel(&WorldCoordinate::new(rect.x_min(), rect.y_max()), zoom);
        let b = self.to_pixel(&WorldCoordinate::new(rect.x_max(), rect.y_min()), zoom);
        Rect::from_corners(&a, &b)
    }

    /// Converts a pixel rectangle into a (normalized) world rectangle.
    fn to_world_rect(&self, rect: &Rect, zoom: u8) -> Rect {
        let a = self.to_world(&PixelPoint::new(rect.x_min(), rect.y_min()), zoom);
        let b = self.to_world(&PixelPoint::new(rect.x_max(), rect.y_max()), zoom);
        Rect::from_corners(&a, &b)
    }
}
