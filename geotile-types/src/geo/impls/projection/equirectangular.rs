use crate::cartesian::{PixelPoint, Rect};
use crate::geo::traits::projection::{Projection, MAX_ZOOM};
use crate::geo::WorldCoordinate;

use super::DEFAULT_TILE_SIZE;

/// Equirectangular projection (EPSG:4326, plate carrée).
///
/// Both axes are linear. The world is twice as wide as it is tall, so at every zoom level there are
/// twice as many tiles horizontally as vertically.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Equirectangular {
    tile_size: u32,
}

impl Equirectangular {
    /// EPSG code of the projection.
    pub const EPSG: u32 = 4326;

    /// Creates a new projection for the given tile size in pixels.
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }
}

impl Default for Equirectangular {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl Projection for Equirectangular {
    fn epsg(&self) -> u32 {
        Self::EPSG
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn tiles_x(&self, zoom: u8) -> u64 {
        2 << zoom.min(MAX_ZOOM)
    }

    fn tiles_y(&self, zoom: u8) -> u64 {
        1 << zoom.min(MAX_ZOOM)
    }

    fn to_pixel(&self, coordinate: &WorldCoordinate, zoom: u8) -> PixelPoint {
        let x = (coordinate.lon() + 180.0) / 360.0 * self.world_width_px(zoom);
        let y = (90.0 - coordinate.lat()) / 180.0 * self.world_height_px(zoom);
        PixelPoint::new(x, y)
    }

    fn to_world(&self, pixel: &PixelPoint, zoom: u8) -> WorldCoordinate {
        let lon = pixel.x / self.world_width_px(zoom) * 360.0 - 180.0;
        let lat = 90.0 - pixel.y / self.world_height_px(zoom) * 180.0;
        WorldCoordinate::new(lon, lat)
    }

    fn world_bounds(&self) -> Rect {
        Rect::new(-180.0, -90.0, 180.0, 90.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn world_is_twice_as_wide() {
        let projection = Equirectangular::new(256);
        assert_eq!(projection.tiles_x(0), 2);
        assert_eq!(projection.tiles_y(0), 1);
        assert_eq!(projection.world_width_px(3), 2.0 * projection.world_height_px(3));
    }

    #[test]
    fn tile_count_doubles_per_zoom() {
        let projection = Equirectangular::default();
        for zoom in 0..20 {
            assert_eq!(projection.tiles_x(zoom + 1), 2 * projection.tiles_x(zoom));
            assert_eq!(projection.tiles_y(zoom + 1), 2 * projection.tiles_y(zoom));
        }
    }

    #[test]
    fn zoom_is_clamped() {
        let projection = Equirectangular::default();
        assert_eq!(projection.tiles_x(63), 2 << MAX_ZOOM);
        assert_eq!(projection.tiles_y(u8::MAX), projection.tiles_y(MAX_ZOOM));
        assert!(projection.world_width_px(64) > 0.0);

        let restored = projection.to_world(&PixelPoint::new(256.0, 128.0), 0);
        assert_abs_diff_eq!(restored, WorldCoordinate::new(0.0, 0.0));
    }

    #[test]
    fn corners() {
        let projection = Equirectangular::new(256);
        let top_left = projection.to_pixel(&WorldCoordinate::new(-180.0, 90.0), 0);
        assert_abs_diff_eq!(top_left.x, 0.0);
        assert_abs_diff_eq!(top_left.y, 0.0);

        let center = projection.to_pixel(&WorldCoordinate::new(0.0, 0.0), 0);
        assert_abs_diff_eq!(center.x, 256.0);
        assert_abs_diff_eq!(center.y, 128.0);
    }

    #[test]
    fn round_trip() {
        let projection = Equirectangular::new(512);
        for zoom in [0, 3, 10, 17] {
            for lon in [-180.0, -77.03, 0.0, 2.35, 180.0] {
                for lat in [-90.0, -33.9, 0.0, 48.85, 90.0] {
                    let coordinate = WorldCoordinate::new(lon, lat);
                    let pixel = projection.to_pixel(&coordinate, zoom);
                    let restored = projection.to_world(&pixel, zoom);
                    assert_abs_diff_eq!(restored, coordinate, epsilon = 1e-9);
                }
            }
        }
    }
}
