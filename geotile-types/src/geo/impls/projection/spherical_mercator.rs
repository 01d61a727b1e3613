use std::f64::consts::PI;

use crate::cartesian::{PixelPoint, Rect};
use crate::geo::traits::projection::{Projection, MAX_ZOOM};
use crate::geo::WorldCoordinate;

use super::DEFAULT_TILE_SIZE;

/// Latitude limit of the Spherical Mercator projection, at which the projected world is square.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Spherical Mercator (EPSG:3857), the projection used by most web tile services.
///
/// Longitude is projected linearly, latitude with `ln(tan(lat) + sec(lat))`. Latitudes outside of
/// [`MAX_MERCATOR_LATITUDE`] are clamped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SphericalMercator {
    tile_size: u32,
}

impl SphericalMercator {
    /// EPSG code of the projection.
    pub const EPSG: u32 = 3857;

    /// Creates a new projection for the given tile size in pixels.
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }
}

impl Default for SphericalMercator {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl Projection for SphericalMercator {
    fn epsg(&self) -> u32 {
        Self::EPSG
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn tiles_x(&self, zoom: u8) -> u64 {
        1 << zoom.min(MAX_ZOOM)
    }

    fn tiles_y(&self, zoom: u8) -> u64 {
        1 << zoom.min(MAX_ZOOM)
    }

    fn to_pixel(&self, coordinate: &WorldCoordinate, zoom: u8) -> PixelPoint {
        let width = self.world_width_px(zoom);
        let height = self.world_height_px(zoom);

        let lat = coordinate
            .lat()
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();

        let x = (coordinate.lon() + 180.0) / 360.0 * width;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * height;

        PixelPoint::new(x, y)
    }

    fn to_world(&self, pixel: &PixelPoint, zoom: u8) -> WorldCoordinate {
        let width = self.world_width_px(zoom);
        let height = self.world_height_px(zoom);

        let lon = pixel.x / width * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * pixel.y / height)).sinh().atan().to_degrees();

        WorldCoordinate::new(lon, lat)
    }

    fn world_bounds(&self) -> Rect {
        Rect::new(-180.0, -MAX_MERCATOR_LATITUDE, 180.0, MAX_MERCATOR_LATITUDE)
    }
}
