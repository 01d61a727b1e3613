use std::sync::Arc;

use geotile_types::cartesian::Rect;
use geotile_types::geo::{Projection, MAX_ZOOM};

use super::TileKey;

/// Source of raster tiles: a url template together with the grid the tiles are cut by.
///
/// The source turns grid positions into [`TileKey`]s and computes which tiles cover a viewport.
///
/// ```
/// use std::sync::Arc;
/// use geotile::tile::TileSource;
/// use geotile_types::cartesian::Rect;
/// use geotile_types::geo::SphericalMercator;
///
/// let source = TileSource::new(
///     "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
///     Arc::new(SphericalMercator::new(256)),
/// );
///
/// let tiles = source.visible_tiles(&Rect::new(0.0, 0.0, 512.0, 256.0), 1);
/// assert_eq!(tiles.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TileSource {
    url_template: Arc<str>,
    projection: Arc<dyn Projection>,
    min_zoom: u8,
    max_zoom: u8,
}

impl TileSource {
    /// Creates a new source with zoom levels `0..=18`.
    pub fn new(url_template: impl Into<Arc<str>>, projection: Arc<dyn Projection>) -> Self {
        Self {
            url_template: url_template.into(),
            projection,
            min_zoom: 0,
            max_zoom: 18,
        }
    }

    /// Sets the range of zoom levels the source provides tiles for.
    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom.min(MAX_ZOOM);
        self.max_zoom = max_zoom.clamp(self.min_zoom, MAX_ZOOM);
        self
    }

    /// Url template of the source.
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Projection of the tile grid.
    pub fn projection(&self) -> &Arc<dyn Projection> {
        &self.projection
    }

    /// Tile size in pixels.
    pub fn tile_size(&self) -> u32 {
        self.projection.tile_size()
    }

    /// Minimum zoom level.
    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    /// Maximum zoom level.
    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Returns true if the source can be displayed in the given projection.
    pub fn is_compatible(&self, projection: &dyn Projection) -> bool {
        self.projection.epsg() == projection.epsg()
    }

    /// Key of the tile at the given grid position, or `None` if the position is outside of the
    /// grid or the zoom level is not provided by the source.
    pub fn key(&self, x: u32, y: u32, zoom: u8) -> Option<TileKey> {
        if zoom < self.min_zoom || zoom > self.max_zoom {
            return None;
        }

        if x as u64 >= self.projection.tiles_x(zoom) || y as u64 >= self.projection.tiles_y(zoom) {
            return None;
        }

        Some(TileKey::new(
            self.url_template.clone(),
            x,
            y,
            zoom,
            self.projection.tile_size(),
            self.projection.epsg(),
        ))
    }

    /// Keys of all tiles intersecting the pixel viewport at the given zoom, row by row.
    pub fn visible_tiles(&self, viewport: &Rect, zoom: u8) -> Vec<TileKey> {
        let Some((x_range, y_range)) = self.grid_range(viewport, zoom, 0) else {
            return vec![];
        };

        let mut tiles = vec![];
        for y in y_range.0..=y_range.1 {
            for x in x_range.0..=x_range.1 {
                tiles.extend(self.key(x, y, zoom));
            }
        }

        tiles
    }

    /// Keys of the ring of tiles directly around the tiles covering the pixel viewport.
    ///
    /// These are the tiles worth prefetching in anticipation of panning.
    pub fn prefetch_ring(&self, viewport: &Rect, zoom: u8) -> Vec<TileKey> {
        let Some((inner_x, inner_y)) = self.grid_range(viewport, zoom, 0) else {
            return vec![];
        };
        let Some((outer_x, outer_y)) = self.grid_range(viewport, zoom, 1) else {
            return vec![];
        };

        let mut tiles = vec![];
        for y in outer_y.0..=outer_y.1 {
            for x in outer_x.0..=outer_x.1 {
                let is_inner =
                    (inner_x.0..=inner_x.1).contains(&x) && (inner_y.0..=inner_y.1).contains(&y);
                if !is_inner {
                    tiles.extend(self.key(x, y, zoom));
                }
            }
        }

        tiles
    }

    /// Inclusive ranges of tile indices covering the viewport grown by `margin` tiles, clamped to
    /// the grid.
    fn grid_range(
        &self,
        viewport: &Rect,
        zoom: u8,
        margin: i64,
    ) -> Option<((u32, u32), (u32, u32))> {
        if zoom < self.min_zoom || zoom > self.max_zoom {
            return None;
        }

        let tile_size = self.projection.tile_size() as f64;
        let tiles_x = self.projection.tiles_x(zoom) as i64;
        let tiles_y = self.projection.tiles_y(zoom) as i64;

        let x_min = (viewport.x_min() / tile_size).floor() as i64 - margin;
        let y_min = (viewport.y_min() / tile_size).floor() as i64 - margin;
        // A viewport ending exactly on a tile border does not need the next tile.
        let x_max = (viewport.x_max() / tile_size).ceil() as i64 - 1 + margin;
        let y_max = (viewport.y_max() / tile_size).ceil() as i64 - 1 + margin;

        let x_min = x_min.max(0);
        let y_min = y_min.max(0);
        let x_max = x_max.min(tiles_x - 1);
        let y_max = y_max.min(tiles_y - 1);

        if x_min > x_max || y_min > y_max {
            return None;
        }

        Some(((x_min as u32, x_max as u32), (y_min as u32, y_max as u32)))
    }
}
