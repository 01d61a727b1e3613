use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::GeotileError;

/// Identity of one tile image.
///
/// The key includes everything that affects the content of the image: the tile source (identified
/// by its url template), the position of the tile in the grid, the tile size and the projection.
/// Two sources with different projections or tile sizes never share cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    source: Arc<str>,
    x: u32,
    y: u32,
    zoom: u8,
    tile_size: u32,
    epsg: u32,
}

impl TileKey {
    /// Creates a new key.
    ///
    /// `source` is the url template of the tile source, with `{x}`, `{y}` and `{z}` placeholders.
    pub fn new(source: Arc<str>, x: u32, y: u32, zoom: u8, tile_size: u32, epsg: u32) -> Self {
        Self {
            source,
            x,
            y,
            zoom,
            tile_size,
            epsg,
        }
    }

    /// Url template of the tile source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// X index of the tile.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Y index of the tile.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Zoom level of the tile.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Tile size in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// EPSG code of the tile projection.
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Url to download the tile from.
    ///
    /// Different keys may map to the same url (e.g. a template without the `{z}` placeholder);
    /// downloads are coalesced by url.
    pub fn url(&self) -> Result<String, GeotileError> {
        let mut vars = HashMap::with_capacity(3);
        vars.insert("x".to_string(), self.x.to_string());
        vars.insert("y".to_string(), self.y.to_string());
        vars.insert("z".to_string(), self.zoom.to_string());

        strfmt::strfmt(&self.source, &vars).map_err(|err| GeotileError::UrlTemplate {
            template: self.source.to_string(),
            reason: err.to_string(),
        })
    }

    /// Stable name of the tile used by persistent caches.
    ///
    /// This is a hex encoded SHA-256 digest over all fields of the key, so it does not change
    /// between runs of the application.
    pub fn cache_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        hasher.update([0]);
        hasher.update(self.x.to_le_bytes());
        hasher.update(self.y.to_le_bytes());
        hasher.update([self.zoom]);
        hasher.update(self.tile_size.to_le_bytes());
        hasher.update(self.epsg.to_le_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{} ({}px, EPSG:{}) of {}",
            self.zoom, self.x, self.y, self.tile_size, self.epsg, self.source
        )
    }
}
