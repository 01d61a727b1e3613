//! Tile identities and the sources they are loaded from.

mod key;
mod source;

pub use geotile_types::geo::MAX_ZOOM;
pub use key::TileKey;
pub use source::TileSource;
