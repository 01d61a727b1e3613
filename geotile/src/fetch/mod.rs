//! Network downloads of tiles.

mod loader;
mod queue;

pub use loader::{HttpTileLoader, TileLoader, DEFAULT_USER_AGENT};
pub use queue::{FetchListener, FetchQueue, FetchedTile};
