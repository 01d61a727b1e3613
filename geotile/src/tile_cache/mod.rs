//! In-memory and persistent cache of tile images.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use quick_cache::sync::Cache;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::decoded_image::DecodedImage;
use crate::error::GeotileError;
use crate::fetch::{FetchListener, FetchQueue, FetchedTile, HttpTileLoader, TileLoader};
use crate::messenger::Messenger;
use crate::tile::TileKey;

mod builder;
mod config;
pub mod file_cache;

pub use builder::TileCacheBuilder;
pub use config::{PersistentCacheConfig, TileCacheConfig, DEFAULT_MEMORY_CAPACITY};
pub use file_cache::{CacheLookup, FileCacheController, PersistentCacheController};

/// Color of the placeholder returned for tiles that are not loaded yet.
pub const PLACEHOLDER_COLOR: [u8; 4] = [224, 224, 224, 255];

/// Image returned by the [`TileCache`].
#[derive(Debug, Clone)]
pub enum TileImage {
    /// The tile image.
    Ready(Arc<DecodedImage>),
    /// The tile is not available yet, the image is the "loading" placeholder.
    Loading(Arc<DecodedImage>),
}

impl TileImage {
    /// The image to draw.
    pub fn image(&self) -> &Arc<DecodedImage> {
        match self {
            Self::Ready(image) | Self::Loading(image) => image,
        }
    }

    /// Returns true if the image is the loading placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    /// The tile image, or `None` for the placeholder.
    pub fn into_ready(self) -> Option<Arc<DecodedImage>> {
        match self {
            Self::Ready(image) => Some(image),
            Self::Loading(_) => None,
        }
    }
}

/// Notifications sent by the [`TileCache`] to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEvent {
    /// A tile requested with [`TileCache::get_image`] is now available. Sent once per completed
    /// download, never for prefetched tiles.
    ImageUpdated(TileKey),
    /// Number of downloads in flight has changed.
    QueueSizeChanged(usize),
    /// All downloads have completed.
    AllFinished,
}

pub(crate) struct HttpSettings {
    pub(crate) user_agent: String,
    pub(crate) proxy: Option<String>,
    pub(crate) timeout: Option<Duration>,
}

/// Resolves tile keys into images.
///
/// A request goes through the in-memory cache, then the persistent cache (if enabled), and
/// finally schedules a download. Requests never block on the network: a tile that is not
/// available yet is returned as [`TileImage::Loading`], and once it is downloaded a
/// [`TileEvent::ImageUpdated`] is sent to the subscribers and the messenger is asked to redraw.
///
/// Tile state goes `absent -> loading -> cached`. A failed download returns the tile to the
/// absent state, so the next request retries it. Entries of the persistent cache that are older
/// than its time-to-live are deleted and loaded again.
///
/// Downloads are coalesced by url: any number of requests of keys with the same url while the
/// download is in flight result in one network request.
pub struct TileCache {
    state: Arc<CacheState>,
    fetch_queue: FetchQueue,
    http: Mutex<HttpSettings>,
}

struct CacheState {
    memory: Cache<TileKey, Arc<DecodedImage>>,
    persistent: RwLock<Option<Arc<dyn PersistentCacheController>>>,
    // Lock order: `pending` is always locked before the fetch queue state.
    pending: Mutex<HashMap<String, Vec<PendingTile>, ahash::RandomState>>,
    placeholders: Mutex<HashMap<u32, Arc<DecodedImage>>>,
    subscribers: Mutex<Vec<UnboundedSender<TileEvent>>>,
    messenger: RwLock<Option<Arc<dyn Messenger>>>,
}

struct PendingTile {
    key: TileKey,
    prefetch: bool,
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("memory_len", &self.memory_len())
            .field("load_queue_size", &self.load_queue_size())
            .finish()
    }
}

impl TileCache {
    pub(crate) fn new(
        memory_capacity: usize,
        loader: Arc<dyn TileLoader>,
        persistent: Option<Arc<dyn PersistentCacheController>>,
        http: HttpSettings,
        runtime: Handle,
        messenger: Option<Arc<dyn Messenger>>,
    ) -> Self {
        let state = Arc::new(CacheState {
            memory: Cache::new(memory_capacity.max(1)),
            persistent: RwLock::new(persistent),
            pending: Mutex::new(HashMap::default()),
            placeholders: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(vec![]),
            messenger: RwLock::new(messenger),
        });

        let fetch_queue = FetchQueue::new(loader, state.clone(), runtime);

        Self {
            state,
            fetch_queue,
            http: Mutex::new(http),
        }
    }

    /// Returns the image of the tile, or the placeholder if the tile is not available yet.
    ///
    /// If the tile is neither in memory nor in the persistent cache, its download is scheduled
    /// and a [`TileEvent::ImageUpdated`] is sent when it completes.
    pub fn get_image(&self, key: &TileKey) -> TileImage {
        self.request(key, false)
    }

    /// Same as [`TileCache::get_image`], but no notification is sent when the download completes.
    ///
    /// Used for tiles that are not visible yet, e.g. the ring around the viewport. If the same
    /// tile is requested with [`TileCache::get_image`] before the download completes, the
    /// notification is sent.
    pub fn prefetch_image(&self, key: &TileKey) -> TileImage {
        self.request(key, true)
    }

    fn request(&self, key: &TileKey, prefetch: bool) -> TileImage {
        if let Some(image) = self.state.memory.get(key) {
            return TileImage::Ready(image);
        }

        let placeholder = self.state.placeholder(key.tile_size());
        let url = match key.url() {
            Ok(url) => url,
            Err(err) => {
                log::warn!("Cannot request tile {key}: {err}");
                return TileImage::Loading(placeholder);
            }
        };

        {
            let mut pending = self.state.pending.lock();
            // Completions write the memory cache under the `pending` lock, so a tile is either
            // in memory or still pending here.
            if let Some(image) = self.state.memory.get(key) {
                return TileImage::Ready(image);
            }

            if let Some(tiles) = pending.get_mut(&url) {
                add_pending(tiles, key, prefetch);
                return TileImage::Loading(placeholder);
            }
        }

        if let Some(image) = self.state.load_persistent(key) {
            return TileImage::Ready(image);
        }

        let mut pending = self.state.pending.lock();
        if let Some(image) = self.state.memory.get(key) {
            return TileImage::Ready(image);
        }

        match pending.entry(url) {
            Entry::Occupied(mut entry) => add_pending(entry.get_mut(), key, prefetch),
            Entry::Vacant(entry) => {
                log::debug!("Tile {key} is not cached, loading from {}", entry.key());
                self.fetch_queue.enqueue(entry.key());
                entry.insert(vec![PendingTile {
                    key: key.clone(),
                    prefetch,
                }]);
            }
        }

        TileImage::Loading(placeholder)
    }

    /// Returns true if the tile is being downloaded.
    pub fn is_loading(&self, key: &TileKey) -> bool {
        let pending = self.state.pending.lock();
        pending
            .values()
            .any(|tiles| tiles.iter().any(|tile| &tile.key == key))
    }

    /// Returns true if the tile is in the in-memory cache.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.state.memory.get(key).is_some()
    }

    /// Number of tiles in the in-memory cache.
    pub fn memory_len(&self) -> usize {
        self.state.memory.len()
    }

    /// Drops all tiles from the in-memory cache. The persistent cache is not affected.
    pub fn clear_memory(&self) {
        self.state.memory.clear();
    }

    /// Number of downloads in flight.
    pub fn load_queue_size(&self) -> usize {
        self.fetch_queue.queue_size()
    }

    /// Cancels all downloads in flight.
    ///
    /// Results of the cancelled downloads are never written into the cache, and their tiles
    /// return to the absent state. Used when the zoom level changes.
    pub fn abort_loading(&self) {
        let mut pending = self.state.pending.lock();
        let aborted = self.fetch_queue.abort_all();
        pending.clear();
        if aborted > 0 {
            log::debug!("Aborted loading of {aborted} tiles");
        }
    }

    /// Enables the file cache in the given folder.
    ///
    /// Files older than `ttl` are considered expired; a zero `ttl` means the files never expire.
    /// Returns false (and keeps the current persistent cache) if the folder cannot be created.
    pub fn enable_persistent_cache(&self, ttl: Duration, path: impl AsRef<Path>) -> bool {
        match FileCacheController::new(path.as_ref(), ttl) {
            Ok(controller) => {
                log::info!("Persistent tile cache enabled in {:?}", path.as_ref());
                self.set_cache_controller(controller);
                true
            }
            Err(err) => {
                log::warn!("Persistent tile cache cannot be enabled: {err}");
                false
            }
        }
    }

    /// Replaces the persistent cache.
    pub fn set_cache_controller(&self, controller: impl PersistentCacheController + 'static) {
        *self.state.persistent.write() = Some(Arc::new(controller));
    }

    /// Disables the persistent cache. Cached files are kept.
    pub fn disable_persistent_cache(&self) {
        *self.state.persistent.write() = None;
    }

    /// Returns true if a persistent cache is enabled.
    pub fn has_persistent_cache(&self) -> bool {
        self.state.persistent.read().is_some()
    }

    /// Deletes all expired entries of the persistent cache. Returns the number of deleted
    /// entries.
    pub fn purge_expired(&self) -> Result<usize, GeotileError> {
        match self.state.persistent() {
            Some(store) => store.purge_expired(),
            None => Ok(0),
        }
    }

    /// Sends the following downloads through the given proxy, or directly if `None`.
    ///
    /// Replaces the loader with an HTTP loader, so this also discards a custom loader set with
    /// [`TileCacheBuilder::with_loader`].
    pub fn set_proxy(&self, proxy: Option<&str>) -> Result<(), GeotileError> {
        let mut http = self.http.lock();
        let loader = HttpTileLoader::new(&http.user_agent, proxy, http.timeout)?;
        http.proxy = proxy.map(str::to_string);
        self.fetch_queue.set_loader(Arc::new(loader));
        Ok(())
    }

    /// Replaces the loader used for the following downloads.
    pub fn set_loader(&self, loader: Arc<dyn TileLoader>) {
        self.fetch_queue.set_loader(loader);
    }

    /// Sets the messenger notified when a requested tile becomes available.
    pub fn set_messenger(&self, messenger: impl Messenger + 'static) {
        *self.state.messenger.write() = Some(Arc::new(messenger));
    }

    /// Returns a channel receiving all following [`TileEvent`]s.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> UnboundedReceiver<TileEvent> {
        let (sender, receiver) = unbounded_channel();
        self.state.subscribers.lock().push(sender);
        receiver
    }
}

fn add_pending(tiles: &mut Vec<PendingTile>, key: &TileKey, prefetch: bool) {
    match tiles.iter_mut().find(|tile| &tile.key == key) {
        Some(tile) => tile.prefetch &= prefetch,
        None => tiles.push(PendingTile {
            key: key.clone(),
            prefetch,
        }),
    }
}

impl CacheState {
    fn placeholder(&self, tile_size: u32) -> Arc<DecodedImage> {
        self.placeholders
            .lock()
            .entry(tile_size)
            .or_insert_with(|| Arc::new(DecodedImage::solid(tile_size, PLACEHOLDER_COLOR)))
            .clone()
    }

    fn persistent(&self) -> Option<Arc<dyn PersistentCacheController>> {
        self.persistent.read().clone()
    }

    fn load_persistent(&self, key: &TileKey) -> Option<Arc<DecodedImage>> {
        let store = self.persistent()?;
        match store.get(key) {
            CacheLookup::Fresh(bytes) => match DecodedImage::decode(&bytes) {
                Ok(image) => {
                    log::debug!("Tile {key} loaded from the persistent cache");
                    let image = Arc::new(image);
                    self.memory.insert(key.clone(), image.clone());
                    Some(image)
                }
                Err(err) => {
                    log::warn!("Cached tile {key} is corrupted: {err}");
                    self.remove_persistent(store.as_ref(), key);
                    None
                }
            },
            CacheLookup::Expired => {
                log::debug!("Cached tile {key} is expired");
                self.remove_persistent(store.as_ref(), key);
                None
            }
            CacheLookup::Missing => None,
        }
    }

    fn remove_persistent(&self, store: &dyn PersistentCacheController, key: &TileKey) {
        if let Err(err) = store.remove(key) {
            log::warn!("Failed to remove cached tile {key}: {err}");
        }
    }

    fn emit(&self, event: TileEvent) {
        self.subscribers
            .lock()
            .retain(|sender| sender.send(event.clone()).is_ok());
    }
}

impl FetchListener for CacheState {
    fn on_fetched(&self, tile: FetchedTile) {
        let tiles = {
            let mut pending = self.pending.lock();
            let Some(tiles) = pending.remove(&tile.url) else {
                log::debug!("Discarding {}: the tiles are no longer requested", tile.url);
                return;
            };

            for pending_tile in &tiles {
                self.memory
                    .insert(pending_tile.key.clone(), tile.image.clone());
            }

            tiles
        };

        if let Some(store) = self.persistent() {
            for pending_tile in &tiles {
                if let Err(err) = store.insert(&pending_tile.key, &tile.bytes) {
                    log::warn!(
                        "Failed to write tile {} to the persistent cache: {err}",
                        pending_tile.key
                    );
                }
            }
        }

        let mut updated = false;
        for pending_tile in tiles {
            if pending_tile.prefetch {
                log::debug!("Prefetched tile {}", pending_tile.key);
            } else {
                self.emit(TileEvent::ImageUpdated(pending_tile.key));
                updated = true;
            }
        }

        if updated {
            if let Some(messenger) = &*self.messenger.read() {
                messenger.request_redraw();
            }
        }
    }

    fn on_failed(&self, url: &str, _error: &GeotileError) {
        if let Some(tiles) = self.pending.lock().remove(url) {
            log::debug!("{} tiles of {url} stay absent", tiles.len());
        }
    }

    fn on_queue_size_changed(&self, size: usize) {
        self.emit(TileEvent::QueueSizeChanged(size));
    }

    fn on_all_finished(&self) {
        self.emit(TileEvent::AllFinished);
    }
}
