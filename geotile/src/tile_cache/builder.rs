use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::{
    FileCacheController, HttpSettings, PersistentCacheController, TileCache, TileCacheConfig,
};
use crate::async_runtime;
use crate::error::GeotileError;
use crate::fetch::{HttpTileLoader, TileLoader};
use crate::messenger::Messenger;

/// Constructor for a [`TileCache`].
///
/// ```no_run
/// use std::time::Duration;
/// use geotile::tile_cache::TileCacheBuilder;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), geotile::error::GeotileError> {
/// let cache = TileCacheBuilder::new()
///     .with_memory_capacity(512)
///     .with_file_cache(".tile_cache", Duration::from_secs(24 * 3600))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct TileCacheBuilder {
    memory_capacity: usize,
    loader_type: LoaderType,
    cache: CacheType,
    http: HttpSettings,
    runtime: Option<Handle>,
    messenger: Option<Arc<dyn Messenger>>,
}

enum LoaderType {
    Http,
    Custom(Arc<dyn TileLoader>),
}

enum CacheType {
    None,
    File(PathBuf, Duration),
    Custom(Arc<dyn PersistentCacheController>),
}

impl Default for TileCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TileCacheBuilder {
    /// Initializes a builder for a cache loading tiles over HTTP, without persistent cache.
    pub fn new() -> Self {
        Self::from_config(&TileCacheConfig::default())
    }

    /// Initializes a builder from the configuration.
    pub fn from_config(config: &TileCacheConfig) -> Self {
        let cache = match &config.persistent_cache {
            Some(persistent) => CacheType::File(persistent.path.clone(), persistent.ttl()),
            None => CacheType::None,
        };

        Self {
            memory_capacity: config.memory_capacity,
            loader_type: LoaderType::Http,
            cache,
            http: HttpSettings {
                user_agent: config.user_agent.clone(),
                proxy: config.proxy.clone(),
                timeout: config.request_timeout(),
            },
            runtime: None,
            messenger: None,
        }
    }

    /// Sets the maximum number of decoded tiles kept in memory.
    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    /// Adds a file cache for the tiles in the given folder.
    ///
    /// If the `path` folder doesn't exist it will be created. In case the creation of the folder
    /// fails, building the cache will return an error.
    ///
    /// Replaces the value set by the [`TileCacheBuilder::with_cache_controller()`] method.
    pub fn with_file_cache(mut self, path: impl AsRef<Path>, ttl: Duration) -> Self {
        self.cache = CacheType::File(path.as_ref().into(), ttl);
        self
    }

    /// Adds the given persistent cache for the tiles.
    ///
    /// Replaces the value set by the [`TileCacheBuilder::with_file_cache()`] method.
    pub fn with_cache_controller(
        mut self,
        cache: impl PersistentCacheController + 'static,
    ) -> Self {
        self.cache = CacheType::Custom(Arc::new(cache));
        self
    }

    /// Sets a custom loader instead of the default HTTP one.
    ///
    /// The user agent, proxy and timeout settings are ignored by custom loaders.
    pub fn with_loader(mut self, loader: Arc<dyn TileLoader>) -> Self {
        self.loader_type = LoaderType::Custom(loader);
        self
    }

    /// Sends all tile requests through the given proxy.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.http.proxy = Some(proxy.into());
        self
    }

    /// Sets the user agent of tile requests.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http.user_agent = user_agent.into();
        self
    }

    /// Sets the timeout of one tile request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = Some(timeout);
        self
    }

    /// Sets the runtime the downloads are run on.
    ///
    /// If not set, the runtime the [`TileCacheBuilder::build()`] method is called in is used.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Sets the messenger notified when a requested tile becomes available.
    pub fn with_messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Arc::new(messenger));
        self
    }

    /// Consumes the builder and constructs the cache.
    ///
    /// Will return an error if no runtime is available, the http client cannot be created or
    /// the persistent cache fails to initialize.
    pub fn build(self) -> Result<TileCache, GeotileError> {
        let Self {
            memory_capacity,
            loader_type,
            cache,
            http,
            runtime,
            messenger,
        } = self;

        let runtime = match runtime {
            Some(runtime) => runtime,
            None => async_runtime::current()?,
        };

        let loader: Arc<dyn TileLoader> = match loader_type {
            LoaderType::Http => Arc::new(HttpTileLoader::new(
                &http.user_agent,
                http.proxy.as_deref(),
                http.timeout,
            )?),
            LoaderType::Custom(loader) => loader,
        };

        let persistent: Option<Arc<dyn PersistentCacheController>> = match cache {
            CacheType::None => None,
            CacheType::File(path, ttl) => Some(Arc::new(FileCacheController::new(path, ttl)?)),
            CacheType::Custom(controller) => Some(controller),
        };

        Ok(TileCache::new(
            memory_capacity,
            loader,
            persistent,
            http,
            runtime,
            messenger,
        ))
    }
}
