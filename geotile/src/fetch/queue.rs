use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use super::TileLoader;
use crate::async_runtime;
use crate::decoded_image::DecodedImage;
use crate::error::GeotileError;

/// Result of a successful download.
#[derive(Debug, Clone)]
pub struct FetchedTile {
    /// Url the tile was loaded from.
    pub url: String,
    /// Raw (encoded) response body.
    pub bytes: Bytes,
    /// Decoded image.
    pub image: Arc<DecodedImage>,
}

/// Receives the results of the downloads of a [`FetchQueue`].
///
/// Methods are called from the runtime worker threads, never while the queue state is locked.
pub trait FetchListener: Send + Sync {
    /// A download has completed and the image was decoded.
    fn on_fetched(&self, tile: FetchedTile);

    /// A download or decoding has failed. No data is delivered for the url.
    fn on_failed(&self, url: &str, error: &GeotileError);

    /// Number of downloads in flight has changed.
    fn on_queue_size_changed(&self, _size: usize) {}

    /// All downloads have completed (or were aborted).
    fn on_all_finished(&self) {}
}

/// Queue of concurrent tile downloads.
///
/// Downloads are identified by url: at most one download per url is in flight, so concurrent
/// requests of the same url share one download. Every download runs as a task on the given
/// `tokio` runtime; [`FetchQueue::enqueue`] never blocks on I/O.
///
/// A download that was aborted never delivers its result, even if the I/O layer completes it
/// after the abort.
#[derive(Clone)]
pub struct FetchQueue {
    shared: Arc<QueueShared>,
}

struct QueueShared {
    loader: RwLock<Arc<dyn TileLoader>>,
    listener: Arc<dyn FetchListener>,
    runtime: Handle,
    state: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    in_flight: HashMap<String, InFlight, ahash::RandomState>,
    next_id: u64,
}

struct InFlight {
    id: u64,
    task: AbortHandle,
}

/// Reports the download as failed if its task stops without delivering a result, e.g. when the
/// loader panics. Aborted downloads are already removed from the queue, so for them this is a
/// no-op.
struct DownloadGuard {
    shared: Arc<QueueShared>,
    url: String,
    id: u64,
    finished: bool,
}

impl DownloadGuard {
    fn finish(mut self, result: Result<FetchedTile, GeotileError>) {
        self.finished = true;
        self.shared.finish(&self.url, self.id, result);
    }
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.finish(
                &self.url,
                self.id,
                Err(GeotileError::Generic(
                    "download task stopped before completion".into(),
                )),
            );
        }
    }
}

impl std::fmt::Debug for FetchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchQueue")
            .field("queue_size", &self.queue_size())
            .finish()
    }
}

impl FetchQueue {
    /// Creates a new queue running the downloads on `runtime`.
    pub fn new(
        loader: Arc<dyn TileLoader>,
        listener: Arc<dyn FetchListener>,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(QueueShared {
                loader: RwLock::new(loader),
                listener,
                runtime,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Replaces the loader used for the downloads started after this call.
    pub fn set_loader(&self, loader: Arc<dyn TileLoader>) {
        *self.shared.loader.write() = loader;
    }

    /// Starts the download of the url.
    ///
    /// Returns `false` without doing anything if the url is already in flight.
    pub fn enqueue(&self, url: &str) -> bool {
        let size = {
            let mut state = self.shared.state.lock();
            if state.in_flight.contains_key(url) {
                return false;
            }

            let id = state.next_id;
            state.next_id += 1;

            let shared = self.shared.clone();
            let owned_url = url.to_string();
            // The task cannot finish before the entry is inserted: it needs the state lock to
            // deliver the result.
            let task = async_runtime::spawn(&self.shared.runtime, async move {
                shared.fetch(owned_url, id).await;
            });

            state.in_flight.insert(url.to_string(), InFlight { id, task });
            state.in_flight.len()
        };

        log::debug!("Enqueued download of {url}, {size} in flight");
        self.shared.listener.on_queue_size_changed(size);
        true
    }

    /// Returns true if the url is being downloaded.
    pub fn is_in_flight(&self, url: &str) -> bool {
        self.shared.state.lock().in_flight.contains_key(url)
    }

    /// Number of downloads in flight.
    pub fn queue_size(&self) -> usize {
        self.shared.state.lock().in_flight.len()
    }

    /// Cancels all downloads in flight. Returns the number of cancelled downloads.
    pub fn abort_all(&self) -> usize {
        let aborted: Vec<InFlight> = {
            let mut state = self.shared.state.lock();
            state.in_flight.drain().map(|(_, entry)| entry).collect()
        };

        for entry in &aborted {
            entry.task.abort();
        }

        if !aborted.is_empty() {
            log::debug!("Aborted {} downloads", aborted.len());
            self.shared.listener.on_queue_size_changed(0);
            self.shared.listener.on_all_finished();
        }

        aborted.len()
    }
}

impl QueueShared {
    async fn fetch(self: Arc<Self>, url: String, id: u64) {
        let guard = DownloadGuard {
            shared: self.clone(),
            url: url.clone(),
            id,
            finished: false,
        };

        let loader = self.loader.read().clone();
        let result = match loader.load(&url).await {
            Ok(bytes) => {
                let data = bytes.clone();
                async_runtime::spawn_blocking(move || DecodedImage::decode(&data))
                    .await
                    .and_then(|decoded| decoded)
                    .map(|image| FetchedTile {
                        url: url.clone(),
                        bytes,
                        image: Arc::new(image),
                    })
            }
            Err(err) => Err(err),
        };

        guard.finish(result);
    }

    fn finish(&self, url: &str, id: u64, result: Result<FetchedTile, GeotileError>) {
        let remaining = {
            let mut state = self.state.lock();
            match state.in_flight.get(url) {
                Some(entry) if entry.id == id => {}
                _ => {
                    log::debug!("Discarding result of the cancelled download of {url}");
                    return;
                }
            }

            state.in_flight.remove(url);
            state.in_flight.len()
        };

        match result {
            Ok(tile) => self.listener.on_fetched(tile),
            Err(err) => {
                log::warn!("Failed to load {url}: {err}");
                self.listener.on_failed(url, &err);
            }
        }

        self.listener.on_queue_size_changed(remaining);
        if remaining == 0 {
            self.listener.on_all_finished();
        }
    }
}
