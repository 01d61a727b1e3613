use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::decoded_image::tests::png_bytes;
use crate::error::GeotileError;
use crate::fetch::TileLoader;

/// Color of the images returned by [`TestTileLoader`].
pub const TEST_TILE_COLOR: [u8; 4] = [0, 128, 255, 255];

/// Loader returning a small png for any url, counting the calls.
///
/// A gated loader holds every request until a permit is added to its semaphore.
pub struct TestTileLoader {
    calls: AtomicUsize,
    called_urls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    gate: Option<Arc<Semaphore>>,
    payload: Bytes,
}

impl TestTileLoader {
    pub fn new() -> Self {
        Self::with_payload(Bytes::from(png_bytes(4, TEST_TILE_COLOR)))
    }

    pub fn with_payload(payload: Bytes) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            called_urls: Mutex::new(vec![]),
            failing: Mutex::new(HashSet::new()),
            gate: None,
            payload,
        }
    }

    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut loader = Self::new();
        loader.gate = Some(gate.clone());
        (Arc::new(loader), gate)
    }

    pub fn fail_url(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.called_urls
            .lock()
            .iter()
            .filter(|called| *called == url)
            .count()
    }
}

#[async_trait::async_trait]
impl TileLoader for TestTileLoader {
    async fn load(&self, url: &str) -> Result<Bytes, GeotileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called_urls.lock().push(url.to_string());

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|err| GeotileError::Generic(err.to_string()))?;
            permit.forget();
        }

        if self.failing.lock().contains(url) {
            return Err(GeotileError::HttpStatus {
                url: url.to_string(),
                status: 404,
            });
        }

        Ok(self.payload.clone())
    }
}
