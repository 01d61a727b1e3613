//! Persistent storage of encoded tiles.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use log::debug;
use web_time::SystemTime;

use crate::error::GeotileError;
use crate::tile::TileKey;

/// Result of a persistent cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The entry exists and is younger than the cache time-to-live.
    Fresh(Bytes),
    /// The entry exists but has outlived the time-to-live. It must not be used.
    Expired,
    /// There is no entry for the key.
    Missing,
}

/// Storage of encoded tile data that survives the application restart.
pub trait PersistentCacheController: Send + Sync {
    /// Looks up the entry for the key.
    fn get(&self, key: &TileKey) -> CacheLookup;
    /// Stores the entry, replacing the existing one.
    fn insert(&self, key: &TileKey, data: &Bytes) -> Result<(), GeotileError>;
    /// Deletes the entry. Deleting a missing entry is not an error.
    fn remove(&self, key: &TileKey) -> Result<(), GeotileError>;
    /// Deletes all expired entries, returning the number of deleted entries.
    fn purge_expired(&self) -> Result<usize, GeotileError> {
        Ok(0)
    }
}

/// Stores the cached tiles as a set of files in the specified folder.
///
/// Each tile is stored as `<folder>/<epsg>/<tile size>/<hash of the tile key>`, so sources with
/// different projections or tile sizes never share entries, even if their urls are the same.
///
/// The age of an entry is the modification time of its file. A time-to-live of zero means the
/// entries never expire.
#[derive(Debug, Clone)]
pub struct FileCacheController {
    folder_path: PathBuf,
    ttl: Duration,
}

impl PersistentCacheController for FileCacheController {
    fn get(&self, key: &TileKey) -> CacheLookup {
        let file_path = self.get_file_path(key);
        let Ok(metadata) = std::fs::metadata(&file_path) else {
            return CacheLookup::Missing;
        };

        if self.is_expired(&metadata) {
            debug!("Cache entry {key} in {file_path:?} is expired");
            return CacheLookup::Expired;
        }

        match std::fs::read(&file_path) {
            Ok(bytes) => CacheLookup::Fresh(bytes.into()),
            Err(err) => {
                debug!("Failed to read cache file {file_path:?}: {err}");
                CacheLookup::Missing
            }
        }
    }

    fn insert(&self, key: &TileKey, data: &Bytes) -> Result<(), GeotileError> {
        let file_path = self.get_file_path(key);
        match file_path.parent() {
            Some(folder) => {
                ensure_folder_exists(folder)?;
                std::fs::write(&file_path, data)?;
                debug!("Entry {key} saved to cache file {file_path:?}");
                Ok(())
            }
            None => Err(GeotileError::Generic(format!(
                "cache file {file_path:?} has no parent folder"
            ))),
        }
    }

    fn remove(&self, key: &TileKey) -> Result<(), GeotileError> {
        let file_path = self.get_file_path(key);
        match std::fs::remove_file(&file_path) {
            Ok(()) => {
                debug!("Removed cache file {file_path:?}");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn purge_expired(&self) -> Result<usize, GeotileError> {
        if self.ttl.is_zero() {
            return Ok(0);
        }

        let mut removed = 0;
        let mut folders = vec![self.folder_path.clone()];
        while let Some(folder) = folders.pop() {
            for entry in std::fs::read_dir(&folder)? {
                let entry = entry?;
                let metadata = entry.metadata()?;
                if metadata.is_dir() {
                    folders.push(entry.path());
                } else if self.is_expired(&metadata) {
                    std::fs::remove_file(entry.path())?;
                    removed += 1;
                }
            }
        }

        debug!("Purged {removed} expired entries from {:?}", self.folder_path);
        Ok(removed)
    }
}

impl FileCacheController {
    /// Creates a new instance. The cache will be located in the given directory. If the directory
    /// doesn't exist, it will be created.
    pub fn new(path: impl AsRef<Path>, ttl: Duration) -> Result<Self, GeotileError> {
        ensure_folder_exists(path.as_ref()).map_err(|err| {
            GeotileError::Generic(format!(
                "failed to initialize file cache folder {:?}: {err}",
                path.as_ref()
            ))
        })?;

        Ok(Self {
            folder_path: path.as_ref().into(),
            ttl,
        })
    }

    /// Root folder of the cache.
    pub fn folder_path(&self) -> &Path {
        &self.folder_path
    }

    /// Time-to-live of the entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Path of the file the tile is stored in.
    pub fn get_file_path(&self, key: &TileKey) -> PathBuf {
        self.folder_path
            .join(key.epsg().to_string())
            .join(key.tile_size().to_string())
            .join(key.cache_name())
    }

    fn is_expired(&self, metadata: &std::fs::Metadata) -> bool {
        if self.ttl.is_zero() {
            return false;
        }

        let Ok(modified) = metadata.modified() else {
            return false;
        };

        // A modification time in the future (clock adjustment) counts as fresh.
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age > self.ttl,
            Err(_) => false,
        }
    }
}

fn ensure_folder_exists(folder_path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(folder_path)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    fn key(x: u32, tile_size: u32, epsg: u32) -> TileKey {
        TileKey::new(Arc::from("http://tiles/{z}/{x}/{y}"), x, 0, 3, tile_size, epsg)
    }

    fn age_file(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).expect("file exists");
        file.set_modified(SystemTime::now() - age)
            .expect("set modification time");
    }

    #[test]
    fn creates_root_folder() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path().join("a/b/c");
        FileCacheController::new(&root, Duration::ZERO).expect("created");
        assert!(root.is_dir());
    }

    #[test]
    fn fails_if_root_is_a_file() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        assert!(FileCacheController::new(file.path().join("cache"), Duration::ZERO).is_err());
    }

    #[test]
    fn insert_and_get() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = FileCacheController::new(dir.path(), Duration::from_secs(60)).expect("created");
        let key = key(1, 256, 3857);

        assert_eq!(cache.get(&key), CacheLookup::Missing);
        cache
            .insert(&key, &Bytes::from_static(b"tile"))
            .expect("inserted");
        assert_eq!(cache.get(&key), CacheLookup::Fresh(Bytes::from_static(b"tile")));

        let path = cache.get_file_path(&key);
        assert!(path.starts_with(dir.path().join("3857").join("256")));
    }

    #[test]
    fn entries_are_scoped_by_projection_and_tile_size() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = FileCacheController::new(dir.path(), Duration::ZERO).expect("created");
        cache
            .insert(&key(1, 256, 3857), &Bytes::from_static(b"tile"))
            .expect("inserted");

        assert_eq!(cache.get(&key(1, 512, 3857)), CacheLookup::Missing);
        assert_eq!(cache.get(&key(1, 256, 4326)), CacheLookup::Missing);
    }

    #[test]
    fn old_entries_expire() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache =
            FileCacheController::new(dir.path(), Duration::from_secs(3600)).expect("created");
        let key = key(1, 256, 3857);
        cache
            .insert(&key, &Bytes::from_static(b"tile"))
            .expect("inserted");

        age_file(&cache.get_file_path(&key), Duration::from_secs(1800));
        assert_matches!(cache.get(&key), CacheLookup::Fresh(_));

        age_file(&cache.get_file_path(&key), Duration::from_secs(7200));
        assert_eq!(cache.get(&key), CacheLookup::Expired);
    }

    #[test]
    fn zero_ttl_never_expires() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = FileCacheController::new(dir.path(), Duration::ZERO).expect("created");
        let key = key(1, 256, 3857);
        cache
            .insert(&key, &Bytes::from_static(b"tile"))
            .expect("inserted");

        age_file(&cache.get_file_path(&key), Duration::from_secs(365 * 24 * 3600));
        assert_matches!(cache.get(&key), CacheLookup::Fresh(_));
        assert_eq!(cache.purge_expired().expect("purged"), 0);
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = FileCacheController::new(dir.path(), Duration::ZERO).expect("created");
        let key = key(1, 256, 3857);

        assert!(cache.remove(&key).is_ok());
        cache
            .insert(&key, &Bytes::from_static(b"tile"))
            .expect("inserted");
        cache.remove(&key).expect("removed");
        assert_eq!(cache.get(&key), CacheLookup::Missing);
    }

    #[test]
    fn purge_removes_only_expired() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache =
            FileCacheController::new(dir.path(), Duration::from_secs(3600)).expect("created");
        for x in 0..4 {
            cache
                .insert(&key(x, 256, 3857), &Bytes::from_static(b"tile"))
                .expect("inserted");
        }
        cache
            .insert(&key(0, 512, 4326), &Bytes::from_static(b"tile"))
            .expect("inserted");

        age_file(&cache.get_file_path(&key(0, 256, 3857)), Duration::from_secs(7200));
        age_file(&cache.get_file_path(&key(0, 512, 4326)), Duration::from_secs(7200));

        assert_eq!(cache.purge_expired().expect("purged"), 2);
        assert_eq!(cache.get(&key(0, 256, 3857)), CacheLookup::Missing);
        assert_matches!(cache.get(&key(1, 256, 3857)), CacheLookup::Fresh(_));
    }
}
