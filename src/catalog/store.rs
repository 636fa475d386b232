//! # Ephemeris store
//!
//! The committed [`Catalog`] lives behind a `RwLock<Arc<Catalog>>`:
//!
//! - [`EphemerisStore::snapshot`] clones the `Arc`, so a reader keeps a consistent view for
//!   as long as it needs it and never observes a half-applied batch.
//! - [`EphemerisStore::begin`] clones the committed catalog into a [`CatalogTransaction`],
//!   remembering the version it started from.
//! - [`EphemerisStore::commit`] swaps the working catalog in, provided no other commit
//!   happened in between. Dropping a transaction without committing it is a rollback.
//!
//! [`JsonFileStore`] adds persistence: the catalog document is written to disk before the
//! swap, and a failed write leaves the committed catalog untouched. The document is staged
//! in a sibling file and renamed over the previous one, so the file on disk always holds a
//! complete committed batch.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{Catalog, Planet, Star, StoreError};

/// Record-level access by natural key.
pub trait EphemerisRepository {
    fn find_star(&self, name: &str) -> Option<Star>;
    fn find_planet(&self, name: &str) -> Option<Planet>;
    /// Planet stored under any spelling with the same normalized name.
    fn find_planet_like(&self, name: &str) -> Option<Planet>;
    fn upsert_star(&mut self, star: Star) -> Result<(), StoreError>;
    fn upsert_planet(&mut self, planet: Planet) -> Result<(), StoreError>;
    fn remove_planet(&mut self, name: &str) -> Option<Planet>;
}

impl EphemerisRepository for Catalog {
    fn find_star(&self, name: &str) -> Option<Star> {
        self.star(name).cloned()
    }

    fn find_planet(&self, name: &str) -> Option<Planet> {
        self.planet(name).cloned()
    }

    fn find_planet_like(&self, name: &str) -> Option<Planet> {
        self.planet_like(name).cloned()
    }

    fn upsert_star(&mut self, star: Star) -> Result<(), StoreError> {
        Catalog::upsert_star(self, star)
    }

    fn upsert_planet(&mut self, planet: Planet) -> Result<(), StoreError> {
        Catalog::upsert_planet(self, planet)
    }

    fn remove_planet(&mut self, name: &str) -> Option<Planet> {
        Catalog::remove_planet(self, name)
    }
}

/// Snapshot reads and all-or-nothing batch writes.
pub trait EphemerisStore: Send + Sync {
    /// Immutable view of the last committed catalog.
    fn snapshot(&self) -> Arc<Catalog>;

    /// Start a batch from the last committed catalog.
    fn begin(&self) -> CatalogTransaction;

    /// Publish a batch.
    ///
    /// Errors
    /// ------
    /// * [`StoreError::Conflict`] if another batch was committed since `begin`.
    /// * [`StoreError::Persistence`] / [`StoreError::Serialization`] if the store
    ///   could not record the batch.
    ///
    /// On error nothing from the batch is visible.
    fn commit(&self, tx: CatalogTransaction) -> Result<(), StoreError>;
}

/// Working copy of the catalog for one batch.
#[derive(Debug)]
pub struct CatalogTransaction {
    base_version: u64,
    working: Catalog,
}

impl CatalogTransaction {
    /// Drop every record from the working copy.
    pub fn clear(&mut self) {
        self.working = Catalog::new();
    }
}

impl EphemerisRepository for CatalogTransaction {
    fn find_star(&self, name: &str) -> Option<Star> {
        self.working.find_star(name)
    }

    fn find_planet(&self, name: &str) -> Option<Planet> {
        self.working.find_planet(name)
    }

    fn find_planet_like(&self, name: &str) -> Option<Planet> {
        self.working.find_planet_like(name)
    }

    fn upsert_star(&mut self, star: Star) -> Result<(), StoreError> {
        self.working.upsert_star(star)
    }

    fn upsert_planet(&mut self, planet: Planet) -> Result<(), StoreError> {
        self.working.upsert_planet(planet)
    }

    fn remove_planet(&mut self, name: &str) -> Option<Planet> {
        self.working.remove_planet(name)
    }
}

#[derive(Debug)]
struct Committed {
    version: u64,
    catalog: Arc<Catalog>,
}

/// In-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    committed: RwLock<Committed>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::new())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        MemoryStore {
            committed: RwLock::new(Committed {
                version: 0,
                catalog: Arc::new(catalog),
            }),
        }
    }

    /// Number of batches committed so far.
    pub fn version(&self) -> u64 {
        self.committed
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .version
    }

    /// Commit `tx`, running `persist` on the new catalog while the write lock is held.
    /// The swap only happens if `persist` succeeds.
    fn commit_with(
        &self,
        tx: CatalogTransaction,
        persist: impl FnOnce(&Catalog) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut committed = self
            .committed
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if committed.version != tx.base_version {
            return Err(StoreError::Conflict {
                expected: tx.base_version,
                found: committed.version,
            });
        }

        persist(&tx.working)?;

        committed.version += 1;
        committed.catalog = Arc::new(tx.working);
        debug!(version = committed.version, "catalog batch committed");
        Ok(())
    }
}

impl EphemerisStore for MemoryStore {
    fn snapshot(&self) -> Arc<Catalog> {
        self.committed
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .catalog
            .clone()
    }

    fn begin(&self) -> CatalogTransaction {
        let committed = self
            .committed
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        CatalogTransaction {
            base_version: committed.version,
            working: (*committed.catalog).clone(),
        }
    }

    fn commit(&self, tx: CatalogTransaction) -> Result<(), StoreError> {
        self.commit_with(tx, |_| Ok(()))
    }
}

/// Store persisted as a JSON catalog document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`, loading the existing document if there is one.
    ///
    /// A missing file is an empty catalog; it is only created by the first commit.
    ///
    /// Errors
    /// ------
    /// * [`StoreError::Persistence`] if the file exists but cannot be read.
    /// * [`StoreError::Serialization`] if its content is not a valid catalog document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let catalog = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| StoreError::Persistence(format!("{}: {e}", path.display())))?;
            serde_json::from_str::<Catalog>(&raw)
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?
        } else {
            Catalog::new()
        };
        info!(
            path = %path.display(),
            stars = catalog.star_count(),
            planets = catalog.planet_count(),
            "ephemeris store opened"
        );
        Ok(JsonFileStore {
            path,
            memory: MemoryStore::with_catalog(catalog),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stage the document next to the target, then rename it into place.
    fn write(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(catalog)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let persistence =
            |e: std::io::Error| StoreError::Persistence(format!("{}: {e}", self.path.display()));

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(persistence)?;
        staged.write_all(&json).map_err(persistence)?;
        staged.as_file().sync_all().map_err(persistence)?;
        staged.persist(&self.path).map_err(|e| persistence(e.error))?;
        Ok(())
    }
}

impl EphemerisStore for JsonFileStore {
    fn snapshot(&self) -> Arc<Catalog> {
        self.memory.snapshot()
    }

    fn begin(&self) -> CatalogTransaction {
        self.memory.begin()
    }

    fn commit(&self, tx: CatalogTransaction) -> Result<(), StoreError> {
        self.memory.commit_with(tx, |catalog| self.write(catalog))
    }
}

#[cfg(test)]
mod store_test {
    use super::*;

    fn wasp12() -> Star {
        Star::new("WASP-12", 97.6366, 29.6723, Some(11.6))
    }

    #[test]
    fn test_snapshot_isolation() {
        let store = MemoryStore::new();
        let before = store.snapshot();

        let mut tx = store.begin();
        tx.upsert_star(wasp12()).unwrap();
        assert!(tx.find_star("WASP-12").is_some());
        // not visible until committed
        assert!(store.snapshot().find_star("WASP-12").is_none());

        store.commit(tx).unwrap();
        assert_eq!(store.snapshot().star_count(), 1);
        assert_eq!(before.star_count(), 0);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_dropped_transaction_is_a_rollback() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin();
            tx.upsert_star(wasp12()).unwrap();
        }
        assert_eq!(store.snapshot().star_count(), 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_concurrent_commit_conflicts() {
        let store = MemoryStore::new();
        let mut first = store.begin();
        let mut second = store.begin();
        first.upsert_star(wasp12()).unwrap();
        second
            .upsert_star(Star::new("HAT-P-7", 292.2, 47.9, Some(10.5)))
            .unwrap();

        store.commit(first).unwrap();
        assert_eq!(
            store.commit(second),
            Err(StoreError::Conflict {
                expected: 0,
                found: 1
            })
        );
        assert!(store.snapshot().find_star("HAT-P-7").is_none());
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let store = JsonFileStore::open(&path).unwrap();
        let mut tx = store.begin();
        tx.upsert_star(wasp12()).unwrap();
        let mut planet = Planet::new("WASP-12b", "WASP-12");
        planet.period = Some(1.09142);
        tx.upsert_planet(planet).unwrap();
        store.commit(tx).unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(*reopened.snapshot(), *store.snapshot());
        assert_eq!(
            reopened.snapshot().find_planet("WASP-12b").unwrap().period,
            Some(1.09142)
        );
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("catalog.json");

        let store = JsonFileStore::open(&path).unwrap();
        let mut tx = store.begin();
        tx.upsert_star(wasp12()).unwrap();
        assert!(matches!(
            store.commit(tx),
            Err(StoreError::Persistence(_))
        ));
        assert_eq!(store.snapshot().star_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_commit_replaces_the_document_instead_of_truncating_it() {
        use std::io::Read;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let store = JsonFileStore::open(&path).unwrap();

        let mut tx = store.begin();
        tx.upsert_star(wasp12()).unwrap();
        store.commit(tx).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        // a reader holding the previous document keeps a complete copy of it
        let mut previous = fs::File::open(&path).unwrap();

        let mut tx = store.begin();
        tx.upsert_star(Star::new("HAT-P-7", 292.2, 47.9, Some(10.5)))
            .unwrap();
        store.commit(tx).unwrap();

        let mut held = String::new();
        previous.read_to_string(&mut held).unwrap();
        assert_eq!(held, first);
        assert_eq!(serde_json::from_str::<Catalog>(&held).unwrap().star_count(), 1);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot().star_count(), 2);
        // no staged file is left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
