//! JSON-file row store.
//!
//! All four tables live in one JSON document. Writes go to a temporary file
//! first and are renamed into place, so a crash mid-write never leaves a
//! half-written table behind. A file lock on a sibling `.lock` file keeps a
//! second process from opening the same store.

use std::fs::File;
use std::path::{Path, PathBuf};

use fd_lock::{RwLock as FileLock, RwLockWriteGuard};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::records::{Department, Order, UserAccount, Vehicle};
use crate::store::{RowStore, Tables};

pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes load-modify-save cycles within this process.
    io_lock: Mutex<()>,
    /// Held for the store's lifetime; released when the process exits.
    _file_guard: RwLockWriteGuard<'static, File>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`, acquiring the process lock.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let lock_path = path.with_extension("lock");
        let lock_file = File::create(&lock_path)?;
        let lock = Box::leak(Box::new(FileLock::new(lock_file)));
        let guard = lock.try_write().map_err(|_| StoreError::Locked {
            reason: format!("store {} is in use by another process", path.display()),
        })?;

        info!(path = %path.display(), "Opened JSON row store");
        Ok(Self {
            path,
            io_lock: Mutex::new(()),
            _file_guard: guard,
        })
    }

    async fn load(&self) -> Result<Tables, StoreError> {
        if !self.path.exists() {
            return Ok(Tables::default());
        }
        let raw = fs::read_to_string(&self.path).await?;
        if raw.trim().is_empty() {
            return Ok(Tables::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(tables)?;
        // Write to temporary file first, then rename (atomic operation)
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serialized).await?;
        fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), "Saved row store tables");
        Ok(())
    }
}

#[async_trait]
impl RowStore for JsonFileStore {
    async fn read_orders(&self) -> Result<Vec<Order>, StoreError> {
        let _io = self.io_lock.lock().await;
        Ok(self.load().await?.orders)
    }

    async fn replace_orders(&self, rows: Vec<Order>) -> Result<(), StoreError> {
        let _io = self.io_lock.lock().await;
        let mut tables = self.load().await?;
        tables.orders = rows;
        self.save(&tables).await
    }

    async fn read_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let _io = self.io_lock.lock().await;
        Ok(self.load().await?.vehicles)
    }

    async fn replace_vehicles(&self, rows: Vec<Vehicle>) -> Result<(), StoreError> {
        let _io = self.io_lock.lock().await;
        let mut tables = self.load().await?;
        tables.vehicles = rows;
        self.save(&tables).await
    }

    async fn read_users(&self) -> Result<Vec<UserAccount>, StoreError> {
        let _io = self.io_lock.lock().await;
        Ok(self.load().await?.users)
    }

    async fn replace_users(&self, rows: Vec<UserAccount>) -> Result<(), StoreError> {
        let _io = self.io_lock.lock().await;
        let mut tables = self.load().await?;
        tables.users = rows;
        self.save(&tables).await
    }

    async fn read_departments(&self) -> Result<Vec<Department>, StoreError> {
        let _io = self.io_lock.lock().await;
        Ok(self.load().await?.departments)
    }

    async fn replace_departments(&self, rows: Vec<Department>) -> Result<(), StoreError> {
        let _io = self.io_lock.lock().await;
        let mut tables = self.load().await?;
        tables.departments = rows;
        self.save(&tables).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(dir.path().join("store.json")).expect("open");
        assert!(store.read_orders().await.expect("read").is_empty());
        assert!(store.read_vehicles().await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn replace_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(dir.path().join("store.json")).expect("open");

        let vehicles = vec![Vehicle {
            id: 1,
            registration: "KA-01-0001".to_string(),
            vehicle_type: "Open".to_string(),
            capacity_kg: 5000.0,
            is_busy: false,
            current_order: None,
        }];
        store
            .replace_vehicles(vehicles.clone())
            .await
            .expect("replace");

        let read_back = store.read_vehicles().await.expect("read");
        assert_eq!(read_back, vehicles);
    }

    #[test]
    fn second_open_of_same_store_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        let _first = JsonFileStore::open(&path).expect("open");
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Locked { .. })
        ));
    }
}
