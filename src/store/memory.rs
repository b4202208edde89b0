//! In-memory row store, the test double for everything above the persistence
//! boundary.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::records::{Department, Order, UserAccount, Vehicle};
use crate::store::{RowStore, Tables};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Full snapshot, for test assertions.
    pub async fn snapshot(&self) -> Tables {
        self.tables.read().await.clone()
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn read_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.tables.read().await.orders.clone())
    }

    async fn replace_orders(&self, rows: Vec<Order>) -> Result<(), StoreError> {
        self.tables.write().await.orders = rows;
        Ok(())
    }

    async fn read_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        Ok(self.tables.read().await.vehicles.clone())
    }

    async fn replace_vehicles(&self, rows: Vec<Vehicle>) -> Result<(), StoreError> {
        self.tables.write().await.vehicles = rows;
        Ok(())
    }

    async fn read_users(&self) -> Result<Vec<UserAccount>, StoreError> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn replace_users(&self, rows: Vec<UserAccount>) -> Result<(), StoreError> {
        self.tables.write().await.users = rows;
        Ok(())
    }

    async fn read_departments(&self) -> Result<Vec<Department>, StoreError> {
        Ok(self.tables.read().await.departments.clone())
    }

    async fn replace_departments(&self, rows: Vec<Department>) -> Result<(), StoreError> {
        self.tables.write().await.departments = rows;
        Ok(())
    }
}
