// Row store - the persistence boundary.
// Tables are read and replaced whole, mirroring the backing sheet contract;
// the Repository layers narrow atomic operations on top.

pub mod json_file;
pub mod memory;
pub mod repository;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use repository::Repository;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::records::{Department, Order, UserAccount, Vehicle};

/// Snapshot of all four tables, the unit the JSON file stores on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    pub orders: Vec<Order>,
    pub vehicles: Vec<Vehicle>,
    pub users: Vec<UserAccount>,
    pub departments: Vec<Department>,
}

/// Read-all / replace-all per table. Implementations must make each replace
/// atomic: a reader never observes a partially written table.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn read_orders(&self) -> Result<Vec<Order>, StoreError>;
    async fn replace_orders(&self, rows: Vec<Order>) -> Result<(), StoreError>;

    async fn read_vehicles(&self) -> Result<Vec<Vehicle>, StoreError>;
    async fn replace_vehicles(&self, rows: Vec<Vehicle>) -> Result<(), StoreError>;

    async fn read_users(&self) -> Result<Vec<UserAccount>, StoreError>;
    async fn replace_users(&self, rows: Vec<UserAccount>) -> Result<(), StoreError>;

    async fn read_departments(&self) -> Result<Vec<Department>, StoreError>;
    async fn replace_departments(&self, rows: Vec<Department>) -> Result<(), StoreError>;
}
