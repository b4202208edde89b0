//! Narrow repository over the row store.
//!
//! The row store only knows read-all/replace-all; this layer adds the atomic
//! per-entity operations the workflow needs: versioned conditional order
//! upsert, atomic vehicle reservation, and a per-order async lock registry so
//! at most one mutation per order is ever in flight.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{StoreError, WorkflowError, WorkflowResult};
use crate::records::{Department, Order, UserAccount, Vehicle};
use crate::store::RowStore;

pub struct Repository {
    store: Arc<dyn RowStore>,
    order_locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
    /// Serializes vehicle-table check-then-reserve cycles.
    vehicle_lock: Mutex<()>,
}

impl Repository {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            order_locks: Mutex::new(HashMap::new()),
            vehicle_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RowStore> {
        &self.store
    }

    /// Mutex guarding mutations of one order. Callers hold the lock across
    /// the whole read-modify-write cycle.
    pub async fn order_lock(&self, order_id: u64) -> Arc<Mutex<()>> {
        let mut locks = self.order_locks.lock().await;
        locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        self.store.read_orders().await
    }

    pub async fn find_order(&self, order_id: u64) -> Result<Option<Order>, StoreError> {
        Ok(self
            .store
            .read_orders()
            .await?
            .into_iter()
            .find(|o| o.id == order_id))
    }

    pub async fn next_order_id(&self) -> Result<u64, StoreError> {
        Ok(self
            .store
            .read_orders()
            .await?
            .iter()
            .map(|o| o.id)
            .max()
            .unwrap_or(0)
            + 1)
    }

    pub async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let mut orders = self.store.read_orders().await?;
        orders.push(order);
        self.store.replace_orders(orders).await
    }

    /// Conditional replace of one order row. The stored row must still carry
    /// `expected_version`; otherwise another mutation won the race and the
    /// caller gets a version mismatch instead of silently losing its write.
    pub async fn upsert_order(
        &self,
        updated: Order,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut orders = self.store.read_orders().await?;
        let slot = orders
            .iter_mut()
            .find(|o| o.id == updated.id)
            .ok_or_else(|| StoreError::Corrupted {
                reason: format!("order {} vanished during update", updated.id),
            })?;
        if slot.version != expected_version {
            return Err(StoreError::VersionMismatch {
                order_id: updated.id,
                expected: expected_version,
                found: slot.version,
            });
        }
        *slot = updated;
        self.store.replace_orders(orders).await
    }

    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        self.store.read_vehicles().await
    }

    /// Atomically reserve a set of vehicles for an order: every registration
    /// must exist and be free, then all are marked busy in one table write.
    /// Competing creations serialize on the vehicle lock, so two orders can
    /// never both claim the same vehicle.
    pub async fn reserve_vehicles(
        &self,
        registrations: &[String],
        order_number: &str,
    ) -> WorkflowResult<()> {
        let _guard = self.vehicle_lock.lock().await;

        let mut vehicles = self.store.read_vehicles().await.map_err(WorkflowError::Store)?;
        for registration in registrations {
            let vehicle = vehicles
                .iter()
                .find(|v| &v.registration == registration)
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!("vehicle {registration} not found"))
                })?;
            if vehicle.is_busy {
                return Err(WorkflowError::Conflict(format!(
                    "vehicle {} is already assigned to {}",
                    registration,
                    vehicle.current_order.as_deref().unwrap_or("another order")
                )));
            }
        }

        for vehicle in &mut vehicles {
            if registrations.contains(&vehicle.registration) {
                vehicle.is_busy = true;
                vehicle.current_order = Some(order_number.to_string());
            }
        }
        self.store
            .replace_vehicles(vehicles)
            .await
            .map_err(WorkflowError::Store)?;

        debug!(order = %order_number, count = registrations.len(), "Reserved vehicles");
        Ok(())
    }

    pub async fn users(&self) -> Result<Vec<UserAccount>, StoreError> {
        self.store.read_users().await
    }

    pub async fn find_user(&self, user_id: u64) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .store
            .read_users()
            .await?
            .into_iter()
            .find(|u| u.id == user_id))
    }

    pub async fn departments(&self) -> Result<Vec<Department>, StoreError> {
        self.store.read_departments().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{OrderStatus, TransportType};
    use crate::store::{MemoryStore, Tables};
    use chrono::Utc;

    fn order(id: u64, version: u64) -> Order {
        Order {
            id,
            order_number: crate::records::format_order_number(id),
            material_type: "Fabric".to_string(),
            material_weight: 1000.0,
            weight_unit: "kg".to_string(),
            transport_type: TransportType::Single,
            source_factory: Some("Unit-1".to_string()),
            dest_factories: vec!["Unit-4".to_string()],
            legs: Vec::new(),
            vehicles: Vec::new(),
            stages: Vec::new(),
            status: OrderStatus::Open,
            eta_value: None,
            eta_time_unit: None,
            created_by: 1,
            created_at: Utc::now(),
            version,
        }
    }

    fn vehicle(registration: &str, busy: bool) -> Vehicle {
        Vehicle {
            id: 1,
            registration: registration.to_string(),
            vehicle_type: "Open".to_string(),
            capacity_kg: 5000.0,
            is_busy: busy,
            current_order: busy.then(|| "RFQ_ID#0007".to_string()),
        }
    }

    fn repo_with(tables: Tables) -> Repository {
        Repository::new(Arc::new(MemoryStore::with_tables(tables)))
    }

    #[tokio::test]
    async fn upsert_with_stale_version_is_refused() {
        let repo = repo_with(Tables {
            orders: vec![order(1, 3)],
            ..Tables::default()
        });

        let mut updated = order(1, 4);
        updated.status = OrderStatus::InProgress;
        repo.upsert_order(updated.clone(), 3).await.expect("fresh");

        // A second writer still holding version 3 must be told it lost.
        let err = repo.upsert_order(updated, 3).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionMismatch {
                expected: 3,
                found: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn reserving_a_busy_vehicle_conflicts() {
        let repo = repo_with(Tables {
            vehicles: vec![vehicle("KA-01-0001", true)],
            ..Tables::default()
        });

        let err = repo
            .reserve_vehicles(&["KA-01-0001".to_string()], "RFQ_ID#0002")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
    }

    #[tokio::test]
    async fn reservation_marks_all_or_nothing() {
        let free = vehicle("KA-01-0001", false);
        let busy = vehicle("KA-01-0002", true);
        let repo = repo_with(Tables {
            vehicles: vec![free, busy],
            ..Tables::default()
        });

        let regs = vec!["KA-01-0001".to_string(), "KA-01-0002".to_string()];
        assert!(repo.reserve_vehicles(&regs, "RFQ_ID#0002").await.is_err());

        // The free vehicle must not have been taken by the failed reservation.
        let vehicles = repo.vehicles().await.expect("vehicles");
        let untouched = vehicles
            .iter()
            .find(|v| v.registration == "KA-01-0001")
            .expect("vehicle");
        assert!(!untouched.is_busy);
    }

    #[tokio::test]
    async fn unknown_vehicle_is_not_found() {
        let repo = repo_with(Tables::default());
        let err = repo
            .reserve_vehicles(&["KA-09-9999".to_string()], "RFQ_ID#0001")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }
}
