//! Tests for src/store/json_file.rs driven through the full engine.
//! Testing library/framework: Rust built-in test framework with Tokio async
//! runtime (#[tokio::test]) and tempfile-backed stores.

mod common;

use std::sync::Arc;

use common::*;
use gatepass::config::RolesConfig;
use gatepass::records::{OrderStatus, StageStatus};
use gatepass::store::{JsonFileStore, Repository, RowStore};
use gatepass::workflow::OrderService;

async fn seeded_file_store(path: &std::path::Path) -> Arc<JsonFileStore> {
    let store = Arc::new(JsonFileStore::open(path).expect("open store"));
    let tables = default_tables();
    store
        .replace_departments(tables.departments)
        .await
        .expect("seed departments");
    store.replace_users(tables.users).await.expect("seed users");
    store
        .replace_vehicles(tables.vehicles)
        .await
        .expect("seed vehicles");
    store
}

#[tokio::test]
async fn orders_survive_a_store_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");

    let order_id = {
        let store = seeded_file_store(&path).await;
        let repo = Arc::new(Repository::new(store as Arc<dyn RowStore>));
        let service = OrderService::load(repo, &RolesConfig::default())
            .await
            .expect("service");

        let order = service
            .create_order(single_order(&["KA-01-3000"]))
            .await
            .expect("create");
        service
            .approve_stage(order.id, "Order Approved", None, "approve", None, ADMIN_USER)
            .await
            .expect("approve");
        order.id
        // Store handle drops here, releasing the process lock.
    };

    let reopened = Arc::new(JsonFileStore::open(&path).expect("reopen"));
    let repo = Repository::new(reopened as Arc<dyn RowStore>);

    let order = repo
        .find_order(order_id)
        .await
        .expect("read")
        .expect("order persisted");
    assert_eq!(order.status, OrderStatus::InProgress);
    assert_eq!(order.version, 2);

    let approved = order
        .stages
        .iter()
        .find(|s| s.label() == "Order Approved")
        .expect("stage");
    assert_eq!(approved.status, StageStatus::Completed);
    assert_eq!(approved.approver.as_deref(), Some("Asha"));

    let fleet = repo.vehicles().await.expect("vehicles");
    let reserved = fleet
        .iter()
        .find(|v| v.registration == "KA-01-3000")
        .expect("vehicle");
    assert!(reserved.is_busy);
}
