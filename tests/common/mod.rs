//! Shared builders for integration tests: seeded tables, a service over the
//! in-memory store, and order templates.

#![allow(dead_code)]

use std::sync::Arc;

use gatepass::config::RolesConfig;
use gatepass::records::{Department, Leg, TransportType, UserAccount, Vehicle};
use gatepass::store::{MemoryStore, Repository, Tables};
use gatepass::workflow::{NewOrder, OrderService};

pub const ADMIN_USER: u64 = 1;
pub const SECURITY_USER: u64 = 2;
pub const STORES_USER: u64 = 3;
pub const PURCHASE_USER: u64 = 4;

pub fn department(id: u64, name: &str) -> Department {
    Department {
        id,
        name: name.to_string(),
    }
}

pub fn user(id: u64, name: &str, department_id: u64) -> UserAccount {
    UserAccount {
        id,
        employee_name: name.to_string(),
        department_id,
    }
}

pub fn vehicle(id: u64, registration: &str, capacity_kg: f64) -> Vehicle {
    Vehicle {
        id,
        registration: registration.to_string(),
        vehicle_type: "Open".to_string(),
        capacity_kg,
        is_busy: false,
        current_order: None,
    }
}

/// Four departments covering every role, one user in each, and a small fleet.
pub fn default_tables() -> Tables {
    Tables {
        orders: Vec::new(),
        vehicles: vec![
            vehicle(1, "KA-01-3000", 3000.0),
            vehicle(2, "KA-01-2000", 2000.0),
            vehicle(3, "KA-01-5000", 5000.0),
        ],
        users: vec![
            user(ADMIN_USER, "Asha", 1),
            user(SECURITY_USER, "Ravi", 2),
            user(STORES_USER, "Meena", 3),
            user(PURCHASE_USER, "Kiran", 4),
        ],
        departments: vec![
            department(1, "Admin"),
            department(2, "Gate Security Unit-1"),
            department(3, "Stores Unit-IV/ soliflex unit-II"),
            department(4, "Accounts Team"),
        ],
    }
}

pub async fn service_with(tables: Tables) -> (OrderService, Arc<Repository>) {
    let repo = Arc::new(Repository::new(Arc::new(MemoryStore::with_tables(tables))));
    let service = OrderService::load(Arc::clone(&repo), &RolesConfig::default())
        .await
        .expect("service load");
    (service, repo)
}

pub async fn default_service() -> (OrderService, Arc<Repository>) {
    service_with(default_tables()).await
}

/// Single-trip order template from Unit-1 to Unit-4.
pub fn single_order(vehicles: &[&str]) -> NewOrder {
    NewOrder {
        material_type: "Fabric rolls".to_string(),
        material_weight: 2500.0,
        weight_unit: "kg".to_string(),
        transport_type: TransportType::Single,
        source_factory: Some("Unit-1".to_string()),
        dest_factories: vec!["Unit-4".to_string()],
        legs: Vec::new(),
        matched_vehicles: vehicles.iter().map(|v| v.to_string()).collect(),
        manual_vehicles: Vec::new(),
        eta_value: Some(6.0),
        eta_time_unit: Some("hours".to_string()),
        created_by: PURCHASE_USER,
    }
}

/// Multi-leg order template over the given (source, destination) hops.
pub fn multi_order(hops: &[(&str, &str)], vehicles: &[&str]) -> NewOrder {
    let legs = hops
        .iter()
        .enumerate()
        .map(|(i, (source, destination))| Leg {
            id: i as u64 + 1,
            source: source.to_string(),
            destination: destination.to_string(),
            sequence: i as u32 + 1,
        })
        .collect();
    NewOrder {
        material_type: "Machinery".to_string(),
        material_weight: 4000.0,
        weight_unit: "kg".to_string(),
        transport_type: TransportType::Multiple,
        source_factory: None,
        dest_factories: Vec::new(),
        legs,
        matched_vehicles: vehicles.iter().map(|v| v.to_string()).collect(),
        manual_vehicles: Vec::new(),
        eta_value: None,
        eta_time_unit: None,
        created_by: PURCHASE_USER,
    }
}
