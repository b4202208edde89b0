// Domain records - rows of the four backing tables
// (order_details, vehicle_details, user_details, department_table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an order moves: one source→destination trip, or a chain of legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    Single,
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    InProgress,
    Completed,
    Rejected,
    Delayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Completed,
    Rejected,
    Delayed,
}

/// One source→destination segment of a multi-stop shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub id: u64,
    pub source: String,
    pub destination: String,
    pub sequence: u32,
}

/// Back-reference from a stage to the leg it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegRef {
    pub id: u64,
    pub sequence: u32,
}

/// The checkpoint kinds a stage can represent. Entry and exit checkpoints are
/// gate-security territory, consignment checks belong to the stores teams,
/// and order approval sits with admin/purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    OrderApproval,
    VehicleEntry,
    ConsignmentCheck,
    VehicleExit,
}

/// Which end of a leg a checkpoint sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Source,
    Destination,
}

/// One approval checkpoint, scoped to a single vehicle (and, for multi-leg
/// orders, a single leg). Identity is the structured key {kind, site, leg,
/// vehicle}; the human-facing name is derived via [`Stage::label`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub kind: StageKind,
    /// Absent for order approval, which is not tied to a location.
    pub site: Option<Site>,
    /// Factory/place name baked into the display label.
    pub location: Option<String>,
    pub vehicle: String,
    /// Present only on stages of multi-leg orders.
    pub leg: Option<LegRef>,
    pub status: StageStatus,
    pub approver: Option<String>,
    pub department: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub action: Option<String>,
    pub comments: Option<String>,
}

impl Stage {
    /// Derive the display name used on the wire and in approvals.
    pub fn label(&self) -> String {
        let loc = self.location.as_deref().unwrap_or("");
        match (self.kind, self.site) {
            (StageKind::OrderApproval, _) => "Order Approved".to_string(),
            (StageKind::VehicleEntry, Some(Site::Source)) => {
                format!("Vehicle Entry Approved ({loc})")
            }
            (StageKind::VehicleEntry, _) => format!("Vehicle Entry ({loc})"),
            (StageKind::ConsignmentCheck, _) => format!("Consignment Verification ({loc})"),
            (StageKind::VehicleExit, _) => format!("Vehicle Exit ({loc})"),
        }
    }
}

/// Row of the order table. The full stage list is generated once at creation
/// and only ever mutated through approve/revoke; `version` increments on every
/// successful mutation and guards conditional writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub order_number: String,
    pub material_type: String,
    pub material_weight: f64,
    pub weight_unit: String,
    pub transport_type: TransportType,
    pub source_factory: Option<String>,
    pub dest_factories: Vec<String>,
    pub legs: Vec<Leg>,
    /// Vehicle registrations assigned to this order.
    pub vehicles: Vec<String>,
    pub stages: Vec<Stage>,
    pub status: OrderStatus,
    pub eta_value: Option<f64>,
    pub eta_time_unit: Option<String>,
    pub created_by: u64,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Order {
    /// Stages belonging to one vehicle, in their generated order.
    pub fn stages_for_vehicle<'a>(&'a self, vehicle: &'a str) -> impl Iterator<Item = &'a Stage> {
        self.stages.iter().filter(move |s| s.vehicle == vehicle)
    }
}

/// Row of the vehicle table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub registration: String,
    pub vehicle_type: String,
    pub capacity_kg: f64,
    pub is_busy: bool,
    pub current_order: Option<String>,
}

/// Row of the user table. Authentication lives outside this system; the
/// workflow only needs the identity and department linkage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: u64,
    pub employee_name: String,
    pub department_id: u64,
}

/// Row of the department table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: u64,
    pub name: String,
}

pub fn format_order_number(id: u64) -> String {
    format!("RFQ_ID#{id:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_match_wire_format() {
        let mut stage = Stage {
            kind: StageKind::VehicleEntry,
            site: Some(Site::Source),
            location: Some("Unit-1".to_string()),
            vehicle: "KA-01-1234".to_string(),
            leg: None,
            status: StageStatus::Pending,
            approver: None,
            department: None,
            timestamp: None,
            action: None,
            comments: None,
        };
        assert_eq!(stage.label(), "Vehicle Entry Approved (Unit-1)");

        stage.site = Some(Site::Destination);
        assert_eq!(stage.label(), "Vehicle Entry (Unit-1)");

        stage.kind = StageKind::ConsignmentCheck;
        assert_eq!(stage.label(), "Consignment Verification (Unit-1)");

        stage.kind = StageKind::VehicleExit;
        assert_eq!(stage.label(), "Vehicle Exit (Unit-1)");

        stage.kind = StageKind::OrderApproval;
        stage.site = None;
        stage.location = None;
        assert_eq!(stage.label(), "Order Approved");
    }

    #[test]
    fn order_numbers_are_zero_padded() {
        assert_eq!(format_order_number(1), "RFQ_ID#0001");
        assert_eq!(format_order_number(412), "RFQ_ID#0412");
        assert_eq!(format_order_number(12345), "RFQ_ID#12345");
    }
}
