// Stage workflow engine - order creation, stage approval/revocation, and the
// order-level status roll-up. Every mutation runs under the per-order lock
// and lands as one versioned conditional write.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RolesConfig;
use crate::errors::{StoreError, WorkflowError, WorkflowResult};
use crate::records::{
    format_order_number, Leg, Order, OrderStatus, Stage, StageStatus, TransportType, UserAccount,
};
use crate::store::Repository;
use crate::workflow::roles::RoleDirectory;
use crate::workflow::stages::{generate_stages, parse_label, required_role};

/// What a stage mutation hands back: the full stage list and the recomputed
/// order status.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub stages: Vec<Stage>,
    pub order_status: OrderStatus,
}

/// A pending stage some user is allowed to act on.
#[derive(Debug, Clone, Serialize)]
pub struct PendingApproval {
    pub order_id: u64,
    pub order_number: String,
    pub stage: String,
    pub vehicle: String,
    pub required_role: String,
    pub order_status: OrderStatus,
}

/// Input for order creation. Matched vehicles are reserved atomically;
/// manually entered ones are recorded without touching the vehicle table.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub material_type: String,
    pub material_weight: f64,
    pub weight_unit: String,
    pub transport_type: TransportType,
    pub source_factory: Option<String>,
    pub dest_factories: Vec<String>,
    pub legs: Vec<Leg>,
    pub matched_vehicles: Vec<String>,
    pub manual_vehicles: Vec<String>,
    pub eta_value: Option<f64>,
    pub eta_time_unit: Option<String>,
    pub created_by: u64,
}

pub struct OrderService {
    repo: Arc<Repository>,
    roles: RoleDirectory,
    /// Serializes id allocation across concurrent creations.
    create_lock: tokio::sync::Mutex<()>,
}

impl OrderService {
    /// Build the service, resolving the department table into the role
    /// directory once up front.
    pub async fn load(repo: Arc<Repository>, roles_config: &RolesConfig) -> WorkflowResult<Self> {
        let departments = repo.departments().await?;
        let roles = RoleDirectory::build(
            &departments,
            &roles_config.admin_departments,
            &roles_config.purchase_team_departments,
        );
        Ok(Self {
            repo,
            roles,
            create_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repo
    }

    /// Create an order: validate, reserve matched vehicles, generate the full
    /// stage list once, persist.
    pub async fn create_order(&self, new: NewOrder) -> WorkflowResult<Order> {
        if new.material_type.trim().is_empty() || new.weight_unit.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "material type, weight, and unit are required".to_string(),
            ));
        }
        if !new.material_weight.is_finite() || new.material_weight <= 0.0 {
            return Err(WorkflowError::Validation(
                "material weight must be positive".to_string(),
            ));
        }

        let (source, destination) = match new.transport_type {
            TransportType::Single => {
                let source = new
                    .source_factory
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        WorkflowError::Validation("source factory is required".to_string())
                    })?;
                let destination = new
                    .dest_factories
                    .first()
                    .map(String::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        WorkflowError::Validation("destination factory is required".to_string())
                    })?;
                (source.to_string(), destination.to_string())
            }
            TransportType::Multiple => {
                if new.legs.is_empty() {
                    return Err(WorkflowError::Validation(
                        "multi-leg orders need at least one leg".to_string(),
                    ));
                }
                if new
                    .legs
                    .iter()
                    .any(|l| l.source.trim().is_empty() || l.destination.trim().is_empty())
                {
                    return Err(WorkflowError::Validation(
                        "every leg needs a source and destination".to_string(),
                    ));
                }
                (String::new(), String::new())
            }
        };

        let mut vehicles = new.matched_vehicles.clone();
        vehicles.extend(new.manual_vehicles.iter().cloned());
        if vehicles.is_empty() {
            return Err(WorkflowError::Validation(
                "at least one vehicle is required".to_string(),
            ));
        }

        let _create = self.create_lock.lock().await;

        let id = self.repo.next_order_id().await?;
        let order_number = format_order_number(id);

        if !new.matched_vehicles.is_empty() {
            self.repo
                .reserve_vehicles(&new.matched_vehicles, &order_number)
                .await?;
        }

        let stages = generate_stages(
            new.transport_type,
            &source,
            &destination,
            &new.legs,
            &vehicles,
        );

        let order = Order {
            id,
            order_number: order_number.clone(),
            material_type: new.material_type,
            material_weight: new.material_weight,
            weight_unit: new.weight_unit,
            transport_type: new.transport_type,
            source_factory: new.source_factory,
            dest_factories: new.dest_factories,
            legs: new.legs,
            vehicles,
            stages,
            status: OrderStatus::Open,
            eta_value: new.eta_value,
            eta_time_unit: new.eta_time_unit,
            created_by: new.created_by,
            created_at: Utc::now(),
            version: 1,
        };
        self.repo.insert_order(order.clone()).await?;

        info!(
            order_id = id,
            order_number = %order_number,
            vehicles = order.vehicles.len(),
            stages = order.stages.len(),
            "Order created"
        );
        Ok(order)
    }

    /// Advance one pending stage under role authorization and sequence
    /// gating, then recompute the order status over every vehicle's stages.
    pub async fn approve_stage(
        &self,
        order_id: u64,
        stage_name: &str,
        vehicle: Option<&str>,
        action: &str,
        comments: Option<&str>,
        acting_user: u64,
    ) -> WorkflowResult<ApprovalOutcome> {
        let lock = self.repo.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut order = self.load_order(order_id).await?;
        let idx = locate_stage(&order, stage_name, vehicle, StageStatus::Pending)?;

        let user = self.load_user(acting_user).await?;
        self.authorize(&user, &order.stages[idx])?;
        enforce_sequence(&order, idx)?;

        let (new_status, composed) = apply_action(action, comments)?;

        let stage = &mut order.stages[idx];
        stage.status = new_status;
        stage.approver = Some(user.employee_name.clone());
        stage.department = self
            .roles
            .department_name(user.department_id)
            .map(str::to_string);
        stage.timestamp = Some(Utc::now());
        stage.action = Some(action.to_string());
        stage.comments = Some(composed);

        let label = order.stages[idx].label();
        order.status = roll_up(&order.stages);
        let outcome = self.commit(order, order_id).await?;

        info!(
            order_id,
            stage = %label,
            action,
            status = ?outcome.order_status,
            approver = %user.employee_name,
            "Stage actioned"
        );
        Ok(outcome)
    }

    /// Reset a rejected stage back to pending, clearing the approval stamp.
    /// Authorization follows the same rules as approval.
    pub async fn revoke_rejected_stage(
        &self,
        order_id: u64,
        stage_name: &str,
        vehicle: Option<&str>,
        acting_user: u64,
    ) -> WorkflowResult<ApprovalOutcome> {
        let lock = self.repo.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut order = self.load_order(order_id).await?;
        let idx = locate_stage(&order, stage_name, vehicle, StageStatus::Rejected)?;

        let user = self.load_user(acting_user).await?;
        self.authorize(&user, &order.stages[idx])?;

        let stage = &mut order.stages[idx];
        stage.status = StageStatus::Pending;
        stage.approver = None;
        stage.department = None;
        stage.timestamp = None;
        stage.action = None;
        stage.comments = None;

        let label = order.stages[idx].label();
        order.status = roll_up(&order.stages);
        let outcome = self.commit(order, order_id).await?;

        info!(
            order_id,
            stage = %label,
            status = ?outcome.order_status,
            "Stage rejection revoked"
        );
        Ok(outcome)
    }

    /// All pending stages across all orders that the user's role-set lets
    /// them act on.
    pub async fn pending_approvals_for(&self, user_id: u64) -> WorkflowResult<Vec<PendingApproval>> {
        let user = self.load_user(user_id).await?;
        let roles = self.roles.roles_for(user.department_id);
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut pending = Vec::new();
        for order in self.repo.orders().await? {
            for stage in &order.stages {
                if stage.status != StageStatus::Pending {
                    continue;
                }
                let needed = required_role(stage.kind);
                if roles.contains(&needed) {
                    pending.push(PendingApproval {
                        order_id: order.id,
                        order_number: order.order_number.clone(),
                        stage: stage.label(),
                        vehicle: stage.vehicle.clone(),
                        required_role: needed.to_string(),
                        order_status: order.status,
                    });
                }
            }
        }
        Ok(pending)
    }

    async fn load_order(&self, order_id: u64) -> WorkflowResult<Order> {
        self.repo
            .find_order(order_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("order {order_id} not found")))
    }

    async fn load_user(&self, user_id: u64) -> WorkflowResult<UserAccount> {
        self.repo
            .find_user(user_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("user {user_id} not found")))
    }

    fn authorize(&self, user: &UserAccount, stage: &Stage) -> WorkflowResult<()> {
        let needed = required_role(stage.kind);
        if !self.roles.can_act_as(user.department_id, needed) {
            warn!(
                user = %user.employee_name,
                stage = %stage.label(),
                required = %needed,
                "Stage action refused"
            );
            return Err(WorkflowError::Authorization(format!(
                "{} is not authorized to act on '{}' (requires {})",
                user.employee_name,
                stage.label(),
                needed
            )));
        }
        Ok(())
    }

    async fn commit(&self, order: Order, order_id: u64) -> WorkflowResult<ApprovalOutcome> {
        let mut updated = order;
        let expected = updated.version;
        updated.version += 1;

        let outcome = ApprovalOutcome {
            stages: updated.stages.clone(),
            order_status: updated.status,
        };
        self.repo
            .upsert_order(updated, expected)
            .await
            .map_err(|err| match err {
                StoreError::VersionMismatch { .. } => WorkflowError::Conflict(format!(
                    "order {order_id} was modified concurrently; retry the operation"
                )),
                other => WorkflowError::Store(other),
            })?;
        Ok(outcome)
    }
}

/// Find the index of the target stage. A vehicle pins the lookup exactly;
/// without one the order must have at most one assigned vehicle, so a lookup
/// can never silently cross vehicle scope.
fn locate_stage(
    order: &Order,
    stage_name: &str,
    vehicle: Option<&str>,
    wanted: StageStatus,
) -> WorkflowResult<usize> {
    if parse_label(stage_name).is_none() {
        return Err(WorkflowError::Validation(format!(
            "unrecognized stage name '{stage_name}'"
        )));
    }

    match vehicle {
        Some(v) => order
            .stages
            .iter()
            .position(|s| s.status == wanted && s.vehicle == v && s.label() == stage_name)
            .ok_or_else(|| {
                WorkflowError::NotFound(format!(
                    "no {wanted:?} stage '{stage_name}' for vehicle {v} on order {}",
                    order.id
                ))
            }),
        None => {
            if order.vehicles.len() > 1 {
                return Err(WorkflowError::NotFound(format!(
                    "stage '{stage_name}' is ambiguous: order {} has {} vehicles, pass a vehicle registration",
                    order.id,
                    order.vehicles.len()
                )));
            }
            order
                .stages
                .iter()
                .position(|s| s.status == wanted && s.label() == stage_name)
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!(
                        "no {wanted:?} stage '{stage_name}' on order {}",
                        order.id
                    ))
                })
        }
    }
}

/// Reject the mutation if any earlier stage of the same vehicle has not yet
/// reached a settled state (completed, or rejected pending revocation).
fn enforce_sequence(order: &Order, idx: usize) -> WorkflowResult<()> {
    let vehicle = &order.stages[idx].vehicle;
    for earlier in order.stages[..idx].iter().filter(|s| &s.vehicle == vehicle) {
        if !matches!(
            earlier.status,
            StageStatus::Completed | StageStatus::Rejected
        ) {
            return Err(WorkflowError::Sequence(format!(
                "'{}' must be completed before '{}' for vehicle {}",
                earlier.label(),
                order.stages[idx].label(),
                vehicle
            )));
        }
    }
    Ok(())
}

/// Action → status policy, with the comment prefixes the wire format has
/// always used. Unrecognized actions complete the stage.
fn apply_action(action: &str, comments: Option<&str>) -> WorkflowResult<(StageStatus, String)> {
    let comments = comments.unwrap_or("").trim();
    let result = match action {
        "reject" => (
            StageStatus::Rejected,
            format!(
                "Stage rejected. {}",
                if comments.is_empty() {
                    "No comments provided"
                } else {
                    comments
                }
            ),
        ),
        "approve" | "approved" => (
            StageStatus::Completed,
            if comments.is_empty() {
                "Stage approved".to_string()
            } else {
                comments.to_string()
            },
        ),
        "waiting_beyond_eta" => (
            StageStatus::Delayed,
            format!("Vehicle waiting beyond ETA. {comments}"),
        ),
        "vehicle_not_reached" => (
            StageStatus::Pending,
            format!("Vehicle not reached. {comments}"),
        ),
        "reached_with_comments" => {
            if comments.is_empty() {
                return Err(WorkflowError::Validation(
                    "comments required for reached_with_comments action".to_string(),
                ));
            }
            (
                StageStatus::Completed,
                format!("Vehicle reached with comments: {comments}"),
            )
        }
        "verified" => (
            StageStatus::Completed,
            format!("Consignment verified. {comments}"),
        ),
        _ => (StageStatus::Completed, comments.to_string()),
    };
    Ok(result)
}

/// Order status over ALL stages of ALL vehicles. All completed wins, then any
/// rejection, then any delay; a single vehicle's rejection flips the whole
/// order even while the others are healthy.
fn roll_up(stages: &[Stage]) -> OrderStatus {
    if stages.iter().all(|s| s.status == StageStatus::Completed) {
        OrderStatus::Completed
    } else if stages.iter().any(|s| s.status == StageStatus::Rejected) {
        OrderStatus::Rejected
    } else if stages.iter().any(|s| s.status == StageStatus::Delayed) {
        OrderStatus::Delayed
    } else {
        OrderStatus::InProgress
    }
}
