// Gatepass Library - Shipment Order Approval Tracking
// This exposes the core components for testing and integration

pub mod allocation;
pub mod cli;
pub mod config;
pub mod errors;
pub mod records;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use allocation::{
    staged_search, AllocationMatcher, AllocationService, Band, Category, Suggestion,
    SuggestionSet, TierKind, TieredOutcome, WastageSuggestion,
};
pub use config::{config, GatepassConfig};
pub use errors::{StoreError, WorkflowError, WorkflowResult};
pub use records::{
    format_order_number, Department, Leg, LegRef, Order, OrderStatus, Site, Stage, StageKind,
    StageStatus, TransportType, UserAccount, Vehicle,
};
pub use store::{JsonFileStore, MemoryStore, Repository, RowStore, Tables};
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use workflow::{
    generate_stages, parse_label, required_role, ApprovalOutcome, NewOrder, OrderService,
    PendingApproval, Role, RoleDirectory,
};
