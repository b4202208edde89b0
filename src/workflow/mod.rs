pub mod engine;
pub mod roles;
pub mod stages;

pub use engine::{ApprovalOutcome, NewOrder, OrderService, PendingApproval};
pub use roles::{Role, RoleDirectory};
pub use stages::{generate_stages, parse_label, required_role, ParsedLabel};
