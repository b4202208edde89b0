//! Role resolution.
//!
//! Departments are resolved into stage-gating roles once, when the directory
//! is built from the department table, instead of re-deriving them from name
//! substrings on every request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::records::Department;

/// Permission class required to transition a stage of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Security,
    Stores,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Security => write!(f, "security"),
            Role::Stores => write!(f, "stores"),
        }
    }
}

/// Department-id → role-set lookup table, built once per department load.
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory {
    by_department: HashMap<u64, Vec<Role>>,
    names: HashMap<u64, String>,
}

impl RoleDirectory {
    /// Resolve every department into its role-set. Admin departments carry
    /// all three roles; purchase-team departments sign order approvals;
    /// everything else is matched on the security/stores/fabric name
    /// conventions the department table uses.
    pub fn build(
        departments: &[Department],
        admin_departments: &[String],
        purchase_team_departments: &[String],
    ) -> Self {
        let mut by_department = HashMap::new();
        let mut names = HashMap::new();

        for dep in departments {
            let lowered = dep.name.to_lowercase();
            let roles = if admin_departments.iter().any(|a| a == &dep.name) {
                vec![Role::Admin, Role::Security, Role::Stores]
            } else if purchase_team_departments.iter().any(|p| p == &dep.name) {
                vec![Role::Admin]
            } else if lowered.contains("security") {
                vec![Role::Security]
            } else if lowered.contains("stores") || lowered.contains("fabric") {
                vec![Role::Stores]
            } else {
                Vec::new()
            };

            by_department.insert(dep.id, roles);
            names.insert(dep.id, dep.name.clone());
        }

        Self {
            by_department,
            names,
        }
    }

    /// Role-set for a department. Unknown departments get the empty set, so
    /// every authorization check against them fails.
    pub fn roles_for(&self, department_id: u64) -> &[Role] {
        self.by_department
            .get(&department_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn can_act_as(&self, department_id: u64, role: Role) -> bool {
        self.roles_for(department_id).contains(&role)
    }

    /// Display name for stamping onto approved stages.
    pub fn department_name(&self, department_id: u64) -> Option<&str> {
        self.names.get(&department_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(id: u64, name: &str) -> Department {
        Department {
            id,
            name: name.to_string(),
        }
    }

    fn directory() -> RoleDirectory {
        let departments = vec![
            dep(1, "Admin"),
            dep(2, "Gate Security Unit-1"),
            dep(3, "Stores Unit-IV/ soliflex unit-II"),
            dep(4, "Accounts Team"),
            dep(5, "Fabric Solifelx unit-III"),
            dep(6, "Canteen"),
        ];
        RoleDirectory::build(
            &departments,
            &["Admin".to_string()],
            &["Accounts Team".to_string()],
        )
    }

    #[test]
    fn admin_department_carries_every_role() {
        let dir = directory();
        assert!(dir.can_act_as(1, Role::Admin));
        assert!(dir.can_act_as(1, Role::Security));
        assert!(dir.can_act_as(1, Role::Stores));
    }

    #[test]
    fn purchase_team_signs_order_approvals_only() {
        let dir = directory();
        assert!(dir.can_act_as(4, Role::Admin));
        assert!(!dir.can_act_as(4, Role::Security));
        assert!(!dir.can_act_as(4, Role::Stores));
    }

    #[test]
    fn security_and_stores_resolve_by_name_convention() {
        let dir = directory();
        assert_eq!(dir.roles_for(2), &[Role::Security]);
        assert_eq!(dir.roles_for(3), &[Role::Stores]);
        // Fabric teams verify consignments too.
        assert_eq!(dir.roles_for(5), &[Role::Stores]);
    }

    #[test]
    fn unmatched_and_unknown_departments_get_no_roles() {
        let dir = directory();
        assert!(dir.roles_for(6).is_empty());
        assert!(dir.roles_for(999).is_empty());
        assert!(!dir.can_act_as(999, Role::Admin));
    }
}
