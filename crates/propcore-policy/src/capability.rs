// ============================================================================
// Propcore Policy - Capability Tokens
// File: crates/propcore-policy/src/capability.rs
// Description: `<resource>:<action>` tokens guarding core operations
// ============================================================================

use serde::{Deserialize, Serialize};

/// Guarded resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Properties,
    Units,
    Tenants,
    Leases,
    Expenses,
    Employees,
    Events,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Properties => "properties",
            Resource::Units => "units",
            Resource::Tenants => "tenants",
            Resource::Leases => "leases",
            Resource::Expenses => "expenses",
            Resource::Employees => "employees",
            Resource::Events => "events",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "properties" => Some(Resource::Properties),
            "units" => Some(Resource::Units),
            "tenants" => Some(Resource::Tenants),
            "leases" => Some(Resource::Leases),
            "expenses" => Some(Resource::Expenses),
            "employees" => Some(Resource::Employees),
            "events" => Some(Resource::Events),
            _ => None,
        }
    }
}

/// Guarded action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Manage,
    Activate,
    Complete,
    Terminate,
    Approve,
    Pay,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Manage => "manage",
            Action::Activate => "activate",
            Action::Complete => "complete",
            Action::Terminate => "terminate",
            Action::Approve => "approve",
            Action::Pay => "pay",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Action::Read),
            "create" => Some(Action::Create),
            "manage" => Some(Action::Manage),
            "activate" => Some(Action::Activate),
            "complete" => Some(Action::Complete),
            "terminate" => Some(Action::Terminate),
            "approve" => Some(Action::Approve),
            "pay" => Some(Action::Pay),
            _ => None,
        }
    }
}

/// A parsed `<resource>:<action>` capability token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub resource: Resource,
    pub action: Action,
}

impl Capability {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// Parses a capability token. `None` means the token is unknown to the
    /// policy table and must resolve to deny.
    pub fn parse(token: &str) -> Option<Self> {
        let (resource, action) = token.split_once(':')?;
        Some(Self {
            resource: Resource::from_str(resource)?,
            action: Action::from_str(action)?,
        })
    }

    pub fn token(&self) -> String {
        format!("{}:{}", self.resource.as_str(), self.action.as_str())
    }
}

/// Token constants used by the core services.
pub mod tokens {
    pub const LEASES_READ: &str = "leases:read";
    pub const LEASES_CREATE: &str = "leases:create";
    pub const LEASES_ACTIVATE: &str = "leases:activate";
    pub const LEASES_COMPLETE: &str = "leases:complete";
    pub const LEASES_TERMINATE: &str = "leases:terminate";
    pub const EXPENSES_READ: &str = "expenses:read";
    pub const EXPENSES_CREATE: &str = "expenses:create";
    pub const EXPENSES_APPROVE: &str = "expenses:approve";
    pub const EXPENSES_PAY: &str = "expenses:pay";
    pub const PROPERTIES_MANAGE: &str = "properties:manage";
    pub const UNITS_MANAGE: &str = "units:manage";
    pub const TENANTS_MANAGE: &str = "tenants:manage";
    pub const EMPLOYEES_MANAGE: &str = "employees:manage";
    pub const EVENTS_READ: &str = "events:read";
}
