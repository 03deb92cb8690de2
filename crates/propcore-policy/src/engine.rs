// ============================================================================
// Propcore Policy - Policy Engine
// File: crates/propcore-policy/src/engine.rs
// Description: Centralized (role, capability) decision table
// ============================================================================

use crate::actor::Actor;
use crate::capability::{Action, Capability, Resource};
use crate::role::Role;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Pure decision function over (role, capability). Stateless; a denial is
/// the default for unknown tokens and role-less actors, never a panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decides a raw `<resource>:<action>` token. Unknown tokens deny.
    pub fn authorize(&self, actor: &Actor, token: &str) -> Decision {
        let Some(capability) = Capability::parse(token) else {
            return Decision::Deny;
        };
        match actor.role {
            Some(role) if Self::allows(role, &capability) => Decision::Allow,
            _ => Decision::Deny,
        }
    }

    /// The single policy table. Every enforcement point in the core routes
    /// through here; there are no per-call-site permission checks.
    fn allows(role: Role, capability: &Capability) -> bool {
        use Action::*;
        use Resource::*;

        match role {
            Role::Administrator => true,
            Role::Manager => matches!(
                (capability.resource, capability.action),
                (Leases, _)
                    | (Properties, Read | Manage)
                    | (Units, Read | Manage)
                    | (Tenants, Read | Manage)
                    | (Expenses, Read | Create | Approve)
                    | (Employees, Read)
                    | (Events, Read)
            ),
            Role::Accountant => matches!(
                (capability.resource, capability.action),
                (Expenses, Read | Approve | Pay)
                    | (Leases, Read)
                    | (Properties, Read)
                    | (Units, Read)
                    | (Tenants, Read)
                    | (Events, Read)
            ),
            Role::Maintenance => matches!(
                (capability.resource, capability.action),
                (Expenses, Read | Create) | (Properties, Read) | (Units, Read)
            ),
            Role::Viewer => capability.action == Read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn actor(role: Role) -> Actor {
        Actor::new(Uuid::new_v4(), role)
    }

    #[test]
    fn test_admin_allows_everything() {
        let engine = PolicyEngine::new();
        let admin = actor(Role::Administrator);
        for token in ["leases:create", "expenses:pay", "employees:manage", "events:read"] {
            assert_eq!(engine.authorize(&admin, token), Decision::Allow);
        }
    }

    #[test]
    fn test_unknown_token_denies_even_admin() {
        let engine = PolicyEngine::new();
        assert_eq!(
            engine.authorize(&actor(Role::Administrator), "leases:overclock"),
            Decision::Deny
        );
    }

    #[test]
    fn test_roleless_actor_denied() {
        let engine = PolicyEngine::new();
        let anon = Actor::anonymous(Uuid::new_v4());
        assert_eq!(engine.authorize(&anon, "leases:read"), Decision::Deny);
    }

    #[test]
    fn test_viewer_read_only() {
        let engine = PolicyEngine::new();
        let viewer = actor(Role::Viewer);
        assert_eq!(engine.authorize(&viewer, "leases:read"), Decision::Allow);
        assert_eq!(engine.authorize(&viewer, "leases:create"), Decision::Deny);
        assert_eq!(engine.authorize(&viewer, "expenses:approve"), Decision::Deny);
    }

    #[test]
    fn test_accountant_pays_but_does_not_create_leases() {
        let engine = PolicyEngine::new();
        let accountant = actor(Role::Accountant);
        assert_eq!(engine.authorize(&accountant, "expenses:pay"), Decision::Allow);
        assert_eq!(engine.authorize(&accountant, "leases:create"), Decision::Deny);
    }

    #[test]
    fn test_maintenance_submits_expenses_only() {
        let engine = PolicyEngine::new();
        let maintenance = actor(Role::Maintenance);
        assert_eq!(engine.authorize(&maintenance, "expenses:create"), Decision::Allow);
        assert_eq!(engine.authorize(&maintenance, "expenses:approve"), Decision::Deny);
        assert_eq!(engine.authorize(&maintenance, "leases:terminate"), Decision::Deny);
    }
}
