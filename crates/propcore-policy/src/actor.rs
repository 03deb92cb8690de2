//! Actor identity supplied by the session collaborator

use propcore_shared::EntityId;
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// The authenticated caller of a core operation. Built by the session layer;
/// the core never looks up sessions itself. A role of `None` models an
/// unauthenticated or soft-disabled actor and is denied everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: EntityId,
    pub role: Option<Role>,
    pub property_scopes: Vec<EntityId>,
}

impl Actor {
    pub fn new(id: EntityId, role: Role) -> Self {
        Self { id, role: Some(role), property_scopes: Vec::new() }
    }

    pub fn with_scopes(id: EntityId, role: Role, property_scopes: Vec<EntityId>) -> Self {
        Self { id, role: Some(role), property_scopes }
    }

    pub fn anonymous(id: EntityId) -> Self {
        Self { id, role: None, property_scopes: Vec::new() }
    }

    /// Scope visibility: administrators and managers see every property,
    /// other roles only those directly assigned to them. An empty scope set
    /// on a scoped role means no property access.
    pub fn can_access_property(&self, property_id: &EntityId) -> bool {
        match self.role {
            Some(Role::Administrator) | Some(Role::Manager) => true,
            Some(_) => self.property_scopes.contains(property_id),
            None => false,
        }
    }
}
