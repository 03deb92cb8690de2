//! Employee domain entity

use chrono::Utc;
use propcore_shared::{AuditFields, EntityId};
use propcore_policy::{Actor, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// A back-office employee. Created by an administrator, soft-disabled on
/// departure, never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Employee {
    pub id: EntityId,

    #[validate(length(min = 1, max = 200))]
    pub full_name: String,

    #[validate(email)]
    pub email: String,

    pub role: Role,

    /// Properties directly assigned for partial visibility. Ignored for
    /// administrators and managers, who see everything.
    pub property_scopes: Vec<EntityId>,

    pub is_active: bool,

    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Employee {
    pub fn new(
        full_name: String,
        email: String,
        role: Role,
        created_by: Option<Uuid>,
    ) -> Result<Self, DomainError> {
        let employee = Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            role,
            property_scopes: Vec::new(),
            is_active: true,
            audit: AuditFields::new(created_by),
        };
        super::check_valid(&employee)?;
        Ok(employee)
    }

    pub fn change_role(&mut self, role: Role, modified_by: Uuid) {
        self.role = role;
        self.audit.touch(modified_by);
    }

    pub fn set_property_scopes(&mut self, scopes: Vec<EntityId>, modified_by: Uuid) {
        self.property_scopes = scopes;
        self.audit.touch(modified_by);
    }

    pub fn disable(&mut self, disabled_by: Uuid) {
        self.is_active = false;
        self.audit.removed_at = Some(Utc::now());
        self.audit.removed_by = Some(disabled_by);
    }

    pub fn is_disabled(&self) -> bool {
        !self.is_active || self.audit.removed_at.is_some()
    }

    /// The actor identity the session layer hands to core operations.
    /// Disabled employees become role-less and are denied everything.
    pub fn as_actor(&self) -> Actor {
        if self.is_disabled() {
            Actor::anonymous(self.id)
        } else {
            Actor::with_scopes(self.id, self.role, self.property_scopes.clone())
        }
    }
}
