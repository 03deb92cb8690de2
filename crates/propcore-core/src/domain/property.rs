//! Property domain entity

use propcore_shared::{AuditFields, EntityId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// A building or complex owning a set of units.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Property {
    pub id: EntityId,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 500))]
    pub address: String,

    pub description: Option<String>,
    pub is_active: bool,

    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Property {
    pub fn new(name: String, address: String, created_by: Option<Uuid>) -> Result<Self, DomainError> {
        let property = Self {
            id: Uuid::new_v4(),
            name,
            address,
            description: None,
            is_active: true,
            audit: AuditFields::new(created_by),
        };
        super::check_valid(&property)?;
        Ok(property)
    }

    pub fn soft_delete(&mut self, deleted_by: Uuid) {
        self.is_active = false;
        self.audit.removed_at = Some(chrono::Utc::now());
        self.audit.removed_by = Some(deleted_by);
    }

    pub fn is_deleted(&self) -> bool {
        self.audit.removed_at.is_some()
    }
}
