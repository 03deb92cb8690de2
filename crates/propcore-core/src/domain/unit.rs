//! Unit domain entity

use propcore_shared::{AuditFields, EntityId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// A rentable unit inside exactly one property. `is_occupied` is derived
/// from whether the unit currently has an active lease; it is recomputed
/// inside the same transaction as every lease transition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Unit {
    pub id: EntityId,
    pub property_id: EntityId,

    #[validate(length(min = 1, max = 50))]
    pub label: String,

    pub floor: Option<i32>,
    pub bedrooms: Option<i32>,
    pub is_occupied: bool,

    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Unit {
    pub fn new(property_id: EntityId, label: String, created_by: Option<Uuid>) -> Result<Self, DomainError> {
        let unit = Self {
            id: Uuid::new_v4(),
            property_id,
            label,
            floor: None,
            bedrooms: None,
            is_occupied: false,
            audit: AuditFields::new(created_by),
        };
        super::check_valid(&unit)?;
        Ok(unit)
    }

    pub fn is_deleted(&self) -> bool {
        self.audit.removed_at.is_some()
    }
}
