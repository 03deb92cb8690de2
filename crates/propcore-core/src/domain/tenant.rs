//! Tenant domain entity

use propcore_shared::{AuditFields, EntityId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// A person or entity holding leases. A tenant may hold many leases over
/// time and active leases on different units concurrently.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Tenant {
    pub id: EntityId,

    #[validate(length(min = 1, max = 200))]
    pub full_name: String,

    #[validate(email)]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub is_active: bool,

    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Tenant {
    pub fn new(
        full_name: String,
        email: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Self, DomainError> {
        let tenant = Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            phone: None,
            national_id: None,
            is_active: true,
            audit: AuditFields::new(created_by),
        };
        super::check_valid(&tenant)?;
        Ok(tenant)
    }

    pub fn is_deleted(&self) -> bool {
        self.audit.removed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tenant() {
        let tenant = Tenant::new("Amina Hassan".into(), Some("amina@example.com".into()), None);
        assert!(tenant.is_ok());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let tenant = Tenant::new("Amina Hassan".into(), Some("not-an-email".into()), None);
        assert!(matches!(tenant, Err(DomainError::ValidationError(_))));
    }
}
