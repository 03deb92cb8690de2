//! Activity event: the append-only audit record

use chrono::{DateTime, Utc};
use propcore_shared::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DomainError;

/// Business actions recorded in the audit log.
pub mod actions {
    pub const LEASE_ASSIGNED: &str = "lease.assigned";
    pub const LEASE_ACTIVATED: &str = "lease.activated";
    pub const LEASE_COMPLETED: &str = "lease.completed";
    pub const LEASE_TERMINATED: &str = "lease.terminated";
    pub const EXPENSE_SUBMITTED: &str = "expense.submitted";
    pub const EXPENSE_APPROVED: &str = "expense.approved";
    pub const EXPENSE_REJECTED: &str = "expense.rejected";
    pub const EXPENSE_PAID: &str = "expense.paid";
    pub const EMPLOYEE_CREATED: &str = "employee.created";
    pub const EMPLOYEE_ROLE_CHANGED: &str = "employee.role_changed";
    pub const EMPLOYEE_DISABLED: &str = "employee.disabled";
    pub const PROPERTY_CREATED: &str = "property.created";
    pub const UNIT_CREATED: &str = "unit.created";
    pub const TENANT_REGISTERED: &str = "tenant.registered";
}

/// Entity type tags used in events.
pub mod entities {
    pub const LEASE: &str = "lease";
    pub const EXPENSE_REQUEST: &str = "expense_request";
    pub const EMPLOYEE: &str = "employee";
    pub const PROPERTY: &str = "property";
    pub const UNIT: &str = "unit";
    pub const TENANT: &str = "tenant";
}

/// Immutable record of one committed state transition. Appended in the same
/// transaction as the transition itself; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: EntityId,

    /// `None` for transitions performed by the scheduled sweep.
    pub actor_id: Option<EntityId>,

    pub action: String,
    pub entity_type: String,
    pub entity_id: EntityId,
    pub before_state: Option<Value>,
    pub after_state: Option<Value>,
    pub recorded_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(
        actor_id: Option<EntityId>,
        action: &str,
        entity_type: &str,
        entity_id: EntityId,
        before_state: Option<Value>,
        after_state: Option<Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            before_state,
            after_state,
            recorded_at: Utc::now(),
        }
    }
}

/// Serializes an entity snapshot for the before/after fields.
pub fn snapshot<T: Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::InvariantViolation(format!("snapshot serialization failed: {e}")))
}

/// Bounded, restartable window over the audit log. Matching events are
/// returned ordered by timestamp ascending.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<EntityId>,
    pub actor_id: Option<EntityId>,
    pub action: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl EventFilter {
    pub fn for_entity(entity_type: &str, entity_id: EntityId) -> Self {
        Self {
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, event: &ActivityEvent) -> bool {
        if let Some(entity_type) = &self.entity_type {
            if &event.entity_type != entity_type {
                return false;
            }
        }
        if let Some(entity_id) = &self.entity_id {
            if &event.entity_id != entity_id {
                return false;
            }
        }
        if let Some(actor_id) = &self.actor_id {
            if event.actor_id.as_ref() != Some(actor_id) {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &event.action != action {
                return false;
            }
        }
        if let Some(after) = &self.after {
            if event.recorded_at <= *after {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_entity() {
        let lease_id = Uuid::new_v4();
        let event = ActivityEvent::new(None, actions::LEASE_ASSIGNED, entities::LEASE, lease_id, None, None);
        assert!(EventFilter::for_entity(entities::LEASE, lease_id).matches(&event));
        assert!(!EventFilter::for_entity(entities::LEASE, Uuid::new_v4()).matches(&event));
        assert!(!EventFilter::for_entity(entities::TENANT, lease_id).matches(&event));
    }

    #[test]
    fn test_filter_by_action_and_actor() {
        let actor = Uuid::new_v4();
        let event = ActivityEvent::new(
            Some(actor),
            actions::EXPENSE_PAID,
            entities::EXPENSE_REQUEST,
            Uuid::new_v4(),
            None,
            None,
        );

        let mut filter = EventFilter::default();
        filter.action = Some(actions::EXPENSE_PAID.into());
        filter.actor_id = Some(actor);
        assert!(filter.matches(&event));

        filter.actor_id = Some(Uuid::new_v4());
        assert!(!filter.matches(&event));
    }
}
