//! Audit log query service

use std::sync::Arc;

use propcore_policy::{tokens, Actor, PolicyEngine};
use propcore_shared::constants::DEFAULT_EVENT_WINDOW;

use crate::domain::{ActivityEvent, EventFilter};
use crate::error::DomainError;
use crate::repositories::AuditLog;

/// Read-only window over the audit log for the reporting collaborator.
/// Events come back ordered by timestamp ascending; an unbounded filter is
/// capped to a default window.
pub struct AuditService<L: AuditLog> {
    log: Arc<L>,
    policy: PolicyEngine,
}

impl<L: AuditLog> AuditService<L> {
    pub fn new(log: Arc<L>, policy: PolicyEngine) -> Self {
        Self { log, policy }
    }

    pub async fn query(&self, actor: &Actor, mut filter: EventFilter) -> Result<Vec<ActivityEvent>, DomainError> {
        super::authorize(&self.policy, actor, tokens::EVENTS_READ)?;
        if filter.limit.is_none() {
            filter.limit = Some(DEFAULT_EVENT_WINDOW);
        }
        self.log.events(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{actions, entities};
    use crate::repositories::TenancyStore;
    use crate::store::InMemoryStore;
    use propcore_policy::Role;
    use uuid::Uuid;

    async fn record(store: &InMemoryStore, action: &str, entity_id: Uuid) {
        let mut tx = store.begin().await.unwrap();
        tx.record_event(&ActivityEvent::new(None, action, entities::LEASE, entity_id, None, None))
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_query_is_ordered_and_restartable() {
        let store = Arc::new(InMemoryStore::new());
        let lease_id = Uuid::new_v4();
        record(&store, actions::LEASE_ASSIGNED, lease_id).await;
        record(&store, actions::LEASE_ACTIVATED, lease_id).await;
        record(&store, actions::LEASE_COMPLETED, lease_id).await;

        let service = AuditService::new(store, PolicyEngine::new());
        let viewer = Actor::new(Uuid::new_v4(), Role::Viewer);
        let filter = EventFilter::for_entity(entities::LEASE, lease_id);

        let first = service.query(&viewer, filter.clone()).await.unwrap();
        let second = service.query(&viewer, filter).await.unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
        // Each call is a fresh, identical window.
        assert_eq!(
            first.iter().map(|e| e.id).collect::<Vec<_>>(),
            second.iter().map(|e| e.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_query_requires_events_read() {
        let store = Arc::new(InMemoryStore::new());
        let service = AuditService::new(store, PolicyEngine::new());
        let anonymous = Actor::anonymous(Uuid::new_v4());
        let result = service.query(&anonymous, EventFilter::default()).await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
    }
}
