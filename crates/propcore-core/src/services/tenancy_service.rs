// ============================================================================
// Propcore Core - Tenancy Assignment Service
// File: crates/propcore-core/src/services/tenancy_service.rs
// Description: Unit-occupancy invariant, lease lifecycle transitions, sweep
// ============================================================================

use std::sync::Arc;

use propcore_policy::{tokens, Actor, PolicyEngine};
use propcore_shared::utils;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::activity_event::snapshot;
use crate::domain::{actions, entities, ActivityEvent, Lease, LeaseDraft, LeaseStatus};
use crate::error::DomainError;
use crate::repositories::TenancyStore;

/// Outcome of one expiry/activation sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub activated: u32,
    pub completed: u32,
    pub failed: u32,
}

/// Binds tenants to units through leases and drives the lease lifecycle.
/// Every mutation runs inside one store transaction so the occupancy check
/// and the writes it justifies cannot be split by a concurrent request.
pub struct TenancyService<S: TenancyStore> {
    store: Arc<S>,
    policy: PolicyEngine,
}

impl<S: TenancyStore> TenancyService<S> {
    pub fn new(store: Arc<S>, policy: PolicyEngine) -> Self {
        Self { store, policy }
    }

    /// Assigns a tenant to a unit. Fails with `UnitOccupied` while an
    /// unexpired active lease holds the unit; an expired one is completed
    /// and archived in the same transaction before the new lease is created.
    /// A lease starting today or earlier activates immediately; a
    /// future-dated lease stays Draft until `try_activate` or the sweep.
    pub async fn assign_tenant(
        &self,
        actor: &Actor,
        unit_id: Uuid,
        tenant_id: Uuid,
        draft: LeaseDraft,
    ) -> Result<Lease, DomainError> {
        super::authorize(&self.policy, actor, tokens::LEASES_CREATE)?;
        info!(%unit_id, %tenant_id, "assigning tenant to unit");

        let today = utils::today();
        let mut tx = self.store.begin().await?;

        tx.unit_by_id(&unit_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "unit", id: unit_id })?;
        tx.tenant_by_id(&tenant_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "tenant", id: tenant_id })?;

        // Occupancy guard under the row lock. Returning early drops the
        // transaction, rolling back anything staged so far.
        if let Some(mut current) = tx.active_lease_for_unit(&unit_id).await? {
            if !current.is_expired(today) {
                warn!(%unit_id, current_lease = %current.id, "unit already occupied");
                return Err(DomainError::UnitOccupied { unit_id });
            }
            let before = snapshot(&current)?;
            current.complete(Some(actor.id))?;
            tx.update_lease(&current).await?;
            tx.record_event(&ActivityEvent::new(
                Some(actor.id),
                actions::LEASE_COMPLETED,
                entities::LEASE,
                current.id,
                Some(before),
                Some(snapshot(&current)?),
            ))
            .await?;
            info!(lease_id = %current.id, "expired lease completed during assignment");
        }

        let mut lease = Lease::new(unit_id, tenant_id, &draft, Some(actor.id))?;
        if lease.can_start(today) {
            lease.activate(Some(actor.id))?;
        }
        tx.insert_lease(&lease).await?;
        tx.set_unit_occupancy(&unit_id, lease.status == LeaseStatus::Active).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::LEASE_ASSIGNED,
            entities::LEASE,
            lease.id,
            None,
            Some(snapshot(&lease)?),
        ))
        .await?;
        tx.commit().await?;

        info!(lease_id = %lease.id, status = lease.status.as_str(), "lease assigned");
        Ok(lease)
    }

    /// Idempotent activation hook for future-dated leases. An already-Active
    /// lease is a no-op returning the unchanged state; a Draft lease whose
    /// start date has not arrived stays Draft. Safe to call repeatedly and
    /// concurrently with direct API calls.
    pub async fn try_activate(&self, lease_id: Uuid) -> Result<Lease, DomainError> {
        let today = utils::today();
        let mut tx = self.store.begin().await?;
        let mut lease = tx
            .lease_by_id(&lease_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "lease", id: lease_id })?;

        match lease.status {
            LeaseStatus::Active => Ok(lease),
            LeaseStatus::Draft if !lease.can_start(today) => Ok(lease),
            LeaseStatus::Draft => {
                if let Some(current) = tx.active_lease_for_unit(&lease.unit_id).await? {
                    if current.id != lease.id {
                        warn!(%lease_id, current_lease = %current.id, "unit re-let before activation");
                        return Err(DomainError::UnitOccupied { unit_id: lease.unit_id });
                    }
                }
                let before = snapshot(&lease)?;
                lease.activate(None)?;
                tx.update_lease(&lease).await?;
                tx.set_unit_occupancy(&lease.unit_id, true).await?;
                tx.record_event(&ActivityEvent::new(
                    None,
                    actions::LEASE_ACTIVATED,
                    entities::LEASE,
                    lease.id,
                    Some(before),
                    Some(snapshot(&lease)?),
                ))
                .await?;
                tx.commit().await?;
                info!(%lease_id, "lease activated");
                Ok(lease)
            }
            _ => Err(DomainError::InvalidTransition {
                entity: "lease",
                id: lease_id,
                from: lease.status.as_str(),
                to: LeaseStatus::Active.as_str(),
            }),
        }
    }

    /// Administrative override: activates a Draft lease regardless of its
    /// start date.
    pub async fn activate_lease(&self, actor: &Actor, lease_id: Uuid) -> Result<Lease, DomainError> {
        super::authorize(&self.policy, actor, tokens::LEASES_ACTIVATE)?;

        let mut tx = self.store.begin().await?;
        let mut lease = tx
            .lease_by_id(&lease_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "lease", id: lease_id })?;

        // The unit may have been re-let since this draft was created.
        if let Some(current) = tx.active_lease_for_unit(&lease.unit_id).await? {
            if current.id != lease.id {
                warn!(%lease_id, current_lease = %current.id, "unit re-let before activation");
                return Err(DomainError::UnitOccupied { unit_id: lease.unit_id });
            }
        }

        let before = snapshot(&lease)?;
        lease.activate(Some(actor.id))?;
        tx.update_lease(&lease).await?;
        tx.set_unit_occupancy(&lease.unit_id, true).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::LEASE_ACTIVATED,
            entities::LEASE,
            lease.id,
            Some(before),
            Some(snapshot(&lease)?),
        ))
        .await?;
        tx.commit().await?;

        info!(%lease_id, "lease activated by override");
        Ok(lease)
    }

    /// Completes an active lease, either because its end date has passed or
    /// as an explicit early completion (mutual termination of the term).
    pub async fn complete_lease(&self, actor: &Actor, lease_id: Uuid) -> Result<Lease, DomainError> {
        super::authorize(&self.policy, actor, tokens::LEASES_COMPLETE)?;

        let mut tx = self.store.begin().await?;
        let mut lease = tx
            .lease_by_id(&lease_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "lease", id: lease_id })?;

        let before = snapshot(&lease)?;
        lease.complete(Some(actor.id))?;
        tx.update_lease(&lease).await?;
        tx.set_unit_occupancy(&lease.unit_id, false).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::LEASE_COMPLETED,
            entities::LEASE,
            lease.id,
            Some(before),
            Some(snapshot(&lease)?),
        ))
        .await?;
        tx.commit().await?;

        info!(%lease_id, "lease completed");
        Ok(lease)
    }

    /// Terminates a Draft or Active lease at any time, recording the reason.
    pub async fn terminate_lease(
        &self,
        actor: &Actor,
        lease_id: Uuid,
        reason: &str,
    ) -> Result<Lease, DomainError> {
        super::authorize(&self.policy, actor, tokens::LEASES_TERMINATE)?;

        let mut tx = self.store.begin().await?;
        let mut lease = tx
            .lease_by_id(&lease_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "lease", id: lease_id })?;

        let was_active = lease.status == LeaseStatus::Active;
        let before = snapshot(&lease)?;
        lease.terminate(reason, actor.id)?;
        tx.update_lease(&lease).await?;
        if was_active {
            tx.set_unit_occupancy(&lease.unit_id, false).await?;
        }
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::LEASE_TERMINATED,
            entities::LEASE,
            lease.id,
            Some(before),
            Some(snapshot(&lease)?),
        ))
        .await?;
        tx.commit().await?;

        info!(%lease_id, reason, "lease terminated");
        Ok(lease)
    }

    /// Full lease history of a unit, terminal leases included. Scoped roles
    /// only see units of properties assigned to them.
    pub async fn lease_history(&self, actor: &Actor, unit_id: Uuid) -> Result<Vec<Lease>, DomainError> {
        super::authorize(&self.policy, actor, tokens::LEASES_READ)?;

        let unit = self
            .store
            .unit_by_id(&unit_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "unit", id: unit_id })?;
        if !actor.can_access_property(&unit.property_id) {
            return Err(DomainError::Unauthorized {
                actor_id: actor.id,
                capability: tokens::LEASES_READ.to_string(),
            });
        }

        self.store.leases_for_unit(&unit_id).await
    }

    /// Scheduled sweep: activates due Draft leases and completes expired
    /// Active ones, one transaction per lease. Idempotent; a lease already
    /// handled by a direct call is skipped when re-read under the lock.
    pub async fn run_expiry_sweep(&self) -> Result<SweepReport, DomainError> {
        let today = utils::today();
        let due = self.store.leases_due(today).await?;
        let mut report = SweepReport::default();

        for lease_id in due {
            match self.sweep_one(lease_id).await {
                Ok(Some(actions::LEASE_ACTIVATED)) => report.activated += 1,
                Ok(Some(_)) => report.completed += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(%lease_id, error = %e, "sweep skipped lease");
                    report.failed += 1;
                }
            }
        }

        info!(
            activated = report.activated,
            completed = report.completed,
            failed = report.failed,
            "expiry sweep finished"
        );
        Ok(report)
    }

    async fn sweep_one(&self, lease_id: Uuid) -> Result<Option<&'static str>, DomainError> {
        let today = utils::today();
        let mut tx = self.store.begin().await?;
        let mut lease = tx
            .lease_by_id(&lease_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "lease", id: lease_id })?;

        let before = snapshot(&lease)?;
        let action = match lease.status {
            LeaseStatus::Draft if lease.can_start(today) => {
                if let Some(current) = tx.active_lease_for_unit(&lease.unit_id).await? {
                    if current.id != lease.id {
                        return Err(DomainError::UnitOccupied { unit_id: lease.unit_id });
                    }
                }
                lease.activate(None)?;
                actions::LEASE_ACTIVATED
            }
            LeaseStatus::Active if lease.is_expired(today) => {
                lease.complete(None)?;
                actions::LEASE_COMPLETED
            }
            // Raced with a direct call since `leases_due` ran; nothing to do.
            _ => return Ok(None),
        };

        tx.update_lease(&lease).await?;
        tx.set_unit_occupancy(&lease.unit_id, lease.status == LeaseStatus::Active).await?;
        tx.record_event(&ActivityEvent::new(
            None,
            action,
            entities::LEASE,
            lease.id,
            Some(before),
            Some(snapshot(&lease)?),
        ))
        .await?;
        tx.commit().await?;
        Ok(Some(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventFilter, Property, Tenant, Unit};
    use crate::repositories::{AuditLog, MockTenancyStore};
    use crate::store::InMemoryStore;
    use chrono::Duration;
    use propcore_policy::Role;
    use rust_decimal::Decimal;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: TenancyService<InMemoryStore>,
        manager: Actor,
        unit_id: Uuid,
        tenant_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let property = Property::new("Marina Towers".into(), "12 Corniche Rd".into(), None).unwrap();
        let unit = Unit::new(property.id, "A-101".into(), None).unwrap();
        let tenant = Tenant::new("Layla Nasser".into(), None, None).unwrap();
        let unit_id = unit.id;
        let tenant_id = tenant.id;
        store.seed_property(property).await;
        store.seed_unit(unit).await;
        store.seed_tenant(tenant).await;

        Fixture {
            service: TenancyService::new(store.clone(), PolicyEngine::new()),
            store,
            manager: Actor::new(Uuid::new_v4(), Role::Manager),
            unit_id,
            tenant_id,
        }
    }

    fn draft_from(start_offset_days: i64, end_offset_days: i64) -> LeaseDraft {
        let today = utils::today();
        LeaseDraft {
            start_date: today + Duration::days(start_offset_days),
            end_date: today + Duration::days(end_offset_days),
            monthly_rent: Decimal::new(120_000, 2),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_assign_vacant_unit_activates_immediately() {
        let f = fixture().await;
        let lease = f
            .service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(0, 365))
            .await
            .unwrap();

        assert_eq!(lease.status, LeaseStatus::Active);
        let unit = f.store.unit_by_id(&f.unit_id).await.unwrap().unwrap();
        assert!(unit.is_occupied);

        let events = f
            .store
            .events(&EventFilter::for_entity(entities::LEASE, lease.id))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, actions::LEASE_ASSIGNED);
    }

    #[tokio::test]
    async fn test_future_dated_lease_stays_draft() {
        let f = fixture().await;
        let lease = f
            .service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(30, 395))
            .await
            .unwrap();

        assert_eq!(lease.status, LeaseStatus::Draft);
        let unit = f.store.unit_by_id(&f.unit_id).await.unwrap().unwrap();
        assert!(!unit.is_occupied);
    }

    #[tokio::test]
    async fn test_occupied_unit_rejects_second_assignment() {
        let f = fixture().await;
        f.service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(0, 365))
            .await
            .unwrap();

        let other_tenant = Tenant::new("Karim Aziz".into(), None, None).unwrap();
        let other_id = other_tenant.id;
        f.store.seed_tenant(other_tenant).await;

        let result = f
            .service
            .assign_tenant(&f.manager, f.unit_id, other_id, draft_from(0, 365))
            .await;
        assert!(matches!(result, Err(DomainError::UnitOccupied { unit_id }) if unit_id == f.unit_id));

        // Failed attempt left no lease and no event behind.
        let history = f.service.lease_history(&f.manager, f.unit_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(f.store.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_expired_lease_rolls_over_to_new_tenant() {
        let f = fixture().await;
        // Seed an active lease that ended yesterday.
        let mut expired = Lease::new(f.unit_id, f.tenant_id, &draft_from(-365, -1), None).unwrap();
        expired.activate(None).unwrap();
        let expired_id = expired.id;
        f.store.seed_lease(expired).await;

        let next_tenant = Tenant::new("Karim Aziz".into(), None, None).unwrap();
        let next_tenant_id = next_tenant.id;
        f.store.seed_tenant(next_tenant).await;

        let new_lease = f
            .service
            .assign_tenant(&f.manager, f.unit_id, next_tenant_id, draft_from(0, 365))
            .await
            .unwrap();
        assert_eq!(new_lease.status, LeaseStatus::Active);

        // The expired lease was completed and stays retrievable as history.
        let old = f.store.lease_by_id(&expired_id).await.unwrap().unwrap();
        assert_eq!(old.status, LeaseStatus::Completed);
        let history = f.service.lease_history(&f.manager, f.unit_id).await.unwrap();
        assert_eq!(history.len(), 2);

        let events = f
            .store
            .events(&EventFilter::for_entity(entities::LEASE, expired_id))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, actions::LEASE_COMPLETED);
    }

    #[tokio::test]
    async fn test_unauthorized_assignment_never_touches_store() {
        // No expectation on `begin`: the mock panics if the service reaches
        // the store after a denial.
        let store = Arc::new(MockTenancyStore::new());
        let service = TenancyService::new(store, PolicyEngine::new());
        let viewer = Actor::new(Uuid::new_v4(), Role::Viewer);

        let result = service
            .assign_tenant(&viewer, Uuid::new_v4(), Uuid::new_v4(), draft_from(0, 365))
            .await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_try_activate_is_idempotent() {
        let f = fixture().await;
        let lease = f
            .service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(0, 365))
            .await
            .unwrap();
        assert_eq!(lease.status, LeaseStatus::Active);

        let first = f.service.try_activate(lease.id).await.unwrap();
        let second = f.service.try_activate(lease.id).await.unwrap();
        assert_eq!(first.status, LeaseStatus::Active);
        assert_eq!(second.status, LeaseStatus::Active);
        // No-ops record no additional events.
        assert_eq!(f.store.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_try_activate_leaves_undue_draft_alone() {
        let f = fixture().await;
        let lease = f
            .service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(30, 395))
            .await
            .unwrap();

        let unchanged = f.service.try_activate(lease.id).await.unwrap();
        assert_eq!(unchanged.status, LeaseStatus::Draft);
    }

    #[tokio::test]
    async fn test_try_activate_rejects_terminal_lease() {
        let f = fixture().await;
        let lease = f
            .service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(0, 365))
            .await
            .unwrap();
        f.service.complete_lease(&f.manager, lease.id).await.unwrap();

        let result = f.service.try_activate(lease.id).await;
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_terminate_draft_cancels_before_start() {
        let f = fixture().await;
        let lease = f
            .service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(30, 395))
            .await
            .unwrap();

        let terminated = f
            .service
            .terminate_lease(&f.manager, lease.id, "tenant withdrew")
            .await
            .unwrap();
        assert_eq!(terminated.status, LeaseStatus::Terminated);
        assert_eq!(terminated.termination_reason.as_deref(), Some("tenant withdrew"));
    }

    #[tokio::test]
    async fn test_activate_draft_on_relet_unit_reports_occupied() {
        let f = fixture().await;
        // Future-dated draft created while the unit was vacant.
        let pending = f
            .service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(30, 395))
            .await
            .unwrap();
        assert_eq!(pending.status, LeaseStatus::Draft);

        // The unit is re-let to someone else in the meantime.
        let other_tenant = Tenant::new("Karim Aziz".into(), None, None).unwrap();
        let other_id = other_tenant.id;
        f.store.seed_tenant(other_tenant).await;
        let current = f
            .service
            .assign_tenant(&f.manager, f.unit_id, other_id, draft_from(0, 365))
            .await
            .unwrap();
        assert_eq!(current.status, LeaseStatus::Active);

        let result = f.service.activate_lease(&f.manager, pending.id).await;
        assert!(matches!(result, Err(DomainError::UnitOccupied { unit_id }) if unit_id == f.unit_id));

        // The draft is untouched and can still be terminated or re-tried.
        let unchanged = f.store.lease_by_id(&pending.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, LeaseStatus::Draft);
    }

    #[tokio::test]
    async fn test_try_activate_due_draft_on_occupied_unit() {
        let f = fixture().await;
        f.service
            .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(0, 365))
            .await
            .unwrap();

        // A due draft for the same unit, seeded as if created before the
        // unit was taken.
        let other_tenant = Tenant::new("Karim Aziz".into(), None, None).unwrap();
        let other_id = other_tenant.id;
        f.store.seed_tenant(other_tenant).await;
        let due = Lease::new(f.unit_id, other_id, &draft_from(-1, 200), None).unwrap();
        let due_id = due.id;
        f.store.seed_lease(due).await;

        let result = f.service.try_activate(due_id).await;
        assert!(matches!(result, Err(DomainError::UnitOccupied { unit_id }) if unit_id == f.unit_id));

        // The sweep reports the same draft as failed instead of activating it.
        let report = f.service.run_expiry_sweep().await.unwrap();
        assert_eq!(report.activated, 0);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_concurrent_assignments_one_winner() {
        let f = fixture().await;
        let other_tenant = Tenant::new("Karim Aziz".into(), None, None).unwrap();
        let other_id = other_tenant.id;
        f.store.seed_tenant(other_tenant).await;

        let (a, b) = tokio::join!(
            f.service
                .assign_tenant(&f.manager, f.unit_id, f.tenant_id, draft_from(0, 365)),
            f.service
                .assign_tenant(&f.manager, f.unit_id, other_id, draft_from(0, 365)),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = if a.is_err() { a } else { b };
        assert!(matches!(failure, Err(DomainError::UnitOccupied { .. })));

        let history = f.service.lease_history(&f.manager, f.unit_id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_expiry_sweep_activates_and_completes() {
        let f = fixture().await;
        // Expired active lease on the seeded unit.
        let mut expired = Lease::new(f.unit_id, f.tenant_id, &draft_from(-365, -1), None).unwrap();
        expired.activate(None).unwrap();
        let expired_id = expired.id;
        f.store.seed_lease(expired).await;

        // Due draft lease on a second unit.
        let property = Property::new("Marina Towers".into(), "12 Corniche Rd".into(), None).unwrap();
        let unit = Unit::new(property.id, "B-202".into(), None).unwrap();
        let due = Lease::new(unit.id, f.tenant_id, &draft_from(-1, 200), None).unwrap();
        let due_id = due.id;
        f.store.seed_property(property).await;
        f.store.seed_unit(unit).await;
        f.store.seed_lease(due).await;

        let report = f.service.run_expiry_sweep().await.unwrap();
        assert_eq!(report, SweepReport { activated: 1, completed: 1, failed: 0 });

        let completed = f.store.lease_by_id(&expired_id).await.unwrap().unwrap();
        assert_eq!(completed.status, LeaseStatus::Completed);
        let activated = f.store.lease_by_id(&due_id).await.unwrap().unwrap();
        assert_eq!(activated.status, LeaseStatus::Active);

        // Running again finds nothing left to do.
        let again = f.service.run_expiry_sweep().await.unwrap();
        assert_eq!(again, SweepReport::default());
    }

    #[tokio::test]
    async fn test_scoped_role_cannot_read_foreign_unit_history() {
        let f = fixture().await;
        let accountant = Actor::with_scopes(Uuid::new_v4(), Role::Accountant, vec![Uuid::new_v4()]);
        let result = f.service.lease_history(&accountant, f.unit_id).await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
    }
}
