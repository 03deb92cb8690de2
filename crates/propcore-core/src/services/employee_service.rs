//! Employee directory service

use std::sync::Arc;

use propcore_policy::{tokens, Actor, PolicyEngine, Role};
use tracing::info;
use uuid::Uuid;

use crate::domain::activity_event::snapshot;
use crate::domain::{actions, entities, ActivityEvent, Employee};
use crate::error::DomainError;
use crate::repositories::TenancyStore;

/// Administers the employee directory. Employees are soft-disabled, never
/// deleted; every change is audited.
pub struct EmployeeService<S: TenancyStore> {
    store: Arc<S>,
    policy: PolicyEngine,
}

impl<S: TenancyStore> EmployeeService<S> {
    pub fn new(store: Arc<S>, policy: PolicyEngine) -> Self {
        Self { store, policy }
    }

    pub async fn create_employee(
        &self,
        actor: &Actor,
        full_name: String,
        email: String,
        role: Role,
    ) -> Result<Employee, DomainError> {
        super::authorize(&self.policy, actor, tokens::EMPLOYEES_MANAGE)?;

        let employee = Employee::new(full_name, email, role, Some(actor.id))?;

        let mut tx = self.store.begin().await?;
        tx.insert_employee(&employee).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::EMPLOYEE_CREATED,
            entities::EMPLOYEE,
            employee.id,
            None,
            Some(snapshot(&employee)?),
        ))
        .await?;
        tx.commit().await?;

        info!(employee_id = %employee.id, role = role.as_str(), "employee created");
        Ok(employee)
    }

    pub async fn change_role(
        &self,
        actor: &Actor,
        employee_id: Uuid,
        role: Role,
    ) -> Result<Employee, DomainError> {
        super::authorize(&self.policy, actor, tokens::EMPLOYEES_MANAGE)?;

        let mut tx = self.store.begin().await?;
        let mut employee = tx
            .employee_by_id(&employee_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "employee", id: employee_id })?;

        let before = snapshot(&employee)?;
        employee.change_role(role, actor.id);
        tx.update_employee(&employee).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::EMPLOYEE_ROLE_CHANGED,
            entities::EMPLOYEE,
            employee.id,
            Some(before),
            Some(snapshot(&employee)?),
        ))
        .await?;
        tx.commit().await?;

        info!(%employee_id, role = role.as_str(), "employee role changed");
        Ok(employee)
    }

    pub async fn set_property_scopes(
        &self,
        actor: &Actor,
        employee_id: Uuid,
        scopes: Vec<Uuid>,
    ) -> Result<Employee, DomainError> {
        super::authorize(&self.policy, actor, tokens::EMPLOYEES_MANAGE)?;

        let mut tx = self.store.begin().await?;
        let mut employee = tx
            .employee_by_id(&employee_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "employee", id: employee_id })?;

        employee.set_property_scopes(scopes, actor.id);
        tx.update_employee(&employee).await?;
        tx.commit().await?;
        Ok(employee)
    }

    pub async fn disable_employee(&self, actor: &Actor, employee_id: Uuid) -> Result<Employee, DomainError> {
        super::authorize(&self.policy, actor, tokens::EMPLOYEES_MANAGE)?;

        let mut tx = self.store.begin().await?;
        let mut employee = tx
            .employee_by_id(&employee_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "employee", id: employee_id })?;

        let before = snapshot(&employee)?;
        employee.disable(actor.id);
        tx.update_employee(&employee).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::EMPLOYEE_DISABLED,
            entities::EMPLOYEE,
            employee.id,
            Some(before),
            Some(snapshot(&employee)?),
        ))
        .await?;
        tx.commit().await?;

        info!(%employee_id, "employee disabled");
        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> (Arc<InMemoryStore>, EmployeeService<InMemoryStore>, Actor) {
        let store = Arc::new(InMemoryStore::new());
        let service = EmployeeService::new(store.clone(), PolicyEngine::new());
        let admin = Actor::new(Uuid::new_v4(), Role::Administrator);
        (store, service, admin)
    }

    #[tokio::test]
    async fn test_create_and_disable_keeps_record() {
        let (store, service, admin) = service();
        let employee = service
            .create_employee(&admin, "Omar Farouk".into(), "omar@example.com".into(), Role::Manager)
            .await
            .unwrap();

        let disabled = service.disable_employee(&admin, employee.id).await.unwrap();
        assert!(disabled.is_disabled());
        // Soft-disabled, never deleted.
        assert!(store.employee_by_id(&employee.id).await.unwrap().is_some());
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn test_only_employee_managers_may_create() {
        let (_, service, _) = service();
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);
        let result = service
            .create_employee(&manager, "Omar Farouk".into(), "omar@example.com".into(), Role::Viewer)
            .await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_role_change_recorded_with_before_state() {
        let (store, service, admin) = service();
        let employee = service
            .create_employee(&admin, "Omar Farouk".into(), "omar@example.com".into(), Role::Viewer)
            .await
            .unwrap();
        let updated = service.change_role(&admin, employee.id, Role::Accountant).await.unwrap();
        assert_eq!(updated.role, Role::Accountant);

        use crate::domain::EventFilter;
        use crate::repositories::AuditLog;
        let mut filter = EventFilter::for_entity(entities::EMPLOYEE, employee.id);
        filter.action = Some(actions::EMPLOYEE_ROLE_CHANGED.into());
        let events = store.events(&filter).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].before_state.is_some());
        assert!(events[0].after_state.is_some());
    }
}
