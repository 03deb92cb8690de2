// ============================================================================
// Propcore Core - In-Memory Store
// File: crates/propcore-core/src/store/memory.rs
// Description: Transactional in-memory TenancyStore for tests and tooling
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{
    ActivityEvent, Employee, EventFilter, ExpenseRequest, Lease, LeaseStatus, Property, Tenant,
    Unit,
};
use crate::error::DomainError;
use crate::repositories::{AuditLog, TenancyStore, TenancyTx};

#[derive(Debug, Default, Clone)]
struct StoreState {
    properties: HashMap<Uuid, Property>,
    units: HashMap<Uuid, Unit>,
    tenants: HashMap<Uuid, Tenant>,
    employees: HashMap<Uuid, Employee>,
    leases: HashMap<Uuid, Lease>,
    expenses: HashMap<Uuid, ExpenseRequest>,
    events: Vec<ActivityEvent>,
}

/// In-memory store with real transactional semantics: a transaction holds
/// the state lock exclusively and mutates a working copy, so concurrent
/// transactions serialize exactly like row-locked database transactions and
/// an uncommitted handle rolls back by being dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_property(&self, property: Property) {
        self.state.lock().await.properties.insert(property.id, property);
    }

    pub async fn seed_unit(&self, unit: Unit) {
        self.state.lock().await.units.insert(unit.id, unit);
    }

    pub async fn seed_tenant(&self, tenant: Tenant) {
        self.state.lock().await.tenants.insert(tenant.id, tenant);
    }

    pub async fn seed_employee(&self, employee: Employee) {
        self.state.lock().await.employees.insert(employee.id, employee);
    }

    pub async fn seed_lease(&self, lease: Lease) {
        self.state.lock().await.leases.insert(lease.id, lease);
    }

    pub async fn event_count(&self) -> usize {
        self.state.lock().await.events.len()
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<StoreState>,
    work: StoreState,
}

impl InMemoryTx {
    fn active_lease(&self, unit_id: &Uuid) -> Option<&Lease> {
        self.work
            .leases
            .values()
            .find(|l| l.unit_id == *unit_id && l.status == LeaseStatus::Active)
    }

    /// Mirrors the storage-level partial unique index on active leases.
    fn check_occupancy_invariant(&self, lease: &Lease) -> Result<(), DomainError> {
        if lease.status == LeaseStatus::Active {
            if let Some(existing) = self.active_lease(&lease.unit_id) {
                if existing.id != lease.id {
                    return Err(DomainError::InvariantViolation(format!(
                        "unit {} would hold two active leases",
                        lease.unit_id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TenancyStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn TenancyTx>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(InMemoryTx { guard, work }))
    }

    async fn property_by_id(&self, id: &Uuid) -> Result<Option<Property>, DomainError> {
        Ok(self.state.lock().await.properties.get(id).cloned())
    }

    async fn unit_by_id(&self, id: &Uuid) -> Result<Option<Unit>, DomainError> {
        Ok(self.state.lock().await.units.get(id).cloned())
    }

    async fn tenant_by_id(&self, id: &Uuid) -> Result<Option<Tenant>, DomainError> {
        Ok(self.state.lock().await.tenants.get(id).cloned())
    }

    async fn employee_by_id(&self, id: &Uuid) -> Result<Option<Employee>, DomainError> {
        Ok(self.state.lock().await.employees.get(id).cloned())
    }

    async fn lease_by_id(&self, id: &Uuid) -> Result<Option<Lease>, DomainError> {
        Ok(self.state.lock().await.leases.get(id).cloned())
    }

    async fn expense_by_id(&self, id: &Uuid) -> Result<Option<ExpenseRequest>, DomainError> {
        Ok(self.state.lock().await.expenses.get(id).cloned())
    }

    async fn leases_for_unit(&self, unit_id: &Uuid) -> Result<Vec<Lease>, DomainError> {
        let state = self.state.lock().await;
        let mut leases: Vec<Lease> = state
            .leases
            .values()
            .filter(|l| l.unit_id == *unit_id)
            .cloned()
            .collect();
        leases.sort_by_key(|l| l.audit.created_at);
        Ok(leases)
    }

    async fn leases_due(&self, today: NaiveDate) -> Result<Vec<Uuid>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .leases
            .values()
            .filter(|l| match l.status {
                LeaseStatus::Draft => l.can_start(today),
                LeaseStatus::Active => l.is_expired(today),
                _ => false,
            })
            .map(|l| l.id)
            .collect())
    }
}

#[async_trait]
impl AuditLog for InMemoryStore {
    async fn events(&self, filter: &EventFilter) -> Result<Vec<ActivityEvent>, DomainError> {
        let state = self.state.lock().await;
        let mut events: Vec<ActivityEvent> = state
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.recorded_at);
        if let Some(limit) = filter.limit {
            events.truncate(limit as usize);
        }
        Ok(events)
    }
}

#[async_trait]
impl TenancyTx for InMemoryTx {
    async fn property_by_id(&mut self, id: &Uuid) -> Result<Option<Property>, DomainError> {
        Ok(self.work.properties.get(id).cloned())
    }

    async fn unit_by_id(&mut self, id: &Uuid) -> Result<Option<Unit>, DomainError> {
        Ok(self.work.units.get(id).cloned())
    }

    async fn tenant_by_id(&mut self, id: &Uuid) -> Result<Option<Tenant>, DomainError> {
        Ok(self.work.tenants.get(id).cloned())
    }

    async fn active_lease_for_unit(&mut self, unit_id: &Uuid) -> Result<Option<Lease>, DomainError> {
        Ok(self.active_lease(unit_id).cloned())
    }

    async fn lease_by_id(&mut self, id: &Uuid) -> Result<Option<Lease>, DomainError> {
        Ok(self.work.leases.get(id).cloned())
    }

    async fn insert_lease(&mut self, lease: &Lease) -> Result<(), DomainError> {
        self.check_occupancy_invariant(lease)?;
        self.work.leases.insert(lease.id, lease.clone());
        Ok(())
    }

    async fn update_lease(&mut self, lease: &Lease) -> Result<(), DomainError> {
        self.check_occupancy_invariant(lease)?;
        if self.work.leases.insert(lease.id, lease.clone()).is_none() {
            return Err(DomainError::NotFound { entity: "lease", id: lease.id });
        }
        Ok(())
    }

    async fn set_unit_occupancy(&mut self, unit_id: &Uuid, occupied: bool) -> Result<(), DomainError> {
        let unit = self
            .work
            .units
            .get_mut(unit_id)
            .ok_or(DomainError::NotFound { entity: "unit", id: *unit_id })?;
        unit.is_occupied = occupied;
        Ok(())
    }

    async fn expense_by_id(&mut self, id: &Uuid) -> Result<Option<ExpenseRequest>, DomainError> {
        Ok(self.work.expenses.get(id).cloned())
    }

    async fn insert_expense(&mut self, request: &ExpenseRequest) -> Result<(), DomainError> {
        self.work.expenses.insert(request.id, request.clone());
        Ok(())
    }

    async fn update_expense(&mut self, request: &ExpenseRequest) -> Result<(), DomainError> {
        if self.work.expenses.insert(request.id, request.clone()).is_none() {
            return Err(DomainError::NotFound { entity: "expense_request", id: request.id });
        }
        Ok(())
    }

    async fn employee_by_id(&mut self, id: &Uuid) -> Result<Option<Employee>, DomainError> {
        Ok(self.work.employees.get(id).cloned())
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), DomainError> {
        self.work.employees.insert(employee.id, employee.clone());
        Ok(())
    }

    async fn update_employee(&mut self, employee: &Employee) -> Result<(), DomainError> {
        if self.work.employees.insert(employee.id, employee.clone()).is_none() {
            return Err(DomainError::NotFound { entity: "employee", id: employee.id });
        }
        Ok(())
    }

    async fn insert_property(&mut self, property: &Property) -> Result<(), DomainError> {
        self.work.properties.insert(property.id, property.clone());
        Ok(())
    }

    async fn insert_unit(&mut self, unit: &Unit) -> Result<(), DomainError> {
        self.work.units.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn insert_tenant(&mut self, tenant: &Tenant) -> Result<(), DomainError> {
        self.work.tenants.insert(tenant.id, tenant.clone());
        Ok(())
    }

    async fn record_event(&mut self, event: &ActivityEvent) -> Result<(), DomainError> {
        self.work.events.push(event.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let mut this = *self;
        *this.guard = this.work;
        Ok(())
    }
}
