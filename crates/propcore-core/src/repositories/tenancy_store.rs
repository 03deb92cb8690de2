// ============================================================================
// Propcore Core - Tenancy Store Port
// File: crates/propcore-core/src/repositories/tenancy_store.rs
// Description: Transactional boundary to the durable entity store
// ============================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{ActivityEvent, Employee, ExpenseRequest, Lease, Property, Tenant, Unit};
use crate::error::DomainError;

/// Durable entity store. `begin` opens the single transaction every
/// mutating operation runs inside; the remaining methods are plain
/// committed reads for collaborators and preconditions that tolerate
/// staleness. Store timeouts surface as `DomainError::Transient` and are
/// retried by the caller, never in here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenancyStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn TenancyTx>, DomainError>;

    async fn property_by_id(&self, id: &Uuid) -> Result<Option<Property>, DomainError>;
    async fn unit_by_id(&self, id: &Uuid) -> Result<Option<Unit>, DomainError>;
    async fn tenant_by_id(&self, id: &Uuid) -> Result<Option<Tenant>, DomainError>;
    async fn employee_by_id(&self, id: &Uuid) -> Result<Option<Employee>, DomainError>;
    async fn lease_by_id(&self, id: &Uuid) -> Result<Option<Lease>, DomainError>;
    async fn expense_by_id(&self, id: &Uuid) -> Result<Option<ExpenseRequest>, DomainError>;

    /// All leases ever recorded against a unit, terminal ones included.
    /// Archival is non-destructive, so this is the unit's full history.
    async fn leases_for_unit(&self, unit_id: &Uuid) -> Result<Vec<Lease>, DomainError>;

    /// Leases the expiry/activation sweep should visit: drafts whose start
    /// date has arrived and actives whose end date has passed.
    async fn leases_due(&self, today: NaiveDate) -> Result<Vec<Uuid>, DomainError>;
}

/// Handle scoped to one open transaction. Reads that feed a decision take
/// row locks so concurrent transactions on the same rows serialize instead
/// of racing. Dropping the handle without `commit` rolls everything back,
/// the appended events included.
#[async_trait]
pub trait TenancyTx: Send {
    async fn property_by_id(&mut self, id: &Uuid) -> Result<Option<Property>, DomainError>;
    async fn unit_by_id(&mut self, id: &Uuid) -> Result<Option<Unit>, DomainError>;
    async fn tenant_by_id(&mut self, id: &Uuid) -> Result<Option<Tenant>, DomainError>;

    /// The unit's current active lease, locked for the duration of the
    /// transaction. This is the occupancy-invariant guard.
    async fn active_lease_for_unit(&mut self, unit_id: &Uuid) -> Result<Option<Lease>, DomainError>;

    async fn lease_by_id(&mut self, id: &Uuid) -> Result<Option<Lease>, DomainError>;
    async fn insert_lease(&mut self, lease: &Lease) -> Result<(), DomainError>;
    async fn update_lease(&mut self, lease: &Lease) -> Result<(), DomainError>;

    async fn set_unit_occupancy(&mut self, unit_id: &Uuid, occupied: bool) -> Result<(), DomainError>;

    async fn expense_by_id(&mut self, id: &Uuid) -> Result<Option<ExpenseRequest>, DomainError>;
    async fn insert_expense(&mut self, request: &ExpenseRequest) -> Result<(), DomainError>;
    async fn update_expense(&mut self, request: &ExpenseRequest) -> Result<(), DomainError>;

    async fn employee_by_id(&mut self, id: &Uuid) -> Result<Option<Employee>, DomainError>;
    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), DomainError>;
    async fn update_employee(&mut self, employee: &Employee) -> Result<(), DomainError>;

    async fn insert_property(&mut self, property: &Property) -> Result<(), DomainError>;
    async fn insert_unit(&mut self, unit: &Unit) -> Result<(), DomainError>;
    async fn insert_tenant(&mut self, tenant: &Tenant) -> Result<(), DomainError>;

    /// Appends the audit event inside this transaction, so the state change
    /// and its event commit or roll back together.
    async fn record_event(&mut self, event: &ActivityEvent) -> Result<(), DomainError>;

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}
