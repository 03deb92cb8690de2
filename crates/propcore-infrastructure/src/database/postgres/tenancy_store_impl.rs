// ============================================================================
// Propcore Infrastructure - PostgreSQL Tenancy Store
// File: crates/propcore-infrastructure/src/database/postgres/tenancy_store_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use propcore_core::domain::{
    ActivityEvent, Employee, EventFilter, ExpenseRequest, Lease, Property, Tenant, Unit,
};
use propcore_core::error::DomainError;
use propcore_core::repositories::{AuditLog, TenancyStore, TenancyTx};
use propcore_shared::constants::DEFAULT_EVENT_WINDOW;

use super::{is_active_lease_conflict, map_db_err};
use super::rows::{EmployeeRow, EventRow, ExpenseRow, LeaseRow, PropertyRow, TenantRow, UnitRow};

const PROPERTY_SELECT: &str = r#"
    SELECT id, name, address, description, is_active,
           created_at, created_by, modified_at, modified_by, removed_at, removed_by
    FROM properties"#;

const UNIT_SELECT: &str = r#"
    SELECT id, property_id, label, floor, bedrooms, is_occupied,
           created_at, created_by, modified_at, modified_by, removed_at, removed_by
    FROM units"#;

const TENANT_SELECT: &str = r#"
    SELECT id, full_name, email, phone, national_id, is_active,
           created_at, created_by, modified_at, modified_by, removed_at, removed_by
    FROM tenants"#;

const EMPLOYEE_SELECT: &str = r#"
    SELECT id, full_name, email, role, property_scopes, is_active,
           created_at, created_by, modified_at, modified_by, removed_at, removed_by
    FROM employees"#;

const LEASE_SELECT: &str = r#"
    SELECT id, unit_id, tenant_id, start_date, end_date, monthly_rent, status,
           notes, termination_reason, activated_at, closed_at,
           created_at, created_by, modified_at, modified_by, removed_at, removed_by
    FROM leases"#;

const EXPENSE_SELECT: &str = r#"
    SELECT id, requester_id, property_id, description, amount_without_tax, tax_rate,
           total_amount, status, approver_id, decided_at, paid_at, receipts,
           created_at, created_by, modified_at, modified_by, removed_at, removed_by
    FROM expense_requests"#;

async fn fetch_property<'e, E: PgExecutor<'e>>(ex: E, id: &Uuid) -> Result<Option<Property>, DomainError> {
    let sql = format!("{PROPERTY_SELECT} WHERE id = $1");
    let row: Option<PropertyRow> =
        sqlx::query_as(&sql).bind(id).fetch_optional(ex).await.map_err(map_db_err)?;
    Ok(row.map(Property::from))
}

async fn fetch_unit<'e, E: PgExecutor<'e>>(
    ex: E,
    id: &Uuid,
    lock: bool,
) -> Result<Option<Unit>, DomainError> {
    let sql = format!("{UNIT_SELECT} WHERE id = $1{}", if lock { " FOR UPDATE" } else { "" });
    let row: Option<UnitRow> =
        sqlx::query_as(&sql).bind(id).fetch_optional(ex).await.map_err(map_db_err)?;
    Ok(row.map(Unit::from))
}

async fn fetch_tenant<'e, E: PgExecutor<'e>>(ex: E, id: &Uuid) -> Result<Option<Tenant>, DomainError> {
    let sql = format!("{TENANT_SELECT} WHERE id = $1");
    let row: Option<TenantRow> =
        sqlx::query_as(&sql).bind(id).fetch_optional(ex).await.map_err(map_db_err)?;
    Ok(row.map(Tenant::from))
}

async fn fetch_employee<'e, E: PgExecutor<'e>>(ex: E, id: &Uuid) -> Result<Option<Employee>, DomainError> {
    let sql = format!("{EMPLOYEE_SELECT} WHERE id = $1");
    let row: Option<EmployeeRow> =
        sqlx::query_as(&sql).bind(id).fetch_optional(ex).await.map_err(map_db_err)?;
    row.map(Employee::try_from).transpose()
}

async fn fetch_lease<'e, E: PgExecutor<'e>>(
    ex: E,
    id: &Uuid,
    lock: bool,
) -> Result<Option<Lease>, DomainError> {
    let sql = format!("{LEASE_SELECT} WHERE id = $1{}", if lock { " FOR UPDATE" } else { "" });
    let row: Option<LeaseRow> =
        sqlx::query_as(&sql).bind(id).fetch_optional(ex).await.map_err(map_db_err)?;
    row.map(Lease::try_from).transpose()
}

async fn fetch_expense<'e, E: PgExecutor<'e>>(
    ex: E,
    id: &Uuid,
    lock: bool,
) -> Result<Option<ExpenseRequest>, DomainError> {
    let sql = format!("{EXPENSE_SELECT} WHERE id = $1{}", if lock { " FOR UPDATE" } else { "" });
    let row: Option<ExpenseRow> =
        sqlx::query_as(&sql).bind(id).fetch_optional(ex).await.map_err(map_db_err)?;
    row.map(ExpenseRequest::try_from).transpose()
}

/// PostgreSQL adapter for `TenancyStore` and `AuditLog`. Transactions map
/// onto database transactions; decision-feeding reads lock their rows with
/// `SELECT ... FOR UPDATE` so concurrent assignments serialize on the unit.
pub struct PgTenancyStore {
    pool: PgPool,
}

impl PgTenancyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        info!("migrations applied");
        Ok(())
    }
}

#[async_trait]
impl TenancyStore for PgTenancyStore {
    async fn begin(&self) -> Result<Box<dyn TenancyTx>, DomainError> {
        let tx = self.pool.begin().await.map_err(map_db_err)?;
        Ok(Box::new(PgTenancyTx { tx }))
    }

    async fn property_by_id(&self, id: &Uuid) -> Result<Option<Property>, DomainError> {
        fetch_property(&self.pool, id).await
    }

    async fn unit_by_id(&self, id: &Uuid) -> Result<Option<Unit>, DomainError> {
        fetch_unit(&self.pool, id, false).await
    }

    async fn tenant_by_id(&self, id: &Uuid) -> Result<Option<Tenant>, DomainError> {
        fetch_tenant(&self.pool, id).await
    }

    async fn employee_by_id(&self, id: &Uuid) -> Result<Option<Employee>, DomainError> {
        fetch_employee(&self.pool, id).await
    }

    async fn lease_by_id(&self, id: &Uuid) -> Result<Option<Lease>, DomainError> {
        fetch_lease(&self.pool, id, false).await
    }

    async fn expense_by_id(&self, id: &Uuid) -> Result<Option<ExpenseRequest>, DomainError> {
        fetch_expense(&self.pool, id, false).await
    }

    async fn leases_for_unit(&self, unit_id: &Uuid) -> Result<Vec<Lease>, DomainError> {
        let sql = format!("{LEASE_SELECT} WHERE unit_id = $1 ORDER BY created_at ASC");
        let rows: Vec<LeaseRow> = sqlx::query_as(&sql)
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.into_iter().map(Lease::try_from).collect()
    }

    async fn leases_due(&self, today: NaiveDate) -> Result<Vec<Uuid>, DomainError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM leases
            WHERE (status = 'draft' AND start_date <= $1)
               OR (status = 'active' AND end_date < $1)
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl AuditLog for PgTenancyStore {
    async fn events(&self, filter: &EventFilter) -> Result<Vec<ActivityEvent>, DomainError> {
        let limit = filter.limit.unwrap_or(DEFAULT_EVENT_WINDOW);
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, actor_id, action, entity_type, entity_id,
                   before_state, after_state, recorded_at
            FROM activity_events
            WHERE ($1::text IS NULL OR entity_type = $1)
              AND ($2::uuid IS NULL OR entity_id = $2)
              AND ($3::uuid IS NULL OR actor_id = $3)
              AND ($4::text IS NULL OR action = $4)
              AND ($5::timestamptz IS NULL OR recorded_at > $5)
            ORDER BY recorded_at ASC
            LIMIT $6
            "#,
        )
        .bind(&filter.entity_type)
        .bind(filter.entity_id)
        .bind(filter.actor_id)
        .bind(&filter.action)
        .bind(filter.after)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(ActivityEvent::from).collect())
    }
}

struct PgTenancyTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TenancyTx for PgTenancyTx {
    async fn property_by_id(&mut self, id: &Uuid) -> Result<Option<Property>, DomainError> {
        fetch_property(&mut *self.tx, id).await
    }

    // Locks the unit row. A vacant unit has no active-lease row to lock, so
    // this is what serializes two assignments racing for the same unit.
    async fn unit_by_id(&mut self, id: &Uuid) -> Result<Option<Unit>, DomainError> {
        fetch_unit(&mut *self.tx, id, true).await
    }

    async fn tenant_by_id(&mut self, id: &Uuid) -> Result<Option<Tenant>, DomainError> {
        fetch_tenant(&mut *self.tx, id).await
    }

    async fn active_lease_for_unit(&mut self, unit_id: &Uuid) -> Result<Option<Lease>, DomainError> {
        let sql = format!("{LEASE_SELECT} WHERE unit_id = $1 AND status = 'active' FOR UPDATE");
        let row: Option<LeaseRow> = sqlx::query_as(&sql)
            .bind(unit_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        row.map(Lease::try_from).transpose()
    }

    async fn lease_by_id(&mut self, id: &Uuid) -> Result<Option<Lease>, DomainError> {
        fetch_lease(&mut *self.tx, id, true).await
    }

    async fn insert_lease(&mut self, lease: &Lease) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO leases (
                id, unit_id, tenant_id, start_date, end_date, monthly_rent, status,
                notes, termination_reason, activated_at, closed_at,
                created_at, created_by, modified_at, modified_by, removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(lease.id)
        .bind(lease.unit_id)
        .bind(lease.tenant_id)
        .bind(lease.start_date)
        .bind(lease.end_date)
        .bind(lease.monthly_rent)
        .bind(lease.status.as_str())
        .bind(&lease.notes)
        .bind(&lease.termination_reason)
        .bind(lease.activated_at)
        .bind(lease.closed_at)
        .bind(lease.audit.created_at)
        .bind(lease.audit.created_by)
        .bind(lease.audit.modified_at)
        .bind(lease.audit.modified_by)
        .bind(lease.audit.removed_at)
        .bind(lease.audit.removed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            // Losing the unique-index race is an occupancy failure, not a
            // broken invariant.
            if is_active_lease_conflict(&e) {
                DomainError::UnitOccupied { unit_id: lease.unit_id }
            } else {
                map_db_err(e)
            }
        })?;
        Ok(())
    }

    async fn update_lease(&mut self, lease: &Lease) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE leases
            SET status = $2,
                notes = $3,
                termination_reason = $4,
                activated_at = $5,
                closed_at = $6,
                modified_at = $7,
                modified_by = $8
            WHERE id = $1
            "#,
        )
        .bind(lease.id)
        .bind(lease.status.as_str())
        .bind(&lease.notes)
        .bind(&lease.termination_reason)
        .bind(lease.activated_at)
        .bind(lease.closed_at)
        .bind(lease.audit.modified_at)
        .bind(lease.audit.modified_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_active_lease_conflict(&e) {
                DomainError::UnitOccupied { unit_id: lease.unit_id }
            } else {
                map_db_err(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound { entity: "lease", id: lease.id });
        }
        Ok(())
    }

    async fn set_unit_occupancy(&mut self, unit_id: &Uuid, occupied: bool) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE units SET is_occupied = $2 WHERE id = $1")
            .bind(unit_id)
            .bind(occupied)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound { entity: "unit", id: *unit_id });
        }
        Ok(())
    }

    async fn expense_by_id(&mut self, id: &Uuid) -> Result<Option<ExpenseRequest>, DomainError> {
        fetch_expense(&mut *self.tx, id, true).await
    }

    async fn insert_expense(&mut self, request: &ExpenseRequest) -> Result<(), DomainError> {
        let receipts = serde_json::to_value(&request.receipts)
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO expense_requests (
                id, requester_id, property_id, description, amount_without_tax, tax_rate,
                total_amount, status, approver_id, decided_at, paid_at, receipts,
                created_at, created_by, modified_at, modified_by, removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(request.id)
        .bind(request.requester_id)
        .bind(request.property_id)
        .bind(&request.description)
        .bind(request.amount_without_tax)
        .bind(request.tax_rate)
        .bind(request.total_amount)
        .bind(request.status.as_str())
        .bind(request.approver_id)
        .bind(request.decided_at)
        .bind(request.paid_at)
        .bind(receipts)
        .bind(request.audit.created_at)
        .bind(request.audit.created_by)
        .bind(request.audit.modified_at)
        .bind(request.audit.modified_by)
        .bind(request.audit.removed_at)
        .bind(request.audit.removed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn update_expense(&mut self, request: &ExpenseRequest) -> Result<(), DomainError> {
        let receipts = serde_json::to_value(&request.receipts)
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        let result = sqlx::query(
            r#"
            UPDATE expense_requests
            SET status = $2,
                approver_id = $3,
                decided_at = $4,
                paid_at = $5,
                receipts = $6,
                modified_at = $7,
                modified_by = $8
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(request.status.as_str())
        .bind(request.approver_id)
        .bind(request.decided_at)
        .bind(request.paid_at)
        .bind(receipts)
        .bind(request.audit.modified_at)
        .bind(request.audit.modified_by)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound { entity: "expense_request", id: request.id });
        }
        Ok(())
    }

    async fn employee_by_id(&mut self, id: &Uuid) -> Result<Option<Employee>, DomainError> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE id = $1 FOR UPDATE");
        let row: Option<EmployeeRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        row.map(Employee::try_from).transpose()
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO employees (
                id, full_name, email, role, property_scopes, is_active,
                created_at, created_by, modified_at, modified_by, removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(employee.id)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(employee.role.as_str())
        .bind(&employee.property_scopes)
        .bind(employee.is_active)
        .bind(employee.audit.created_at)
        .bind(employee.audit.created_by)
        .bind(employee.audit.modified_at)
        .bind(employee.audit.modified_by)
        .bind(employee.audit.removed_at)
        .bind(employee.audit.removed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn update_employee(&mut self, employee: &Employee) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET full_name = $2,
                email = $3,
                role = $4,
                property_scopes = $5,
                is_active = $6,
                modified_at = $7,
                modified_by = $8,
                removed_at = $9,
                removed_by = $10
            WHERE id = $1
            "#,
        )
        .bind(employee.id)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(employee.role.as_str())
        .bind(&employee.property_scopes)
        .bind(employee.is_active)
        .bind(employee.audit.modified_at)
        .bind(employee.audit.modified_by)
        .bind(employee.audit.removed_at)
        .bind(employee.audit.removed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound { entity: "employee", id: employee.id });
        }
        Ok(())
    }

    async fn insert_property(&mut self, property: &Property) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO properties (
                id, name, address, description, is_active,
                created_at, created_by, modified_at, modified_by, removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(property.id)
        .bind(&property.name)
        .bind(&property.address)
        .bind(&property.description)
        .bind(property.is_active)
        .bind(property.audit.created_at)
        .bind(property.audit.created_by)
        .bind(property.audit.modified_at)
        .bind(property.audit.modified_by)
        .bind(property.audit.removed_at)
        .bind(property.audit.removed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn insert_unit(&mut self, unit: &Unit) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO units (
                id, property_id, label, floor, bedrooms, is_occupied,
                created_at, created_by, modified_at, modified_by, removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(unit.id)
        .bind(unit.property_id)
        .bind(&unit.label)
        .bind(unit.floor)
        .bind(unit.bedrooms)
        .bind(unit.is_occupied)
        .bind(unit.audit.created_at)
        .bind(unit.audit.created_by)
        .bind(unit.audit.modified_at)
        .bind(unit.audit.modified_by)
        .bind(unit.audit.removed_at)
        .bind(unit.audit.removed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn insert_tenant(&mut self, tenant: &Tenant) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO tenants (
                id, full_name, email, phone, national_id, is_active,
                created_at, created_by, modified_at, modified_by, removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.full_name)
        .bind(&tenant.email)
        .bind(&tenant.phone)
        .bind(&tenant.national_id)
        .bind(tenant.is_active)
        .bind(tenant.audit.created_at)
        .bind(tenant.audit.created_by)
        .bind(tenant.audit.modified_at)
        .bind(tenant.audit.modified_by)
        .bind(tenant.audit.removed_at)
        .bind(tenant.audit.removed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn record_event(&mut self, event: &ActivityEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO activity_events (
                id, actor_id, action, entity_type, entity_id,
                before_state, after_state, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.actor_id)
        .bind(&event.action)
        .bind(&event.entity_type)
        .bind(event.entity_id)
        .bind(&event.before_state)
        .bind(&event.after_state)
        .bind(event.recorded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.commit().await.map_err(map_db_err)
    }
}
