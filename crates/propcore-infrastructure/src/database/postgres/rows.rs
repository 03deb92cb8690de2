// ============================================================================
// Propcore Infrastructure - Row Types
// File: crates/propcore-infrastructure/src/database/postgres/rows.rs
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use propcore_core::domain::{
    ActivityEvent, Employee, ExpenseRequest, ExpenseStatus, Lease, LeaseStatus, Property,
    ReceiptRef, Tenant, Unit,
};
use propcore_core::error::DomainError;
use propcore_policy::Role;
use propcore_shared::AuditFields;

fn audit_from(
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    modified_by: Option<Uuid>,
    removed_at: Option<DateTime<Utc>>,
    removed_by: Option<Uuid>,
) -> AuditFields {
    AuditFields { created_at, created_by, modified_at, modified_by, removed_at, removed_by }
}

#[derive(Debug, FromRow)]
pub(crate) struct PropertyRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            name: row.name,
            address: row.address,
            description: row.description,
            is_active: row.is_active,
            audit: audit_from(
                row.created_at,
                row.created_by,
                row.modified_at,
                row.modified_by,
                row.removed_at,
                row.removed_by,
            ),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UnitRow {
    pub id: Uuid,
    pub property_id: Uuid,
    pub label: String,
    pub floor: Option<i32>,
    pub bedrooms: Option<i32>,
    pub is_occupied: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        Unit {
            id: row.id,
            property_id: row.property_id,
            label: row.label,
            floor: row.floor,
            bedrooms: row.bedrooms,
            is_occupied: row.is_occupied,
            audit: audit_from(
                row.created_at,
                row.created_by,
                row.modified_at,
                row.modified_by,
                row.removed_at,
                row.removed_by,
            ),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TenantRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            national_id: row.national_id,
            is_active: row.is_active,
            audit: audit_from(
                row.created_at,
                row.created_by,
                row.modified_at,
                row.modified_by,
                row.removed_at,
                row.removed_by,
            ),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EmployeeRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub property_scopes: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = DomainError;

    fn try_from(row: EmployeeRow) -> Result<Self, DomainError> {
        let role = Role::from_str(&row.role).ok_or_else(|| {
            DomainError::InvariantViolation(format!("unknown role in storage: {}", row.role))
        })?;
        Ok(Employee {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            role,
            property_scopes: row.property_scopes,
            is_active: row.is_active,
            audit: audit_from(
                row.created_at,
                row.created_by,
                row.modified_at,
                row.modified_by,
                row.removed_at,
                row.removed_by,
            ),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct LeaseRow {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub termination_reason: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl TryFrom<LeaseRow> for Lease {
    type Error = DomainError;

    fn try_from(row: LeaseRow) -> Result<Self, DomainError> {
        let status = LeaseStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::InvariantViolation(format!("unknown lease status in storage: {}", row.status))
        })?;
        Ok(Lease {
            id: row.id,
            unit_id: row.unit_id,
            tenant_id: row.tenant_id,
            start_date: row.start_date,
            end_date: row.end_date,
            monthly_rent: row.monthly_rent,
            status,
            notes: row.notes,
            termination_reason: row.termination_reason,
            activated_at: row.activated_at,
            closed_at: row.closed_at,
            audit: audit_from(
                row.created_at,
                row.created_by,
                row.modified_at,
                row.modified_by,
                row.removed_at,
                row.removed_by,
            ),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ExpenseRow {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub property_id: Option<Uuid>,
    pub description: String,
    pub amount_without_tax: Decimal,
    pub tax_rate: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub approver_id: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub receipts: Value,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl TryFrom<ExpenseRow> for ExpenseRequest {
    type Error = DomainError;

    fn try_from(row: ExpenseRow) -> Result<Self, DomainError> {
        let status = ExpenseStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::InvariantViolation(format!(
                "unknown expense status in storage: {}",
                row.status
            ))
        })?;
        let receipts: Vec<ReceiptRef> = serde_json::from_value(row.receipts)
            .map_err(|e| DomainError::DatabaseError(format!("malformed receipts column: {e}")))?;
        Ok(ExpenseRequest {
            id: row.id,
            requester_id: row.requester_id,
            property_id: row.property_id,
            description: row.description,
            amount_without_tax: row.amount_without_tax,
            tax_rate: row.tax_rate,
            total_amount: row.total_amount,
            status,
            approver_id: row.approver_id,
            decided_at: row.decided_at,
            paid_at: row.paid_at,
            receipts,
            audit: audit_from(
                row.created_at,
                row.created_by,
                row.modified_at,
                row.modified_by,
                row.removed_at,
                row.removed_by,
            ),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub before_state: Option<Value>,
    pub after_state: Option<Value>,
    pub recorded_at: DateTime<Utc>,
}

impl From<EventRow> for ActivityEvent {
    fn from(row: EventRow) -> Self {
        ActivityEvent {
            id: row.id,
            actor_id: row.actor_id,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            before_state: row.before_state,
            after_state: row.after_state,
            recorded_at: row.recorded_at,
        }
    }
}
