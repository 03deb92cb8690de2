// ============================================================================
// Propcore Core - Lease Entity & Lifecycle State Machine
// File: crates/propcore-core/src/domain/lease.rs
// Description: Draft -> Active -> Completed/Terminated with guarded moves
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use propcore_shared::{AuditFields, EntityId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// Lease lifecycle status. Completed and Terminated are terminal; a lease
/// in a terminal state is immutable history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaseStatus {
    Draft,
    Active,
    Completed,
    Terminated,
}

impl LeaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Draft => "draft",
            LeaseStatus::Active => "active",
            LeaseStatus::Completed => "completed",
            LeaseStatus::Terminated => "terminated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(LeaseStatus::Draft),
            "active" => Some(LeaseStatus::Active),
            "completed" => Some(LeaseStatus::Completed),
            "terminated" => Some(LeaseStatus::Terminated),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaseStatus::Completed | LeaseStatus::Terminated)
    }
}

/// Inbound lease details supplied at assignment time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LeaseDraft {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Binds one unit to one tenant for a date range at a monthly rent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub id: EntityId,
    pub unit_id: EntityId,
    pub tenant_id: EntityId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub status: LeaseStatus,
    pub notes: Option<String>,
    pub termination_reason: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Lease {
    pub fn new(
        unit_id: EntityId,
        tenant_id: EntityId,
        draft: &LeaseDraft,
        created_by: Option<Uuid>,
    ) -> Result<Self, DomainError> {
        super::check_valid(draft)?;
        if draft.start_date >= draft.end_date {
            return Err(DomainError::InvalidDateRange {
                start: draft.start_date,
                end: draft.end_date,
            });
        }
        if draft.monthly_rent < Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "monthly rent must not be negative, got {}",
                draft.monthly_rent
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            unit_id,
            tenant_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            monthly_rent: draft.monthly_rent,
            status: LeaseStatus::Draft,
            notes: draft.notes.clone(),
            termination_reason: None,
            activated_at: None,
            closed_at: None,
            audit: AuditFields::new(created_by),
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// An active lease whose end date has passed no longer occupies the unit.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }

    /// The date guard for Draft -> Active without an administrative override.
    pub fn can_start(&self, today: NaiveDate) -> bool {
        self.start_date <= today
    }

    /// Draft -> Active. Date and capability guards sit with the caller;
    /// this enforces the structural state machine only.
    pub fn activate(&mut self, activated_by: Option<Uuid>) -> Result<(), DomainError> {
        if self.status != LeaseStatus::Draft {
            return Err(self.transition_err(LeaseStatus::Active));
        }
        self.status = LeaseStatus::Active;
        self.activated_at = Some(Utc::now());
        if let Some(by) = activated_by {
            self.audit.touch(by);
        }
        Ok(())
    }

    /// Active -> Completed. A lease must have been activated before it can
    /// complete, so Draft -> Completed is structurally impossible here.
    pub fn complete(&mut self, completed_by: Option<Uuid>) -> Result<(), DomainError> {
        if self.status != LeaseStatus::Active {
            return Err(self.transition_err(LeaseStatus::Completed));
        }
        self.status = LeaseStatus::Completed;
        self.closed_at = Some(Utc::now());
        if let Some(by) = completed_by {
            self.audit.touch(by);
        }
        Ok(())
    }

    /// Draft/Active -> Terminated, recording the reason. Draft termination
    /// models cancellation before start.
    pub fn terminate(&mut self, reason: &str, terminated_by: Uuid) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(self.transition_err(LeaseStatus::Terminated));
        }
        self.status = LeaseStatus::Terminated;
        self.termination_reason = Some(reason.to_string());
        self.closed_at = Some(Utc::now());
        self.audit.touch(terminated_by);
        Ok(())
    }

    fn transition_err(&self, to: LeaseStatus) -> DomainError {
        DomainError::InvalidTransition {
            entity: "lease",
            id: self.id,
            from: self.status.as_str(),
            to: to.as_str(),
        }
    }
}
