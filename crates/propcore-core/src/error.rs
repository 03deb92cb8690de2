//! Domain errors

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Actor {actor_id} is not authorized for {capability}")]
    Unauthorized { actor_id: Uuid, capability: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid transition for {entity} {id}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        id: Uuid,
        from: &'static str,
        to: &'static str,
    },

    #[error("Unit {unit_id} already has an active lease")]
    UnitOccupied { unit_id: Uuid },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date range: start {start} must be before end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Approver {approver_id} submitted request {request_id} themselves")]
    ConflictOfInterest { request_id: Uuid, approver_id: Uuid },

    #[error("Transient store failure: {0}")]
    Transient(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl DomainError {
    /// Whether the caller may safely retry the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Transient(_))
    }
}
