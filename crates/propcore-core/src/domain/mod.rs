//! # Propcore Core - Domain Module
//!
//! Domain entities for the property-management back office.

pub mod activity_event;
pub mod employee;
pub mod expense;
pub mod lease;
pub mod property;
pub mod tenant;
pub mod unit;

pub use activity_event::{actions, entities, ActivityEvent, EventFilter};
pub use employee::Employee;
pub use expense::{
    ApprovalDecision, ExpenseDraft, ExpenseRequest, ExpenseStatus, ReceiptKind, ReceiptRef,
};
pub use lease::{Lease, LeaseDraft, LeaseStatus};
pub use property::Property;
pub use tenant::Tenant;
pub use unit::Unit;

use crate::error::DomainError;
use validator::Validate;

pub(crate) fn check_valid<T: Validate>(value: &T) -> Result<(), DomainError> {
    value
        .validate()
        .map_err(|e| DomainError::ValidationError(e.to_string()))
}
