//! Domain services (business logic)

pub mod audit_service;
pub mod employee_service;
pub mod expense_service;
pub mod registry_service;
pub mod tenancy_service;

pub use audit_service::AuditService;
pub use employee_service::EmployeeService;
pub use expense_service::ExpenseService;
pub use registry_service::RegistryService;
pub use tenancy_service::{SweepReport, TenancyService};

use propcore_policy::{Actor, Decision, PolicyEngine};
use tracing::warn;

use crate::error::DomainError;

/// Gate every mutating or scope-sensitive call. A denial short-circuits
/// before any store access; it leaves a security trace but no business
/// ActivityEvent.
pub(crate) fn authorize(
    policy: &PolicyEngine,
    actor: &Actor,
    capability: &str,
) -> Result<(), DomainError> {
    match policy.authorize(actor, capability) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            warn!(actor_id = %actor.id, capability, "authorization denied");
            Err(DomainError::Unauthorized {
                actor_id: actor.id,
                capability: capability.to_string(),
            })
        }
    }
}
