//! Audit log query port

use async_trait::async_trait;

use crate::domain::{ActivityEvent, EventFilter};
use crate::error::DomainError;

/// Read side of the audit log. Events come back ordered by timestamp
/// ascending; every call produces a fresh, restartable window bounded by
/// the filter's limit. Writes happen only through `TenancyTx::record_event`.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn events(&self, filter: &EventFilter) -> Result<Vec<ActivityEvent>, DomainError>;
}
