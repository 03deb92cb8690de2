//! Store ports (traits the durable store adapter implements)

pub mod audit_log;
pub mod tenancy_store;

pub use audit_log::AuditLog;
pub use tenancy_store::{TenancyStore, TenancyTx};

#[cfg(test)]
pub use tenancy_store::MockTenancyStore;
