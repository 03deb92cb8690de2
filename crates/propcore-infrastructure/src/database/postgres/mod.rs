//! PostgreSQL store adapter

mod rows;
mod tenancy_store_impl;

pub use tenancy_store_impl::PgTenancyStore;

use propcore_core::error::DomainError;
use tracing::error;

/// Whether a unique violation comes from the partial index backing the
/// one-active-lease-per-unit invariant.
pub(crate) fn active_lease_conflict(code: Option<&str>, message: &str) -> bool {
    code == Some("23505") && message.contains("leases_one_active_per_unit")
}

pub(crate) fn is_active_lease_conflict(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => active_lease_conflict(db.code().as_deref(), db.message()),
        _ => false,
    }
}

/// Maps driver errors onto the core taxonomy. Pool and statement timeouts
/// are transient (the caller may retry). The active-lease index conflict is
/// intercepted by the lease write paths and surfaced as `UnitOccupied`;
/// reaching it here means some other write path raced the invariant.
pub(crate) fn map_db_err(e: sqlx::Error) -> DomainError {
    if is_active_lease_conflict(&e) {
        return DomainError::InvariantViolation("unit would hold two active leases".into());
    }
    match &e {
        sqlx::Error::PoolTimedOut => DomainError::Transient("connection pool timed out".into()),
        sqlx::Error::Io(_) => DomainError::Transient(e.to_string()),
        sqlx::Error::Database(db) => {
            // 57014: statement_timeout cancelled the query.
            if db.code().as_deref() == Some("57014") {
                return DomainError::Transient("statement timed out".into());
            }
            DomainError::DatabaseError(db.message().to_string())
        }
        _ => {
            error!("database error: {}", e);
            DomainError::DatabaseError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_lease_conflict_detection() {
        assert!(active_lease_conflict(
            Some("23505"),
            "duplicate key value violates unique constraint \"leases_one_active_per_unit\""
        ));
        assert!(!active_lease_conflict(
            Some("23505"),
            "duplicate key value violates unique constraint \"employees_email_key\""
        ));
        assert!(!active_lease_conflict(Some("23503"), "violates foreign key constraint"));
        assert!(!active_lease_conflict(None, "leases_one_active_per_unit"));
    }
}
