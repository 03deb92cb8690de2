//! # Propcore Infrastructure
//!
//! PostgreSQL adapters for the core's store ports.

pub mod database;

pub use database::connection::create_pool;
pub use database::postgres::PgTenancyStore;
