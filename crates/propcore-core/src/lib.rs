//! # Propcore Core
//!
//! Domain entities, services, and store ports for the property-management
//! back office: tenancy lifecycle, expense approval, and audit history.

pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;
pub mod store;

pub use domain::*;
pub use error::DomainError;
