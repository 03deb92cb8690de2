//! # Propcore Policy
//!
//! Capability policy engine: one centralized table mapping
//! (role, capability) to an allow/deny decision. Pure and total;
//! every mutating operation in the core consults it first.

pub mod actor;
pub mod capability;
pub mod engine;
pub mod role;

pub use actor::Actor;
pub use capability::{tokens, Action, Capability, Resource};
pub use engine::{Decision, PolicyEngine};
pub use role::Role;
