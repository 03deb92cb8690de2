//! Database adapters

pub mod connection;
pub mod postgres;
