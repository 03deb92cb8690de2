//! Application-wide constants

pub const DEFAULT_EVENT_WINDOW: u32 = 500;
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5_000;
pub const CURRENCY_SCALE: u32 = 2;
