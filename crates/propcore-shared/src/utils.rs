//! Utility functions

use chrono::{NaiveDate, Utc};

/// Calendar date all lifecycle guards compare against.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
