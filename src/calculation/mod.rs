//! Calculation logic for the Leave Engine.
//!
//! This module converts a requested date range into the number of days
//! charged against a period, including the weekend-adjacency rule.

mod day_range;

pub use day_range::{DayCount, DayType, chargeable_days, get_day_type, working_end};
