//! Configuration types for the leave engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every section has a
//! default so a partial `engine.yaml` is valid.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{ApprovalLevel, Employee, EmployeeId, Role};
use crate::tokens::MIN_ENTROPY_BYTES;

/// Longest accepted token lifetime, in hours.
pub const MAX_TTL_HOURS: i64 = 24 * 366;

/// Largest accepted token entropy, in bytes.
pub const MAX_ENTROPY_BYTES: usize = 512;

/// Approval token settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Lifetime of an issued token, in hours.
    pub ttl_hours: i64,
    /// Random bytes per token before encoding.
    pub entropy_bytes: usize,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            ttl_hours: 72,
            entropy_bytes: 32,
        }
    }
}

impl TokenSettings {
    /// The token lifetime as a duration, clamped to `1..=MAX_TTL_HOURS` hours.
    pub fn ttl(&self) -> Duration {
        Duration::hours(self.ttl_hours.clamp(1, MAX_TTL_HOURS))
    }

    /// Checks that both settings are within their accepted ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_TTL_HOURS).contains(&self.ttl_hours) {
            return Err(format!(
                "tokens.ttl_hours must be between 1 and {}, got {}",
                MAX_TTL_HOURS, self.ttl_hours
            ));
        }
        if !(MIN_ENTROPY_BYTES..=MAX_ENTROPY_BYTES).contains(&self.entropy_bytes) {
            return Err(format!(
                "tokens.entropy_bytes must be between {} and {}, got {}",
                MIN_ENTROPY_BYTES, MAX_ENTROPY_BYTES, self.entropy_bytes
            ));
        }
        Ok(())
    }
}

/// Request validation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    /// Accept a client-supplied chargeable-day count instead of computing it.
    pub allow_client_day_count: bool,
    /// Maximum length of request notes and decision comments, in characters.
    pub max_notes_len: usize,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            allow_client_day_count: true,
            max_notes_len: 1000,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Contents of `engine.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Approval token settings.
    pub tokens: TokenSettings,
    /// Request validation settings.
    pub requests: RequestSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
}

/// An employee entry in `seed.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEmployee {
    /// Stable identifier.
    pub id: EmployeeId,
    /// Display name.
    pub name: String,
    /// Notification address.
    pub email: String,
    /// Role.
    pub role: Role,
    /// Approval level; derived from the role when absent.
    #[serde(default)]
    pub approval_level: Option<ApprovalLevel>,
    /// Direct manager.
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
}

impl SeedEmployee {
    /// Builds the directory entry.
    pub fn to_employee(&self) -> Employee {
        let mut employee = Employee::new(self.name.clone(), self.email.clone(), self.role);
        employee.id = self.id;
        employee.manager_id = self.manager_id;
        if let Some(level) = self.approval_level {
            employee.approval_level = level;
        }
        employee
    }
}

/// A period entry in `seed.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPeriod {
    /// Owner of the period.
    pub employee_id: EmployeeId,
    /// First day of the accrual window.
    pub start_date: NaiveDate,
    /// Last day of the accrual window.
    pub end_date: NaiveDate,
    /// Days credited.
    pub earned: Decimal,
}

/// Contents of `seed.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Employees, listed managers first.
    pub employees: Vec<SeedEmployee>,
    /// Accrual periods.
    pub periods: Vec<SeedPeriod>,
}
