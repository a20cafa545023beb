//! Leave Request Lifecycle Engine
//!
//! This crate routes paid-leave requests through a role-based approval chain
//! while keeping an authoritative ledger of days earned, consumed and
//! outstanding per accrual period. It also converts date ranges into
//! chargeable days under the weekend-adjacency rule and issues single-use
//! approval links for email-driven decisions.

#![warn(missing_docs)]

pub mod api;
pub mod approvals;
pub mod calculation;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod tokens;
pub mod workflow;
