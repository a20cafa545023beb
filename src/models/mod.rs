//! Core data models for the Leave Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod approval;
mod employee;
mod ids;
mod period;
mod request;
mod token;

pub use approval::{Approval, ApprovalState, ApprovalType};
pub use employee::{ApprovalLevel, Employee, Role};
pub use ids::{ApprovalId, EmployeeId, PeriodId, RequestId, TokenId};
pub use period::{BalanceSnapshot, Period, PeriodState};
pub(crate) use period::add_days;
pub use request::{LeaveRequest, NewLeaveRequest, RequestState, RevisedLeaveRequest};
pub use token::{ApprovalToken, IssuedToken, TokenAction, TokenGrant, TokenStatus};
