//! Leave request model and its lifecycle states.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EmployeeId, PeriodId, RequestId};

/// Lifecycle state of a leave request.
///
/// `Approved`, `Rejected` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Being prepared by the employee ("borrador").
    Draft,
    /// Waiting for the line manager ("pendiente_jefe").
    PendingManager,
    /// Waiting for the accountant ("pendiente_contadora").
    PendingAccountant,
    /// Approved; the period has been debited.
    Approved,
    /// Rejected by an approver.
    Rejected,
    /// Withdrawn by the owner or an administrator.
    Cancelled,
}

impl RequestState {
    /// Returns true if no transition leaves this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Approved | RequestState::Rejected | RequestState::Cancelled
        )
    }

    /// Returns true while the request is waiting on an approver.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            RequestState::PendingManager | RequestState::PendingAccountant
        )
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestState::Draft => write!(f, "draft"),
            RequestState::PendingManager => write!(f, "pending_manager"),
            RequestState::PendingAccountant => write!(f, "pending_accountant"),
            RequestState::Approved => write!(f, "approved"),
            RequestState::Rejected => write!(f, "rejected"),
            RequestState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An employee's ask to consume days from one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: RequestId,
    /// The requesting employee.
    pub employee_id: EmployeeId,
    /// The period the days are charged to.
    pub period_id: PeriodId,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Days charged to the period on approval.
    pub chargeable_days: u32,
    /// Free-text notes from the employee.
    #[serde(default)]
    pub notes: String,
    /// Current lifecycle state.
    pub state: RequestState,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When the request last changed state or content.
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// The chargeable days as a ledger amount.
    pub fn days(&self) -> Decimal {
        Decimal::from(self.chargeable_days)
    }

    /// Returns true if the two inclusive date ranges share at least one day.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use leave_engine::models::LeaveRequest;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2025, 8, day).unwrap();
    /// assert!(LeaveRequest::ranges_overlap(d(11), d(15), d(15), d(18)));
    /// assert!(!LeaveRequest::ranges_overlap(d(11), d(14), d(15), d(18)));
    /// ```
    pub fn ranges_overlap(
        a_start: NaiveDate,
        a_end: NaiveDate,
        b_start: NaiveDate,
        b_end: NaiveDate,
    ) -> bool {
        a_start <= b_end && b_start <= a_end
    }

    /// Returns true if this request's range shares a day with the given range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        Self::ranges_overlap(self.start_date, self.end_date, start, end)
    }
}

/// Input for creating a draft request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLeaveRequest {
    /// The period to charge.
    pub period_id: PeriodId,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Client-supplied chargeable-day count; computed from the range when absent.
    #[serde(default)]
    pub days: Option<u32>,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
}

/// Changes to a draft. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisedLeaveRequest {
    /// New period to charge.
    pub period_id: Option<PeriodId>,
    /// New first day of leave.
    pub start_date: Option<NaiveDate>,
    /// New last day of leave.
    pub end_date: Option<NaiveDate>,
    /// New client-supplied day count. When the range changes and this is
    /// absent, the count is recomputed.
    pub days: Option<u32>,
    /// New notes.
    pub notes: Option<String>,
}
