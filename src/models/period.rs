//! Accrual period model.
//!
//! A [`Period`] is only ever mutated through the ledger. Its fields are
//! private so request code can read balances but cannot write them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{EmployeeId, PeriodId};

/// Adds two day amounts, failing instead of overflowing.
pub(crate) fn add_days(total: Decimal, days: Decimal) -> EngineResult<Decimal> {
    total.checked_add(days).ok_or_else(|| {
        EngineError::validation("days", format!("{} + {} overflows the balance", total, days))
    })
}

/// Lifecycle state of a period's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodState {
    /// Nothing consumed yet (or nothing left to compare against).
    Pending,
    /// Some, but not all, earned days consumed.
    Partial,
    /// No days outstanding.
    Exhausted,
}

impl std::fmt::Display for PeriodState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodState::Pending => write!(f, "pending"),
            PeriodState::Partial => write!(f, "partial"),
            PeriodState::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// An employee's leave-accrual window and its balance.
///
/// `consumed + outstanding == earned` holds after every mutation because
/// `outstanding` is only ever written by [`Period::rebalance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    id: PeriodId,
    employee_id: EmployeeId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    earned: Decimal,
    consumed: Decimal,
    outstanding: Decimal,
    state: PeriodState,
}

impl Period {
    pub(crate) fn new(
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        earned: Decimal,
    ) -> Self {
        let mut period = Self {
            id: PeriodId::new(),
            employee_id,
            start_date,
            end_date,
            earned,
            consumed: Decimal::ZERO,
            outstanding: earned,
            state: PeriodState::Pending,
        };
        period.rebalance();
        period
    }

    /// The period identifier.
    pub fn id(&self) -> PeriodId {
        self.id
    }

    /// The owning employee.
    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// First day of the accrual window (inclusive).
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Last day of the accrual window (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Days credited to this period.
    pub fn earned(&self) -> Decimal {
        self.earned
    }

    /// Days debited by approved requests.
    pub fn consumed(&self) -> Decimal {
        self.consumed
    }

    /// Days still available.
    pub fn outstanding(&self) -> Decimal {
        self.outstanding
    }

    /// Current balance state.
    pub fn state(&self) -> PeriodState {
        self.state
    }

    /// Adds to `earned`. On overflow the period is left unchanged.
    pub(crate) fn add_earned(&mut self, days: Decimal) -> EngineResult<()> {
        self.earned = add_days(self.earned, days)?;
        self.rebalance();
        Ok(())
    }

    pub(crate) fn add_consumed(&mut self, days: Decimal) -> EngineResult<()> {
        self.consumed = add_days(self.consumed, days)?;
        self.rebalance();
        Ok(())
    }

    /// Subtracts consumed days, floored at zero.
    pub(crate) fn sub_consumed(&mut self, days: Decimal) {
        self.consumed = (self.consumed - days).max(Decimal::ZERO);
        self.rebalance();
    }

    fn rebalance(&mut self) {
        self.outstanding = self.earned - self.consumed;
        self.state = if self.outstanding <= Decimal::ZERO {
            PeriodState::Exhausted
        } else if self.consumed > Decimal::ZERO && self.consumed < self.earned {
            PeriodState::Partial
        } else {
            PeriodState::Pending
        };
    }
}

/// Aggregated balance over all of an employee's periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Sum of earned days.
    pub earned: Decimal,
    /// Sum of consumed days.
    pub consumed: Decimal,
    /// Sum of outstanding days.
    pub outstanding: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_period(earned: i64) -> Period {
        Period::new(
            EmployeeId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            Decimal::new(earned, 0),
        )
    }

    fn assert_balanced(period: &Period) {
        assert_eq!(period.consumed() + period.outstanding(), period.earned());
    }

    #[test]
    fn test_new_period_is_pending_with_full_balance() {
        let period = make_period(15);
        assert_eq!(period.outstanding(), Decimal::new(15, 0));
        assert_eq!(period.state(), PeriodState::Pending);
        assert_balanced(&period);
    }

    #[test]
    fn test_partial_consumption_marks_partial() {
        let mut period = make_period(15);
        period.add_consumed(Decimal::new(4, 0)).unwrap();
        assert_eq!(period.state(), PeriodState::Partial);
        assert_eq!(period.outstanding(), Decimal::new(11, 0));
        assert_balanced(&period);
    }

    #[test]
    fn test_full_consumption_marks_exhausted() {
        let mut period = make_period(5);
        period.add_consumed(Decimal::new(5, 0)).unwrap();
        assert_eq!(period.state(), PeriodState::Exhausted);
        assert_balanced(&period);
    }

    #[test]
    fn test_sub_consumed_floors_at_zero() {
        let mut period = make_period(10);
        period.add_consumed(Decimal::new(2, 0)).unwrap();
        period.sub_consumed(Decimal::new(7, 0));
        assert_eq!(period.consumed(), Decimal::ZERO);
        assert_eq!(period.state(), PeriodState::Pending);
        assert_balanced(&period);
    }

    #[test]
    fn test_fractional_accrual() {
        let mut period = make_period(0);
        period.add_earned(Decimal::new(125, 2)).unwrap();
        assert_eq!(period.outstanding(), Decimal::new(125, 2));
        assert_eq!(period.state(), PeriodState::Pending);
    }

    #[test]
    fn test_overflowing_credit_leaves_period_unchanged() {
        let mut period = make_period(0);
        period.add_earned(Decimal::MAX).unwrap();
        let err = period.add_earned(Decimal::ONE).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(period.earned(), Decimal::MAX);
        assert_balanced(&period);
    }

    #[test]
    fn test_zero_earned_is_exhausted() {
        assert_eq!(make_period(0).state(), PeriodState::Exhausted);
    }
}
