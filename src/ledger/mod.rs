//! Period ledger: the authoritative record of days earned and consumed.
//!
//! The ledger is a plain data structure. Serialisation of read-check-write
//! sequences is the caller's job: the engine holds it behind the same lock as
//! the requests and approvals it must stay consistent with.
//!
//! ## Invariants
//! - `consumed + outstanding == earned` for every period
//! - `consumed >= 0`
//! - A period with `consumed > 0` cannot be deleted

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{BalanceSnapshot, EmployeeId, Period, PeriodId, add_days};

/// Owns every accrual period.
#[derive(Debug, Default, Clone)]
pub struct PeriodLedger {
    periods: HashMap<PeriodId, Period>,
}

impl PeriodLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisions a new period for an employee.
    pub fn open(
        &mut self,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        earned: Decimal,
    ) -> EngineResult<PeriodId> {
        if start_date > end_date {
            return Err(EngineError::validation(
                "end_date",
                "period end must not precede its start",
            ));
        }
        if earned < Decimal::ZERO {
            return Err(EngineError::validation("earned", "must not be negative"));
        }
        let period = Period::new(employee_id, start_date, end_date, earned);
        let id = period.id();
        info!(period_id = %id, employee_id = %employee_id, earned = %earned, "Period opened");
        self.periods.insert(id, period);
        Ok(id)
    }

    /// Looks up a period.
    pub fn get(&self, period_id: PeriodId) -> EngineResult<&Period> {
        self.periods
            .get(&period_id)
            .ok_or_else(|| EngineError::not_found("period", period_id))
    }

    fn get_mut(&mut self, period_id: PeriodId) -> EngineResult<&mut Period> {
        self.periods
            .get_mut(&period_id)
            .ok_or_else(|| EngineError::not_found("period", period_id))
    }

    /// Increases `earned`. Used for provisioning and manual adjustments.
    /// A credit that would overflow the balance fails with `Validation`.
    pub fn credit(&mut self, period_id: PeriodId, days: Decimal) -> EngineResult<&Period> {
        if days <= Decimal::ZERO {
            return Err(EngineError::validation("days", "credit must be positive"));
        }
        let period = self.get_mut(period_id)?;
        period.add_earned(days)?;
        info!(period_id = %period_id, days = %days, earned = %period.earned(), "Period credited");
        Ok(period)
    }

    /// Fails with `InsufficientBalance` unless `days` fit in `outstanding`.
    pub fn ensure_available(&self, period_id: PeriodId, days: Decimal) -> EngineResult<()> {
        let period = self.get(period_id)?;
        if days > period.outstanding() {
            return Err(EngineError::InsufficientBalance {
                period_id: period_id.to_string(),
                requested: days,
                outstanding: period.outstanding(),
            });
        }
        Ok(())
    }

    /// Increases `consumed`; fails with `InsufficientBalance` if `days`
    /// exceeds `outstanding`, leaving the period untouched.
    pub fn debit(&mut self, period_id: PeriodId, days: Decimal) -> EngineResult<&Period> {
        if days < Decimal::ZERO {
            return Err(EngineError::validation("days", "debit must not be negative"));
        }
        self.ensure_available(period_id, days)?;
        let period = self.get_mut(period_id)?;
        period.add_consumed(days)?;
        info!(
            period_id = %period_id,
            days = %days,
            outstanding = %period.outstanding(),
            state = %period.state(),
            "Period debited"
        );
        Ok(period)
    }

    /// Decreases `consumed`, floored at zero.
    pub fn reverse(&mut self, period_id: PeriodId, days: Decimal) -> EngineResult<&Period> {
        if days < Decimal::ZERO {
            return Err(EngineError::validation("days", "reversal must not be negative"));
        }
        let period = self.get_mut(period_id)?;
        period.sub_consumed(days);
        info!(
            period_id = %period_id,
            days = %days,
            outstanding = %period.outstanding(),
            "Period debit reversed"
        );
        Ok(period)
    }

    /// Deletes a period that has never been charged.
    pub fn delete(&mut self, period_id: PeriodId) -> EngineResult<Period> {
        let period = self.get(period_id)?;
        if period.consumed() > Decimal::ZERO {
            return Err(EngineError::validation(
                "period",
                format!("period {} has consumed days and cannot be deleted", period_id),
            ));
        }
        info!(period_id = %period_id, "Period deleted");
        self.periods
            .remove(&period_id)
            .ok_or_else(|| EngineError::not_found("period", period_id))
    }

    /// Periods belonging to an employee, oldest first.
    pub fn periods_for(&self, employee_id: EmployeeId) -> Vec<&Period> {
        let mut periods: Vec<&Period> = self
            .periods
            .values()
            .filter(|p| p.employee_id() == employee_id)
            .collect();
        periods.sort_by_key(|p| p.start_date());
        periods
    }

    /// Aggregates the balance over all of an employee's periods. Fails with
    /// `Validation` when the totals do not fit in a `Decimal`.
    pub fn snapshot(&self, employee_id: EmployeeId) -> EngineResult<BalanceSnapshot> {
        self.periods_for(employee_id)
            .into_iter()
            .try_fold(BalanceSnapshot::default(), |acc, p| {
                Ok(BalanceSnapshot {
                    earned: add_days(acc.earned, p.earned())?,
                    consumed: add_days(acc.consumed, p.consumed())?,
                    outstanding: add_days(acc.outstanding, p.outstanding())?,
                })
            })
    }
}
