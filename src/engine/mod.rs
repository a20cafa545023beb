//! The leave engine.
//!
//! [`LeaveEngine`] is the single entry point for every operation. Requests,
//! approvals and the period ledger live together behind one mutex, so every
//! read-check-write sequence (pending-approval lookup, balance check, debit)
//! commits as one unit. Notifications are built and dispatched only after the
//! lock is released.

mod effects;
mod requests;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::approvals::ApprovalStore;
use crate::config::EngineConfig;
use crate::directory::Directory;
use crate::error::{EngineError, EngineResult};
use crate::ledger::PeriodLedger;
use crate::models::{
    Approval, BalanceSnapshot, EmployeeId, LeaveRequest, Period, PeriodId, RequestId,
};
use crate::notify::{NotificationDispatcher, Notifier};
use crate::tokens::TokenGateway;
use crate::workflow::policy;

/// Everything that must change together.
#[derive(Debug, Default)]
struct Books {
    requests: HashMap<RequestId, LeaveRequest>,
    approvals: ApprovalStore,
    ledger: PeriodLedger,
}

impl Books {
    fn request(&self, request_id: RequestId) -> EngineResult<&LeaveRequest> {
        self.requests
            .get(&request_id)
            .ok_or_else(|| EngineError::not_found("request", request_id))
    }
}

/// Leave request lifecycle engine.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use leave_engine::config::EngineConfig;
/// use leave_engine::directory::InMemoryDirectory;
/// use leave_engine::engine::LeaveEngine;
/// use leave_engine::models::{Employee, NewLeaveRequest, RequestState, Role};
/// use leave_engine::notify::{NotificationDispatcher, RecordingNotifier};
///
/// let directory = Arc::new(InMemoryDirectory::new());
/// let accountant = Employee::new("Marta", "marta@example.com", Role::Accountant);
/// let ana = Employee::new("Ana", "ana@example.com", Role::Employee);
/// directory.insert(accountant.clone())?;
/// directory.insert(ana.clone())?;
///
/// let dispatcher = NotificationDispatcher::inline(Arc::new(RecordingNotifier::new()));
/// let engine = LeaveEngine::with_dispatcher(EngineConfig::default(), directory, dispatcher);
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
/// let period = engine.provision_period(ana.id, d(1, 1), d(12, 31), Decimal::new(15, 0))?;
/// let draft = engine.create_request(ana.id, NewLeaveRequest {
///     period_id: period.id(),
///     start_date: d(8, 11),
///     end_date: d(8, 15),
///     days: None,
///     notes: String::new(),
/// })?;
/// assert_eq!(draft.chargeable_days, 7);
///
/// let pending = engine.submit(ana.id, draft.id)?;
/// assert_eq!(pending.state, RequestState::PendingAccountant);
///
/// let approved = engine.approve(accountant.id, draft.id, "")?;
/// assert_eq!(approved.state, RequestState::Approved);
/// assert_eq!(engine.balance(ana.id)?.outstanding, Decimal::new(8, 0));
/// # Ok::<(), leave_engine::error::EngineError>(())
/// ```
pub struct LeaveEngine {
    config: EngineConfig,
    directory: Arc<dyn Directory>,
    books: Mutex<Books>,
    tokens: TokenGateway,
    dispatcher: NotificationDispatcher,
}

impl LeaveEngine {
    /// Creates an engine that delivers notifications in the background.
    pub fn new(
        config: EngineConfig,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_dispatcher(config, directory, NotificationDispatcher::new(notifier))
    }

    /// Creates an engine with an explicit dispatcher.
    pub fn with_dispatcher(
        config: EngineConfig,
        directory: Arc<dyn Directory>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        let tokens = TokenGateway::new(&config.tokens);
        Self {
            config,
            directory,
            books: Mutex::new(Books::default()),
            tokens,
            dispatcher,
        }
    }

    /// The engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The approval token gateway.
    pub fn tokens(&self) -> &TokenGateway {
        &self.tokens
    }

    fn books(&self) -> EngineResult<MutexGuard<'_, Books>> {
        self.books.lock().map_err(|_| EngineError::poisoned())
    }

    fn require_period_manager(&self, actor_id: EmployeeId) -> EngineResult<()> {
        let actor = self.directory.require(actor_id)?;
        if !policy::may_manage_periods(&actor) {
            return Err(EngineError::denied(actor_id, "manage periods"));
        }
        Ok(())
    }

    // ==================== Periods ====================

    /// Opens a period without a permission check. Used for onboarding and
    /// seeding.
    pub fn provision_period(
        &self,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        earned: Decimal,
    ) -> EngineResult<Period> {
        self.directory.require(employee_id)?;
        let mut books = self.books()?;
        let id = books.ledger.open(employee_id, start_date, end_date, earned)?;
        books.ledger.get(id).cloned()
    }

    /// Opens a period on behalf of a senior actor.
    pub fn open_period(
        &self,
        actor_id: EmployeeId,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        earned: Decimal,
    ) -> EngineResult<Period> {
        self.require_period_manager(actor_id)?;
        self.provision_period(employee_id, start_date, end_date, earned)
    }

    /// Adds earned days to a period.
    pub fn credit_period(
        &self,
        actor_id: EmployeeId,
        period_id: PeriodId,
        days: Decimal,
    ) -> EngineResult<Period> {
        self.require_period_manager(actor_id)?;
        let mut books = self.books()?;
        books.ledger.credit(period_id, days).cloned()
    }

    /// Deletes a period that has never been charged and that no open request
    /// references.
    pub fn delete_period(&self, actor_id: EmployeeId, period_id: PeriodId) -> EngineResult<Period> {
        self.require_period_manager(actor_id)?;
        let mut books = self.books()?;
        books.ledger.get(period_id)?;
        if let Some(open) = books
            .requests
            .values()
            .find(|r| r.period_id == period_id && !r.state.is_terminal())
        {
            return Err(EngineError::validation(
                "period",
                format!("period {} is referenced by open request {}", period_id, open.id),
            ));
        }
        books.ledger.delete(period_id)
    }

    /// Looks up a period.
    pub fn period(&self, period_id: PeriodId) -> EngineResult<Period> {
        self.books()?.ledger.get(period_id).cloned()
    }

    /// An employee's periods, oldest first.
    pub fn periods_for(&self, employee_id: EmployeeId) -> EngineResult<Vec<Period>> {
        let books = self.books()?;
        Ok(books
            .ledger
            .periods_for(employee_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// An employee's balance over all periods.
    pub fn balance(&self, employee_id: EmployeeId) -> EngineResult<BalanceSnapshot> {
        self.books()?.ledger.snapshot(employee_id)
    }

    // ==================== Queries ====================

    /// Looks up a request.
    pub fn request(&self, request_id: RequestId) -> EngineResult<LeaveRequest> {
        self.books()?.request(request_id).cloned()
    }

    /// An employee's requests, by start date.
    pub fn requests_for(&self, employee_id: EmployeeId) -> EngineResult<Vec<LeaveRequest>> {
        let books = self.books()?;
        let mut requests: Vec<LeaveRequest> = books
            .requests
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        requests.sort_by_key(|r| (r.start_date, r.created_at));
        Ok(requests)
    }

    /// The approval trail of a request, oldest first.
    pub fn approvals_for(&self, request_id: RequestId) -> EngineResult<Vec<Approval>> {
        let books = self.books()?;
        books.request(request_id)?;
        Ok(books
            .approvals
            .for_request(request_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Requests currently waiting on `actor_id`, oldest first.
    pub fn pending_for(&self, actor_id: EmployeeId) -> EngineResult<Vec<LeaveRequest>> {
        let actor = self.directory.require(actor_id)?;
        let pending: Vec<LeaveRequest> = self
            .books()?
            .requests
            .values()
            .filter(|r| r.state.is_pending())
            .cloned()
            .collect();

        let mut waiting = Vec::new();
        for request in pending {
            let Some(owner) = self.directory.employee(request.employee_id)? else {
                continue;
            };
            if policy::awaits(&actor, &owner, request.state) {
                waiting.push(request);
            }
        }
        waiting.sort_by_key(|r| r.created_at);
        Ok(waiting)
    }

    /// Drops expired approval tokens.
    pub fn purge_expired_tokens(&self, now: DateTime<Utc>) -> EngineResult<usize> {
        let purged = self.tokens.purge_expired(now)?;
        if purged > 0 {
            info!(purged, "Expired approval tokens purged");
        }
        Ok(purged)
    }
}

impl std::fmt::Debug for LeaveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaveEngine")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
