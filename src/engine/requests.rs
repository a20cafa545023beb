//! Request lifecycle operations.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::approvals::Decision;
use crate::calculation::chargeable_days;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    EmployeeId, LeaveRequest, NewLeaveRequest, PeriodId, RequestId, RequestState,
    RevisedLeaveRequest, TokenAction,
};
use crate::workflow::{Action, Plan, plan, policy};

use super::{Books, LeaveEngine};

/// The validated content of a draft.
struct Draft<'a> {
    period_id: PeriodId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    client_days: Option<u32>,
    notes: &'a str,
}

impl LeaveEngine {
    /// Creates a draft request for `actor_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` for an inverted or empty range, a foreign period, notes
    ///   that are too long, or a range overlapping another open request
    /// - `InsufficientBalance` when the days exceed the period's outstanding
    /// - `NotFound` when the period does not exist
    pub fn create_request(
        &self,
        actor_id: EmployeeId,
        new_request: NewLeaveRequest,
    ) -> EngineResult<LeaveRequest> {
        self.directory.require(actor_id)?;
        let draft = Draft {
            period_id: new_request.period_id,
            start_date: new_request.start_date,
            end_date: new_request.end_date,
            client_days: new_request.days,
            notes: &new_request.notes,
        };

        let chargeable = self.draft_days(&draft)?;
        let mut books = self.books()?;
        self.check_against_books(&books, actor_id, &draft, chargeable, None)?;
        let now = Utc::now();
        let request = LeaveRequest {
            id: RequestId::new(),
            employee_id: actor_id,
            period_id: draft.period_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            chargeable_days: chargeable,
            notes: draft.notes.to_string(),
            state: RequestState::Draft,
            created_at: now,
            updated_at: now,
        };
        books.requests.insert(request.id, request.clone());
        info!(
            request_id = %request.id,
            employee_id = %actor_id,
            period_id = %request.period_id,
            days = request.chargeable_days,
            "Leave request drafted"
        );
        Ok(request)
    }

    /// Edits a draft. The result is validated like a new request, ignoring
    /// the draft itself in the overlap check.
    pub fn revise_draft(
        &self,
        actor_id: EmployeeId,
        request_id: RequestId,
        revision: RevisedLeaveRequest,
    ) -> EngineResult<LeaveRequest> {
        let actor = self.directory.require(actor_id)?;
        let mut books = self.books()?;
        let current = books.request(request_id)?.clone();
        let owner = self.directory.require(current.employee_id)?;
        if !policy::may_edit(&actor, &owner) {
            return Err(EngineError::denied(actor_id, "edit this request"));
        }
        if current.state != RequestState::Draft {
            return Err(EngineError::InvalidTransition {
                state: current.state.to_string(),
                action: "edit".to_string(),
            });
        }

        let start_date = revision.start_date.unwrap_or(current.start_date);
        let end_date = revision.end_date.unwrap_or(current.end_date);
        let range_changed = start_date != current.start_date || end_date != current.end_date;
        let client_days = match revision.days {
            Some(days) => Some(days),
            None if range_changed => None,
            None => Some(current.chargeable_days),
        };
        let notes = revision.notes.unwrap_or_else(|| current.notes.clone());
        let period_id = revision.period_id.unwrap_or(current.period_id);
        let draft = Draft {
            period_id,
            start_date,
            end_date,
            client_days,
            notes: &notes,
        };

        let chargeable = self.draft_days(&draft)?;
        self.check_against_books(&books, current.employee_id, &draft, chargeable, Some(request_id))?;
        let updated = LeaveRequest {
            period_id,
            start_date,
            end_date,
            chargeable_days: chargeable,
            notes,
            updated_at: Utc::now(),
            ..current
        };
        books.requests.insert(request_id, updated.clone());
        info!(request_id = %request_id, days = chargeable, "Draft revised");
        Ok(updated)
    }

    /// Checks the parts of a draft that need no stored state and returns its
    /// chargeable-day count.
    fn draft_days(&self, draft: &Draft<'_>) -> EngineResult<u32> {
        if draft.notes.chars().count() > self.config.requests.max_notes_len {
            return Err(EngineError::validation(
                "notes",
                format!("must not exceed {} characters", self.config.requests.max_notes_len),
            ));
        }
        if draft.start_date > draft.end_date {
            return Err(EngineError::validation(
                "end_date",
                "must not precede start_date",
            ));
        }

        let days = match draft.client_days {
            Some(days) if self.config.requests.allow_client_day_count => days,
            _ => chargeable_days(draft.start_date, draft.end_date).total,
        };
        if days == 0 {
            return Err(EngineError::validation(
                "days",
                "the date range contains no chargeable days",
            ));
        }
        Ok(days)
    }

    /// Checks a draft against the period it charges and the owner's other
    /// requests.
    fn check_against_books(
        &self,
        books: &Books,
        owner_id: EmployeeId,
        draft: &Draft<'_>,
        days: u32,
        exclude: Option<RequestId>,
    ) -> EngineResult<()> {
        let period = books.ledger.get(draft.period_id)?;
        if period.employee_id() != owner_id {
            return Err(EngineError::validation(
                "period_id",
                "the period belongs to another employee",
            ));
        }
        books
            .ledger
            .ensure_available(draft.period_id, Decimal::from(days))?;

        if let Some(clash) = books.requests.values().find(|r| {
            r.employee_id == owner_id
                && Some(r.id) != exclude
                && !r.state.is_terminal()
                && r.overlaps(draft.start_date, draft.end_date)
        }) {
            return Err(EngineError::validation(
                "start_date",
                format!(
                    "overlaps request {} ({} to {})",
                    clash.id, clash.start_date, clash.end_date
                ),
            ));
        }
        Ok(())
    }

    // ==================== Transitions ====================

    /// Sends a draft for approval.
    pub fn submit(&self, actor_id: EmployeeId, request_id: RequestId) -> EngineResult<LeaveRequest> {
        self.apply(actor_id, request_id, &Action::Submit)
    }

    /// Approves the current stage.
    pub fn approve(
        &self,
        actor_id: EmployeeId,
        request_id: RequestId,
        comment: &str,
    ) -> EngineResult<LeaveRequest> {
        let action = Action::Approve {
            comment: comment.to_string(),
        };
        self.apply(actor_id, request_id, &action)
    }

    /// Rejects the request. `comment` must not be blank.
    pub fn reject(
        &self,
        actor_id: EmployeeId,
        request_id: RequestId,
        comment: &str,
    ) -> EngineResult<LeaveRequest> {
        let action = Action::Reject {
            comment: comment.to_string(),
        };
        self.apply(actor_id, request_id, &action)
    }

    /// Withdraws the request.
    pub fn cancel(&self, actor_id: EmployeeId, request_id: RequestId) -> EngineResult<LeaveRequest> {
        self.apply(actor_id, request_id, &Action::Cancel)
    }

    /// Performs `action` on a request and, once committed, runs its effects.
    pub fn apply(
        &self,
        actor_id: EmployeeId,
        request_id: RequestId,
        action: &Action,
    ) -> EngineResult<LeaveRequest> {
        let actor = self.directory.require(actor_id)?;
        if let Action::Approve { comment } | Action::Reject { comment } = action {
            if comment.chars().count() > self.config.requests.max_notes_len {
                return Err(EngineError::validation(
                    "comment",
                    format!("must not exceed {} characters", self.config.requests.max_notes_len),
                ));
            }
        }

        let (request, plan) = {
            let mut books = self.books()?;
            let current = books.request(request_id)?.clone();
            let owner = self.directory.require(current.employee_id)?;
            let planned = plan(current.state, action, &actor, &owner)?;
            let request = commit(&mut books, current, &planned, actor_id, Utc::now())?;
            (request, planned)
        };

        info!(
            request_id = %request_id,
            actor = %actor_id,
            action = action.verb(),
            from = %plan.from,
            to = %plan.to,
            "Leave request transitioned"
        );
        self.run_effects(&request, &plan.effects);
        Ok(request)
    }

    /// Deletes a request. An approved request gives its days back to the
    /// period first.
    pub fn delete_request(
        &self,
        actor_id: EmployeeId,
        request_id: RequestId,
    ) -> EngineResult<LeaveRequest> {
        let actor = self.directory.require(actor_id)?;
        let removed = {
            let mut books = self.books()?;
            let request = books.request(request_id)?.clone();
            let owner = self.directory.require(request.employee_id)?;
            if !policy::may_delete(&actor, &owner, request.state) {
                return Err(EngineError::denied(actor_id, "delete this request"));
            }
            if request.state == RequestState::Approved {
                books.ledger.reverse(request.period_id, request.days())?;
            }
            let approvals = books.approvals.remove_for_request(request_id);
            books.requests.remove(&request_id);
            info!(
                request_id = %request_id,
                actor = %actor_id,
                state = %request.state,
                approvals,
                "Leave request deleted"
            );
            request
        };

        if let Err(err) = self.tokens.revoke_for_request(request_id) {
            warn!(request_id = %request_id, error = %err, "Could not revoke approval tokens");
        }
        Ok(removed)
    }

    /// Decides a request through an approval token.
    ///
    /// The token is claimed first, so a concurrent second redemption fails
    /// with `InvalidOrExpiredToken`. It is consumed when the transition
    /// commits and released when the transition fails, so a failure such as
    /// `InsufficientBalance` can be retried with the same link.
    pub fn decide_by_token(&self, raw_token: &str, comment: &str) -> EngineResult<LeaveRequest> {
        let grant = self.tokens.claim(raw_token)?;
        let action = match grant.action {
            TokenAction::Approve => Action::Approve {
                comment: comment.to_string(),
            },
            TokenAction::Reject => Action::Reject {
                comment: comment.to_string(),
            },
        };

        match self.apply(grant.approver_id, grant.request_id, &action) {
            Ok(request) => {
                if let Err(err) = self.tokens.consume(grant.token_id) {
                    warn!(token_id = %grant.token_id, error = %err, "Could not consume approval token");
                }
                info!(
                    request_id = %grant.request_id,
                    approver = %grant.approver_id,
                    action = %grant.action,
                    "Approval token redeemed"
                );
                Ok(request)
            }
            Err(err) => {
                if let Err(release_err) = self.tokens.release(grant.token_id) {
                    warn!(token_id = %grant.token_id, error = %release_err, "Could not release approval token");
                }
                Err(err)
            }
        }
    }
}

/// Applies a plan to the books. Every check that can fail runs before the
/// first mutation, so an error leaves the books untouched.
fn commit(
    books: &mut Books,
    mut request: LeaveRequest,
    plan: &Plan,
    actor_id: EmployeeId,
    now: DateTime<Utc>,
) -> EngineResult<LeaveRequest> {
    let pending = match &plan.close {
        Some(close) => Some(
            books
                .approvals
                .pending(request.id, close.stage)
                .map(|a| a.id)
                .ok_or_else(|| EngineError::InvalidTransition {
                    state: request.state.to_string(),
                    action: format!("decide the {} stage without a pending approval", close.stage),
                })?,
        ),
        None => None,
    };
    if let Some(open) = &plan.open {
        if books.approvals.pending(request.id, open.stage).is_some() {
            return Err(EngineError::InvalidTransition {
                state: request.state.to_string(),
                action: format!("open a second pending {} approval", open.stage),
            });
        }
    }
    if plan.debit {
        books.ledger.debit(request.period_id, request.days())?;
    }

    if let (Some(close), Some(approval_id)) = (&plan.close, pending) {
        let decision = Decision {
            outcome: close.outcome,
            actor: actor_id,
            comments: close.comments.clone(),
            by_override: close.by_override,
            at: now,
        };
        books.approvals.decide(approval_id, decision)?;
    }
    if let Some(open) = &plan.open {
        books.approvals.open(request.id, open.stage, open.approver, now)?;
    }

    request.state = plan.to;
    request.updated_at = now;
    books.requests.insert(request.id, request.clone());
    Ok(request)
}
