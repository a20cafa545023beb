//! Pure request state transitions.
//!
//! [`plan`] decides what a transition does without touching any store: the
//! next state, which approval to close and which to open, whether the period
//! is debited, and which side effects run after the commit. The engine
//! applies the plan atomically and then executes the effects.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{ApprovalState, ApprovalType, Employee, EmployeeId, RequestState};
use crate::notify::NotificationKind;

use super::policy::{self, Authority};

/// An action requested on a leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Send a draft for approval.
    Submit,
    /// Approve the current stage.
    Approve {
        /// Optional approver comments.
        #[serde(default)]
        comment: String,
    },
    /// Reject the request. The comment is mandatory.
    Reject {
        /// Reason for the rejection.
        #[serde(default)]
        comment: String,
    },
    /// Withdraw the request.
    Cancel,
}

impl Action {
    /// Short verb used in errors and logs.
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Submit => "submit",
            Action::Approve { .. } => "approve",
            Action::Reject { .. } => "reject",
            Action::Cancel => "cancel",
        }
    }

    fn comment(&self) -> &str {
        match self {
            Action::Approve { comment } | Action::Reject { comment } => comment,
            Action::Submit | Action::Cancel => "",
        }
    }
}

/// Closes the pending approval of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseStage {
    /// The stage being decided.
    pub stage: ApprovalType,
    /// Approved or rejected.
    pub outcome: ApprovalState,
    /// Comments recorded on the approval.
    pub comments: String,
    /// Set when a senior role decides a stage routed to someone else.
    pub by_override: bool,
}

/// Opens a pending approval for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenStage {
    /// The stage to open.
    pub stage: ApprovalType,
    /// The approver it is routed to; `None` routes to every accountant.
    pub approver: Option<EmployeeId>,
}

/// A side effect executed after the transition commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the stage approver(s) for a decision, with approval tokens.
    RequestDecision(OpenStage),
    /// Tell the request owner what happened.
    NotifyOwner(NotificationKind),
    /// Invalidate every outstanding token of the request.
    RevokeTokens,
}

/// Everything a transition does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// State before the transition.
    pub from: RequestState,
    /// State after the transition.
    pub to: RequestState,
    /// Approval to close, if any.
    pub close: Option<CloseStage>,
    /// Approval to open, if any.
    pub open: Option<OpenStage>,
    /// Whether the request's days are debited from its period.
    pub debit: bool,
    /// Effects to run after commit.
    pub effects: Vec<Effect>,
}

impl Plan {
    fn new(from: RequestState, to: RequestState) -> Self {
        Self {
            from,
            to,
            close: None,
            open: None,
            debit: false,
            effects: Vec::new(),
        }
    }
}

/// Plans `action` on a request in state `state`, performed by `actor` on a
/// request owned by `owner`.
///
/// # Errors
///
/// - `InvalidTransition` when the state does not accept the action
/// - `PermissionDenied` when the actor lacks the role for it
/// - `Validation` when a rejection has no comment
///
/// # Example
///
/// ```
/// use leave_engine::models::{Employee, RequestState, Role};
/// use leave_engine::workflow::{plan, Action};
///
/// let accountant = Employee::new("Marta", "marta@example.com", Role::Accountant);
/// let boss = Employee::new("Boss", "boss@example.com", Role::Manager);
/// let owner = Employee::new("Ana", "ana@example.com", Role::Employee).reporting_to(boss.id);
///
/// // Senior roles collapse both stages into one step.
/// let p = plan(
///     RequestState::PendingManager,
///     &Action::Approve { comment: String::new() },
///     &accountant,
///     &owner,
/// )
/// .unwrap();
/// assert_eq!(p.to, RequestState::Approved);
/// assert!(p.debit);
/// ```
pub fn plan(
    state: RequestState,
    action: &Action,
    actor: &Employee,
    owner: &Employee,
) -> EngineResult<Plan> {
    let invalid = || EngineError::InvalidTransition {
        state: state.to_string(),
        action: action.verb().to_string(),
    };
    if state.is_terminal() {
        return Err(invalid());
    }

    match action {
        Action::Submit => {
            if state != RequestState::Draft {
                return Err(invalid());
            }
            if !policy::may_submit(actor, owner) {
                return Err(EngineError::denied(actor.id, "submit this request"));
            }
            let stage = policy::submission_stage(owner);
            let open = OpenStage {
                stage,
                approver: match stage {
                    ApprovalType::Manager => owner.manager_id,
                    ApprovalType::Accountant => None,
                },
            };
            let mut plan = Plan::new(state, policy::state_for_stage(stage));
            plan.open = Some(open);
            plan.effects.push(Effect::RequestDecision(open));
            plan.effects.push(Effect::NotifyOwner(NotificationKind::Submitted));
            Ok(plan)
        }
        Action::Approve { .. } | Action::Reject { .. } => {
            let stage = policy::stage_of(state).ok_or_else(invalid)?;
            let authority = policy::authority(actor, owner, stage)
                .ok_or_else(|| EngineError::denied(actor.id, format!("{} this request", action.verb())))?;
            let comments = action.comment().trim().to_string();

            if matches!(action, Action::Reject { .. }) {
                if comments.is_empty() {
                    return Err(EngineError::validation(
                        "comment",
                        "a rejection requires a comment",
                    ));
                }
                let mut plan = Plan::new(state, RequestState::Rejected);
                plan.close = Some(CloseStage {
                    stage,
                    outcome: ApprovalState::Rejected,
                    comments,
                    by_override: authority == Authority::Override,
                });
                plan.effects.push(Effect::RevokeTokens);
                plan.effects.push(Effect::NotifyOwner(NotificationKind::Rejected));
                return Ok(plan);
            }

            let close = CloseStage {
                stage,
                outcome: ApprovalState::Approved,
                comments,
                by_override: authority == Authority::Override,
            };
            match (stage, authority) {
                (ApprovalType::Manager, Authority::Assigned) => {
                    let open = OpenStage {
                        stage: ApprovalType::Accountant,
                        approver: None,
                    };
                    let mut plan = Plan::new(state, RequestState::PendingAccountant);
                    plan.close = Some(close);
                    plan.open = Some(open);
                    plan.effects.push(Effect::RequestDecision(open));
                    plan.effects
                        .push(Effect::NotifyOwner(NotificationKind::StageApproved));
                    Ok(plan)
                }
                _ => {
                    let mut plan = Plan::new(state, RequestState::Approved);
                    plan.close = Some(close);
                    plan.debit = true;
                    plan.effects.push(Effect::RevokeTokens);
                    plan.effects.push(Effect::NotifyOwner(NotificationKind::Approved));
                    Ok(plan)
                }
            }
        }
        Action::Cancel => {
            if !policy::may_cancel(actor, owner) {
                return Err(EngineError::denied(actor.id, "cancel this request"));
            }
            let mut plan = Plan::new(state, RequestState::Cancelled);
            plan.effects.push(Effect::RevokeTokens);
            if actor.id != owner.id {
                plan.effects
                    .push(Effect::NotifyOwner(NotificationKind::Cancelled));
            }
            Ok(plan)
        }
    }
}
