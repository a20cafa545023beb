//! Approval routing policy.
//!
//! Every role rule lives here: which stage a request enters on submission,
//! who may decide each stage, who may cancel or delete. The state machine
//! and the "pending for me" query both call these functions.

use serde::{Deserialize, Serialize};

use crate::models::{ApprovalLevel, ApprovalType, Employee, RequestState, Role};

/// How an actor is entitled to decide a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// The stage is routed to this actor.
    Assigned,
    /// A senior role deciding a manager stage routed to someone else.
    Override,
}

/// Returns true for accountants, administrators and level-2 approvers.
pub fn is_senior(employee: &Employee) -> bool {
    matches!(employee.role, Role::Accountant | Role::Admin)
        || employee.approval_level >= ApprovalLevel::ACCOUNTANT
}

/// The stage a request enters when its owner submits it.
pub fn submission_stage(owner: &Employee) -> ApprovalType {
    if owner.manager_id.is_some() {
        ApprovalType::Manager
    } else {
        ApprovalType::Accountant
    }
}

/// The stage a request state is waiting on, if any.
pub fn stage_of(state: RequestState) -> Option<ApprovalType> {
    match state {
        RequestState::PendingManager => Some(ApprovalType::Manager),
        RequestState::PendingAccountant => Some(ApprovalType::Accountant),
        _ => None,
    }
}

/// The request state that waits on a stage.
pub fn state_for_stage(stage: ApprovalType) -> RequestState {
    match stage {
        ApprovalType::Manager => RequestState::PendingManager,
        ApprovalType::Accountant => RequestState::PendingAccountant,
    }
}

/// Determines whether `actor` may decide `stage` of a request owned by `owner`.
///
/// Nobody decides their own request. At the manager stage the owner's direct
/// manager is assigned and senior roles may override; at the accountant stage
/// senior roles are assigned.
///
/// # Example
///
/// ```
/// use leave_engine::models::{ApprovalType, Employee, Role};
/// use leave_engine::workflow::{authority, Authority};
///
/// let boss = Employee::new("Boss", "boss@example.com", Role::Manager);
/// let accountant = Employee::new("Marta", "marta@example.com", Role::Accountant);
/// let owner = Employee::new("Ana", "ana@example.com", Role::Employee).reporting_to(boss.id);
///
/// assert_eq!(authority(&boss, &owner, ApprovalType::Manager), Some(Authority::Assigned));
/// assert_eq!(authority(&accountant, &owner, ApprovalType::Manager), Some(Authority::Override));
/// assert_eq!(authority(&boss, &owner, ApprovalType::Accountant), None);
/// ```
pub fn authority(actor: &Employee, owner: &Employee, stage: ApprovalType) -> Option<Authority> {
    if actor.id == owner.id {
        return None;
    }
    match stage {
        ApprovalType::Manager if owner.manager_id == Some(actor.id) => Some(Authority::Assigned),
        ApprovalType::Manager if is_senior(actor) => Some(Authority::Override),
        ApprovalType::Accountant if is_senior(actor) => Some(Authority::Assigned),
        _ => None,
    }
}

/// Returns true if `actor` may submit `owner`'s draft.
pub fn may_submit(actor: &Employee, owner: &Employee) -> bool {
    actor.id == owner.id || actor.is_admin()
}

/// Returns true if `actor` may cancel `owner`'s request.
pub fn may_cancel(actor: &Employee, owner: &Employee) -> bool {
    actor.id == owner.id || actor.is_admin()
}

/// Returns true if `actor` may edit `owner`'s draft.
pub fn may_edit(actor: &Employee, owner: &Employee) -> bool {
    actor.id == owner.id || actor.is_admin()
}

/// Returns true if `actor` may delete `owner`'s request in `state`.
///
/// Deleting an approved request gives days back to the period, so only
/// senior roles may do it.
pub fn may_delete(actor: &Employee, owner: &Employee, state: RequestState) -> bool {
    if state == RequestState::Approved {
        is_senior(actor) && actor.id != owner.id
    } else {
        actor.id == owner.id || actor.is_admin()
    }
}

/// Returns true if a request in `state` owned by `owner` is waiting on
/// `actor`. Stages an actor could only decide by override are not listed.
pub fn awaits(actor: &Employee, owner: &Employee, state: RequestState) -> bool {
    stage_of(state)
        .and_then(|stage| authority(actor, owner, stage))
        .is_some_and(|a| a == Authority::Assigned)
}

/// Returns true if `actor` may provision or adjust periods.
pub fn may_manage_periods(actor: &Employee) -> bool {
    is_senior(actor)
}
