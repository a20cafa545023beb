//! Approval record store.
//!
//! Tracks one approval per (request, stage). Like the ledger it is a plain
//! data structure; the engine serialises access to it.
//!
//! ## Invariants
//! - At most one `pending` approval of a given type per request
//! - `approved` and `rejected` approvals are never changed again

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{EngineError, EngineResult};
use crate::models::{Approval, ApprovalId, ApprovalState, ApprovalType, EmployeeId, RequestId};

/// A decision to record against a stage.
#[derive(Debug, Clone)]
pub struct Decision {
    /// Approved or rejected.
    pub outcome: ApprovalState,
    /// Who decided.
    pub actor: EmployeeId,
    /// Free-text comments.
    pub comments: String,
    /// True when a senior role decided a stage not routed to them.
    pub by_override: bool,
    /// Decision instant.
    pub at: DateTime<Utc>,
}

/// Stores approval records for all requests.
#[derive(Debug, Default, Clone)]
pub struct ApprovalStore {
    approvals: HashMap<ApprovalId, Approval>,
    by_request: HashMap<RequestId, Vec<ApprovalId>>,
}

impl ApprovalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a pending approval for a stage.
    ///
    /// Fails with `InvalidTransition` if that stage already has a pending
    /// approval for the request.
    pub fn open(
        &mut self,
        request_id: RequestId,
        approval_type: ApprovalType,
        approver_id: Option<EmployeeId>,
        now: DateTime<Utc>,
    ) -> EngineResult<&Approval> {
        if self.pending(request_id, approval_type).is_some() {
            return Err(EngineError::InvalidTransition {
                state: format!("{} approval pending", approval_type),
                action: "open approval".to_string(),
            });
        }
        let approval = Approval {
            id: ApprovalId::new(),
            request_id,
            approval_type,
            approver_id,
            state: ApprovalState::Pending,
            comments: String::new(),
            decided_by: None,
            by_override: false,
            created_at: now,
            decided_at: None,
        };
        Ok(self.store(approval))
    }

    fn store(&mut self, approval: Approval) -> &Approval {
        let id = approval.id;
        self.by_request
            .entry(approval.request_id)
            .or_default()
            .push(id);
        self.approvals.entry(id).or_insert(approval)
    }

    /// The pending approval of a stage, if any.
    pub fn pending(&self, request_id: RequestId, approval_type: ApprovalType) -> Option<&Approval> {
        self.ids_for(request_id)
            .filter_map(|id| self.approvals.get(id))
            .find(|a| a.approval_type == approval_type && a.is_pending())
    }

    /// Decides a pending approval.
    pub fn decide(&mut self, approval_id: ApprovalId, decision: Decision) -> EngineResult<&Approval> {
        let approval = self
            .approvals
            .get_mut(&approval_id)
            .ok_or_else(|| EngineError::not_found("approval", approval_id))?;
        if !approval.is_pending() {
            return Err(EngineError::InvalidTransition {
                state: format!("{:?}", approval.state).to_lowercase(),
                action: "decide approval".to_string(),
            });
        }
        if decision.outcome == ApprovalState::Pending {
            return Err(EngineError::validation(
                "decision",
                "a decision must approve or reject",
            ));
        }
        approval.state = decision.outcome;
        approval.comments = decision.comments;
        approval.decided_by = Some(decision.actor);
        approval.by_override = decision.by_override;
        approval.decided_at = Some(decision.at);
        Ok(approval)
    }

    /// All approvals of a request, oldest first.
    pub fn for_request(&self, request_id: RequestId) -> Vec<&Approval> {
        self.ids_for(request_id)
            .filter_map(|id| self.approvals.get(id))
            .collect()
    }

    /// Removes every approval of a request. Returns how many were removed.
    pub fn remove_for_request(&mut self, request_id: RequestId) -> usize {
        let ids = self.by_request.remove(&request_id).unwrap_or_default();
        for id in &ids {
            self.approvals.remove(id);
        }
        ids.len()
    }

    fn ids_for(&self, request_id: RequestId) -> impl Iterator<Item = &ApprovalId> {
        self.by_request.get(&request_id).into_iter().flatten()
    }
}
