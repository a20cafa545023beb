//! Approval records: one approver's decision at one stage of a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApprovalId, EmployeeId, RequestId};

/// The stage an approval belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalType {
    /// First stage, decided by the employee's line manager.
    Manager,
    /// Final stage, decided by an accountant.
    Accountant,
}

impl std::fmt::Display for ApprovalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalType::Manager => write!(f, "manager"),
            ApprovalType::Accountant => write!(f, "accountant"),
        }
    }
}

/// Decision state of an approval. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Waiting for a decision.
    Pending,
    /// Approved.
    Approved,
    /// Rejected.
    Rejected,
}

/// A decision record tied to a request and a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Unique identifier for the approval.
    pub id: ApprovalId,
    /// The request being decided.
    pub request_id: RequestId,
    /// The stage.
    pub approval_type: ApprovalType,
    /// The approver the stage was routed to. `None` when the stage is open to
    /// every accountant.
    pub approver_id: Option<EmployeeId>,
    /// Decision state.
    pub state: ApprovalState,
    /// Free-text comments from the approver.
    #[serde(default)]
    pub comments: String,
    /// Who actually decided.
    pub decided_by: Option<EmployeeId>,
    /// True when a senior role decided a stage that was not routed to them.
    #[serde(default)]
    pub by_override: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the decision was made.
    pub decided_at: Option<DateTime<Utc>>,
}

impl Approval {
    /// Returns true if the approval is still waiting for a decision.
    pub fn is_pending(&self) -> bool {
        self.state == ApprovalState::Pending
    }
}
