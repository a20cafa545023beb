//! Post-commit effects: token issuance and notifications.
//!
//! Nothing here can fail a transition. Errors are logged and the remaining
//! effects still run.

use tracing::{info, warn};

use crate::models::{EmployeeId, IssuedToken, LeaveRequest, TokenAction};
use crate::notify::{Notification, NotificationKind};
use crate::error::EngineResult;
use crate::workflow::{Effect, OpenStage, policy};

use super::LeaveEngine;

impl LeaveEngine {
    pub(super) fn run_effects(&self, request: &LeaveRequest, effects: &[Effect]) {
        let mut outbox = Vec::new();
        for effect in effects {
            match effect {
                Effect::RevokeTokens => {
                    if let Err(err) = self.tokens.revoke_for_request(request.id) {
                        warn!(request_id = %request.id, error = %err, "Could not revoke approval tokens");
                    }
                }
                Effect::RequestDecision(open) => outbox.extend(self.decision_requests(request, *open)),
                Effect::NotifyOwner(kind) => {
                    outbox.push(self.notification(*kind, request, request.employee_id, Vec::new()))
                }
            }
        }
        self.dispatcher.dispatch(outbox);
    }

    /// One notification per approver of the stage, each carrying an approve
    /// and a reject link. Nothing is sent when the request has already left
    /// the stage.
    fn decision_requests(&self, request: &LeaveRequest, open: OpenStage) -> Vec<Notification> {
        let recipients: Vec<EmployeeId> = match open.approver {
            Some(approver) => vec![approver],
            None => match self.directory.accountants() {
                Ok(accountants) => accountants
                    .into_iter()
                    .filter(|id| *id != request.employee_id)
                    .collect(),
                Err(err) => {
                    warn!(request_id = %request.id, error = %err, "Could not list accountants");
                    Vec::new()
                }
            },
        };
        if recipients.is_empty() {
            warn!(
                request_id = %request.id,
                stage = %open.stage,
                "No approver to notify"
            );
            return Vec::new();
        }

        let grants: Vec<(EmployeeId, TokenAction)> = recipients
            .iter()
            .flat_map(|id| [(*id, TokenAction::Approve), (*id, TokenAction::Reject)])
            .collect();
        let issued = match self.issue_if_waiting(request, open, &grants) {
            Ok(Some(issued)) => issued,
            Ok(None) => {
                info!(
                    request_id = %request.id,
                    stage = %open.stage,
                    "Request left the stage before its links were issued"
                );
                return Vec::new();
            }
            Err(err) => {
                warn!(request_id = %request.id, error = %err, "Could not issue approval tokens");
                Vec::new()
            }
        };

        recipients
            .into_iter()
            .map(|recipient| {
                let tokens: Vec<IssuedToken> = issued
                    .iter()
                    .filter(|t| t.approver_id == recipient)
                    .cloned()
                    .collect();
                self.notification(NotificationKind::ApprovalRequested, request, recipient, tokens)
            })
            .collect()
    }

    /// Issues the stage's tokens while the books are locked, so a later
    /// transition cannot interleave. Returns `None` when the request no
    /// longer waits on `open.stage`.
    fn issue_if_waiting(
        &self,
        request: &LeaveRequest,
        open: OpenStage,
        grants: &[(EmployeeId, TokenAction)],
    ) -> EngineResult<Option<Vec<IssuedToken>>> {
        let books = self.books()?;
        let waiting = books
            .requests
            .get(&request.id)
            .is_some_and(|current| current.state == policy::state_for_stage(open.stage));
        if !waiting {
            return Ok(None);
        }
        self.tokens.issue_batch(request.id, grants).map(Some)
    }

    fn notification(
        &self,
        kind: NotificationKind,
        request: &LeaveRequest,
        recipient: EmployeeId,
        tokens: Vec<IssuedToken>,
    ) -> Notification {
        let recipient_email = match self.directory.employee(recipient) {
            Ok(employee) => employee.map(|e| e.email),
            Err(err) => {
                warn!(recipient = %recipient, error = %err, "Could not look up recipient");
                None
            }
        };
        Notification {
            kind,
            request_id: request.id,
            recipient,
            recipient_email,
            tokens,
        }
    }
}
