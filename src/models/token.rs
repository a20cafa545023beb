//! Approval token models.
//!
//! The raw token only ever exists in an [`IssuedToken`] handed to the
//! notification layer; the stored [`ApprovalToken`] keeps its SHA-256 hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmployeeId, RequestId, TokenId};

/// What redeeming a token does to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAction {
    /// Approve the current stage.
    Approve,
    /// Reject the request.
    Reject,
}

impl std::fmt::Display for TokenAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenAction::Approve => write!(f, "approve"),
            TokenAction::Reject => write!(f, "reject"),
        }
    }
}

/// Lifecycle of a stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Redeemable.
    Active,
    /// Being redeemed; not redeemable until released or consumed.
    Claimed,
    /// Redeemed successfully.
    Used,
    /// Replaced by a later issuance for the same request.
    Superseded,
    /// Invalidated because the request closed or was deleted.
    Revoked,
}

/// A stored single-use credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalToken {
    /// Token identifier.
    pub id: TokenId,
    /// The request the token acts on.
    pub request_id: RequestId,
    /// The approver the token acts as.
    pub approver_id: EmployeeId,
    /// The action the token performs.
    pub action: TokenAction,
    /// SHA-256 of the raw token, URL-safe base64.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Issue instant.
    pub issued_at: DateTime<Utc>,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Current status.
    pub status: TokenStatus,
}

impl ApprovalToken {
    /// Returns true if the token can be redeemed at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == TokenStatus::Active && now < self.expires_at
    }
}

/// A freshly issued token, including its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Token identifier.
    pub id: TokenId,
    /// The raw secret to embed in the link.
    pub token: String,
    /// The approver the token acts as.
    pub approver_id: EmployeeId,
    /// The action the token performs.
    pub action: TokenAction,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// What a valid token authorises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Token identifier, used to consume or release a claim.
    pub token_id: TokenId,
    /// The request the token acts on.
    pub request_id: RequestId,
    /// The approver the token acts as.
    pub approver_id: EmployeeId,
    /// The action the token performs.
    pub action: TokenAction,
}
