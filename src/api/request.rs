//! Request types for the Leave Engine API.
//!
//! Request creation and editing reuse [`NewLeaveRequest`] and
//! [`RevisedLeaveRequest`] directly; only the decision body is API-specific.
//!
//! [`NewLeaveRequest`]: crate::models::NewLeaveRequest
//! [`RevisedLeaveRequest`]: crate::models::RevisedLeaveRequest

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::models::EmployeeId;

/// Header carrying the acting employee's id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Body of approve, reject and token decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Approver comments; mandatory for rejections.
    #[serde(default)]
    pub comment: String,
}

/// Reads the acting employee from the `x-actor-id` header.
pub fn actor_from(headers: &HeaderMap) -> Option<EmployeeId> {
    headers
        .get(ACTOR_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
