//! HTTP request handlers for the Leave Engine API.
//!
//! Every handler tags its work with a correlation id, resolves the acting
//! employee from the `x-actor-id` header and delegates to the engine.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{EmployeeId, NewLeaveRequest, RequestId, RevisedLeaveRequest};
use crate::workflow::Action;

use super::request::{DecisionRequest, actor_from};
use super::response::{ApiError, ApiErrorResponse, BalanceResponse};
use super::state::AppState;

type ApiResult = Result<Response, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/requests", post(create_request))
        .route(
            "/requests/:id",
            get(get_request).put(revise_request).delete(delete_request),
        )
        .route("/requests/:id/submit", post(submit_request))
        .route("/requests/:id/approve", post(approve_request))
        .route("/requests/:id/reject", post(reject_request))
        .route("/requests/:id/cancel", post(cancel_request))
        .route("/requests/:id/approvals", get(list_approvals))
        .route("/approvals/pending", get(pending_approvals))
        .route("/employees/:id/balance", get(employee_balance))
        .route("/employees/:id/requests", get(employee_requests))
        .route("/tokens/:token", post(redeem_token))
        .with_state(state)
}

fn require_actor(headers: &HeaderMap) -> Result<EmployeeId, ApiErrorResponse> {
    actor_from(headers).ok_or_else(ApiErrorResponse::missing_actor)
}

fn parse_id<T: FromStr>(name: &str, raw: &str) -> Result<T, ApiErrorResponse> {
    raw.parse().map_err(|_| {
        ApiErrorResponse::bad_request(ApiError::new(
            "VALIDATION_ERROR",
            format!("Invalid {}: '{}' is not a uuid", name, raw),
        ))
    })
}

/// Logs the outcome of an engine call and turns it into a response.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    status: StatusCode,
    result: EngineResult<T>,
) -> ApiResult {
    match result {
        Ok(body) => {
            info!(correlation_id = %correlation_id, operation, "Request completed");
            Ok((status, Json(body)).into_response())
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                kind = ?err.kind(),
                error = %err,
                "Request failed"
            );
            Err(err.into())
        }
    }
}

/// Handler for POST /requests.
async fn create_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewLeaveRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let actor = require_actor(&headers)?;
    let Json(new_request) = payload?;
    info!(correlation_id = %correlation_id, actor = %actor, "Creating leave request");
    let result = state.engine().create_request(actor, new_request);
    respond(correlation_id, "create_request", StatusCode::CREATED, result)
}

/// Handler for GET /requests/:id.
async fn get_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    require_actor(&headers)?;
    let id: RequestId = parse_id("request id", &id)?;
    respond(correlation_id, "get_request", StatusCode::OK, state.engine().request(id))
}

/// Handler for PUT /requests/:id.
async fn revise_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<RevisedLeaveRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let actor = require_actor(&headers)?;
    let id: RequestId = parse_id("request id", &id)?;
    let Json(revision) = payload?;
    let result = state.engine().revise_draft(actor, id, revision);
    respond(correlation_id, "revise_request", StatusCode::OK, result)
}

/// Handler for DELETE /requests/:id.
async fn delete_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let actor = require_actor(&headers)?;
    let id: RequestId = parse_id("request id", &id)?;
    let result = state.engine().delete_request(actor, id);
    respond(correlation_id, "delete_request", StatusCode::OK, result)
}

async fn transition(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    action: Action,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let actor = require_actor(headers)?;
    let id: RequestId = parse_id("request id", id)?;
    info!(
        correlation_id = %correlation_id,
        actor = %actor,
        request_id = %id,
        action = action.verb(),
        "Applying transition"
    );
    let result = state.engine().apply(actor, id, &action);
    respond(correlation_id, action.verb(), StatusCode::OK, result)
}

/// Handler for POST /requests/:id/submit.
async fn submit_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    transition(&state, &headers, &id, Action::Submit).await
}

/// Handler for POST /requests/:id/approve. The body is optional.
async fn approve_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Option<Json<DecisionRequest>>,
) -> ApiResult {
    let Json(body) = payload.unwrap_or_default();
    let action = Action::Approve {
        comment: body.comment,
    };
    transition(&state, &headers, &id, action).await
}

/// Handler for POST /requests/:id/reject.
async fn reject_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Option<Json<DecisionRequest>>,
) -> ApiResult {
    let Json(body) = payload.unwrap_or_default();
    let action = Action::Reject {
        comment: body.comment,
    };
    transition(&state, &headers, &id, action).await
}

/// Handler for POST /requests/:id/cancel.
async fn cancel_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    transition(&state, &headers, &id, Action::Cancel).await
}

/// Handler for GET /requests/:id/approvals.
async fn list_approvals(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    require_actor(&headers)?;
    let id: RequestId = parse_id("request id", &id)?;
    let result = state.engine().approvals_for(id);
    respond(correlation_id, "list_approvals", StatusCode::OK, result)
}

/// Handler for GET /approvals/pending.
async fn pending_approvals(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let actor = require_actor(&headers)?;
    let result = state.engine().pending_for(actor);
    respond(correlation_id, "pending_approvals", StatusCode::OK, result)
}

/// Handler for GET /employees/:id/balance.
async fn employee_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    require_actor(&headers)?;
    let employee_id: EmployeeId = parse_id("employee id", &id)?;
    let engine = state.engine();
    let result = engine.balance(employee_id).and_then(|balance| {
        Ok(BalanceResponse {
            employee_id,
            balance,
            periods: engine.periods_for(employee_id)?,
        })
    });
    respond(correlation_id, "employee_balance", StatusCode::OK, result)
}

/// Handler for GET /employees/:id/requests.
async fn employee_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    require_actor(&headers)?;
    let employee_id: EmployeeId = parse_id("employee id", &id)?;
    let result = state.engine().requests_for(employee_id);
    respond(correlation_id, "employee_requests", StatusCode::OK, result)
}

/// Handler for POST /tokens/:token. The token itself identifies the
/// approver, so no actor header is needed.
async fn redeem_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Option<Json<DecisionRequest>>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Json(body) = payload.unwrap_or_default();
    let result = state.engine().decide_by_token(&token, &body.comment);
    respond(correlation_id, "redeem_token", StatusCode::OK, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::directory::InMemoryDirectory;
    use crate::engine::LeaveEngine;
    use crate::models::{Employee, Role};
    use crate::notify::{NotificationDispatcher, RecordingNotifier};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> (AppState, Employee) {
        let directory = Arc::new(InMemoryDirectory::new());
        let ana = Employee::new("Ana", "ana@example.com", Role::Employee);
        directory.insert(ana.clone()).unwrap();
        let dispatcher = NotificationDispatcher::inline(Arc::new(RecordingNotifier::new()));
        let engine = LeaveEngine::with_dispatcher(EngineConfig::default(), directory, dispatcher);
        (AppState::new(Arc::new(engine)), ana)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_missing_actor_returns_401() {
        let (state, _) = create_test_state();
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/approvals/pending")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "MISSING_ACTOR");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let (state, ana) = create_test_state();
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/requests")
                    .header("content-type", "application/json")
                    .header("x-actor-id", ana.id.to_string())
                    .body(Body::from("{ not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_bad_request_id_returns_400() {
        let (state, ana) = create_test_state();
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/requests/42")
                    .header("x-actor-id", ana.id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_request_returns_404() {
        let (state, ana) = create_test_state();
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri(format!("/requests/{}", RequestId::new()))
                    .header("x-actor-id", ana.id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_token_returns_410() {
        let (state, _) = create_test_state();
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tokens/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
    }
}
