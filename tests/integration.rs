//! Integration tests for the Leave Engine HTTP API.
//!
//! The router is built over the bundled `./config/default` configuration
//! and seed data, with notifications captured in memory so approval links
//! can be redeemed. Covered here:
//! - The two-stage approval chain and the resulting balance
//! - Routing straight to the accountant when there is no manager
//! - Approval link redemption and replay
//! - Rejection, cancellation and deletion
//! - Error statuses

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use leave_engine::api::{AppState, create_router};
use leave_engine::config::ConfigLoader;
use leave_engine::directory::InMemoryDirectory;
use leave_engine::engine::LeaveEngine;
use leave_engine::models::{EmployeeId, PeriodId, TokenAction};
use leave_engine::notify::{NotificationDispatcher, NotificationKind, RecordingNotifier};

// =============================================================================
// Test Helpers
// =============================================================================

const ADMIN: &str = "3b0f5c2a-6d7e-4a51-9f3c-0e1d2a3b4c01";
const ACCOUNTANT: &str = "3b0f5c2a-6d7e-4a51-9f3c-0e1d2a3b4c02";
const MANAGER: &str = "3b0f5c2a-6d7e-4a51-9f3c-0e1d2a3b4c03";
const ANA: &str = "3b0f5c2a-6d7e-4a51-9f3c-0e1d2a3b4c04";
const LUIS: &str = "3b0f5c2a-6d7e-4a51-9f3c-0e1d2a3b4c05";

struct TestApp {
    engine: Arc<LeaveEngine>,
    notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    fn new() -> Self {
        let (config, seed) = ConfigLoader::load("./config/default")
            .expect("Failed to load config")
            .into_parts();
        let directory = Arc::new(InMemoryDirectory::new());
        for employee in &seed.employees {
            directory.insert(employee.to_employee()).unwrap();
        }
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = NotificationDispatcher::inline(notifier.clone());
        let engine = LeaveEngine::with_dispatcher(config, directory, dispatcher);
        for period in &seed.periods {
            engine
                .provision_period(
                    period.employee_id,
                    period.start_date,
                    period.end_date,
                    period.earned,
                )
                .unwrap();
        }
        Self {
            engine: Arc::new(engine),
            notifier,
        }
    }

    fn router(&self) -> Router {
        create_router(AppState::new(self.engine.clone()))
    }

    fn period_of(&self, employee: &str) -> PeriodId {
        self.engine.periods_for(employee_id(employee)).unwrap()[0].id()
    }

    fn link_for(&self, request_id: &str, approver: &str, action: TokenAction) -> String {
        self.notifier
            .sent_of(NotificationKind::ApprovalRequested)
            .into_iter()
            .rev()
            .filter(|n| {
                n.request_id.to_string() == request_id && n.recipient == employee_id(approver)
            })
            .flat_map(|n| n.tokens)
            .find(|t| t.action == action)
            .map(|t| t.token)
            .expect("approver should have received a link")
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        actor: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header("x-actor-id", actor);
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    async fn create(&self, actor: &str, start: &str, end: &str) -> (StatusCode, Value) {
        let body = json!({
            "period_id": self.period_of(actor),
            "start_date": start,
            "end_date": end,
            "notes": "family trip"
        });
        self.send("POST", "/requests", Some(actor), Some(body)).await
    }

    async fn submitted(&self, actor: &str, start: &str, end: &str) -> String {
        let (status, created) = self.create(actor, start, end).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
        let id = created["id"].as_str().unwrap().to_string();
        let (status, _) = self
            .send("POST", &format!("/requests/{id}/submit"), Some(actor), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }
}

fn employee_id(raw: &str) -> EmployeeId {
    raw.parse().unwrap()
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimals serialize as strings")).unwrap()
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_two_stage_approval_debits_balance() {
    let app = TestApp::new();

    let (status, created) = app.create(ANA, "2025-08-11", "2025-08-15").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["state"], "draft");
    assert_eq!(created["chargeable_days"], 7);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send("POST", &format!("/requests/{id}/submit"), Some(ANA), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "pending_manager");

    let (status, pending) = app.send("GET", "/approvals/pending", Some(MANAGER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"], id.as_str());

    let (status, body) = app
        .send("POST", &format!("/requests/{id}/approve"), Some(MANAGER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "pending_accountant");

    let (status, body) = app
        .send(
            "POST",
            &format!("/requests/{id}/approve"),
            Some(ACCOUNTANT),
            Some(json!({"comment": "enjoy"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "approved");

    let (status, balance) = app
        .send("GET", &format!("/employees/{ANA}/balance"), Some(ANA), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&balance["balance"]["earned"]), Decimal::from(15));
    assert_eq!(decimal(&balance["balance"]["consumed"]), Decimal::from(7));
    assert_eq!(decimal(&balance["balance"]["outstanding"]), Decimal::from(8));
    assert_eq!(balance["periods"][0]["state"], "partial");

    let (status, approvals) = app
        .send("GET", &format!("/requests/{id}/approvals"), Some(ANA), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let approvals = approvals.as_array().unwrap();
    assert_eq!(approvals.len(), 2);
    assert!(approvals.iter().all(|a| a["state"] == "approved"));
}

#[tokio::test]
async fn test_employee_without_manager_goes_to_accountant() {
    let app = TestApp::new();
    let id = app.submitted(LUIS, "2025-09-01", "2025-09-03").await;

    let (_, body) = app.send("GET", &format!("/requests/{id}"), Some(LUIS), None).await;
    assert_eq!(body["state"], "pending_accountant");

    let (_, pending) = app.send("GET", "/approvals/pending", Some(MANAGER), None).await;
    assert!(pending.as_array().unwrap().is_empty());

    let (status, body) = app
        .send("POST", &format!("/requests/{id}/approve"), Some(ACCOUNTANT), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "approved");

    let (_, balance) = app
        .send("GET", &format!("/employees/{LUIS}/balance"), Some(LUIS), None)
        .await;
    assert_eq!(
        decimal(&balance["balance"]["outstanding"]),
        Decimal::from_str("9.5").unwrap()
    );
}

#[tokio::test]
async fn test_approval_link_is_single_use() {
    let app = TestApp::new();
    let id = app.submitted(ANA, "2025-08-11", "2025-08-12").await;

    let link = app.link_for(&id, MANAGER, TokenAction::Approve);
    let (status, body) = app
        .send("POST", &format!("/tokens/{link}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "pending_accountant");

    let (status, body) = app
        .send("POST", &format!("/tokens/{link}"), None, None)
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "INVALID_OR_EXPIRED_TOKEN");

    let reject = app.link_for(&id, ACCOUNTANT, TokenAction::Reject);
    let (status, body) = app
        .send(
            "POST",
            &format!("/tokens/{reject}"),
            None,
            Some(json!({"comment": "month end close"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "rejected");
}

#[tokio::test]
async fn test_reject_requires_comment() {
    let app = TestApp::new();
    let id = app.submitted(ANA, "2025-08-11", "2025-08-12").await;
    let uri = format!("/requests/{id}/reject");

    let (status, body) = app.send("POST", &uri, Some(MANAGER), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send("POST", &uri, Some(MANAGER), Some(json!({"comment": "team offsite"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "rejected");

    let (_, balance) = app
        .send("GET", &format!("/employees/{ANA}/balance"), Some(ANA), None)
        .await;
    assert_eq!(decimal(&balance["balance"]["consumed"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_cancelled_request_cannot_be_approved() {
    let app = TestApp::new();
    let id = app.submitted(ANA, "2025-08-11", "2025-08-12").await;

    let (status, body) = app
        .send("POST", &format!("/requests/{id}/cancel"), Some(ANA), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "cancelled");

    let (status, body) = app
        .send("POST", &format!("/requests/{id}/approve"), Some(MANAGER), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let link = app.link_for(&id, MANAGER, TokenAction::Approve);
    let (status, _) = app
        .send("POST", &format!("/tokens/{link}"), None, None)
        .await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn test_admin_delete_of_approved_request_restores_balance() {
    let app = TestApp::new();
    let id = app.submitted(LUIS, "2025-09-01", "2025-09-03").await;
    app.send("POST", &format!("/requests/{id}/approve"), Some(ACCOUNTANT), None)
        .await;

    let (status, _) = app
        .send("DELETE", &format!("/requests/{id}"), Some(LUIS), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("DELETE", &format!("/requests/{id}"), Some(ADMIN), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("GET", &format!("/requests/{id}"), Some(LUIS), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, balance) = app
        .send("GET", &format!("/employees/{LUIS}/balance"), Some(LUIS), None)
        .await;
    assert_eq!(
        decimal(&balance["balance"]["outstanding"]),
        Decimal::from_str("12.5").unwrap()
    );
}

#[tokio::test]
async fn test_draft_revision_recomputes_days() {
    let app = TestApp::new();
    let (_, created) = app.create(ANA, "2025-08-11", "2025-08-12").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            "PUT",
            &format!("/requests/{id}"),
            Some(ANA),
            Some(json!({"end_date": "2025-08-15"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chargeable_days"], 7);

    let (_, listed) = app
        .send("GET", &format!("/employees/{ANA}/requests"), Some(ANA), None)
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_insufficient_balance_returns_409() {
    let app = TestApp::new();
    let (status, body) = app.create(LUIS, "2025-08-04", "2025-08-22").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_BALANCE");
}

#[tokio::test]
async fn test_inverted_range_returns_400() {
    let app = TestApp::new();
    let (status, body) = app.create(ANA, "2025-08-15", "2025-08-11").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_overlapping_request_returns_400() {
    let app = TestApp::new();
    app.submitted(ANA, "2025-08-11", "2025-08-13").await;
    let (status, _) = app.create(ANA, "2025-08-13", "2025-08-14").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_owner_cannot_approve_own_request() {
    let app = TestApp::new();
    let id = app.submitted(ANA, "2025-08-11", "2025-08-12").await;
    let (status, body) = app
        .send("POST", &format!("/requests/{id}/approve"), Some(ANA), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn test_double_submit_returns_409() {
    let app = TestApp::new();
    let id = app.submitted(ANA, "2025-08-11", "2025-08-12").await;
    let (status, _) = app
        .send("POST", &format!("/requests/{id}/submit"), Some(ANA), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_actor_header_returns_401() {
    let app = TestApp::new();
    let body = json!({
        "period_id": app.period_of(ANA),
        "start_date": "2025-08-11",
        "end_date": "2025-08-12"
    });
    let (status, body) = app.send("POST", "/requests", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_ACTOR");
}
