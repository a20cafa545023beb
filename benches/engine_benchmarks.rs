//! Performance benchmarks for the Leave Engine.
//!
//! Covers the chargeable-day rule over ranges of increasing length, a full
//! create/submit/approve/approve/delete cycle through the engine, and a
//! balance lookup through the HTTP router.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use leave_engine::api::{AppState, create_router};
use leave_engine::calculation::chargeable_days;
use leave_engine::config::EngineConfig;
use leave_engine::directory::InMemoryDirectory;
use leave_engine::engine::LeaveEngine;
use leave_engine::models::{Employee, NewLeaveRequest, PeriodId, Role};
use leave_engine::notify::{LogNotifier, NotificationDispatcher};

use axum::{body::Body, http::Request};
use tower::ServiceExt;

struct Office {
    engine: Arc<LeaveEngine>,
    admin: Employee,
    accountant: Employee,
    boss: Employee,
    ana: Employee,
    period: PeriodId,
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Builds an engine with one employee reporting to a manager and a period
/// large enough that no cycle ever runs out of days.
fn create_office() -> Office {
    let directory = Arc::new(InMemoryDirectory::new());
    let admin = Employee::new("Adriana", "adriana@example.com", Role::Admin);
    let accountant = Employee::new("Marta", "marta@example.com", Role::Accountant);
    let boss = Employee::new("Jorge", "jorge@example.com", Role::Manager);
    let ana = Employee::new("Ana", "ana@example.com", Role::Employee).reporting_to(boss.id);
    for employee in [&admin, &accountant, &boss, &ana] {
        directory.insert(employee.clone()).unwrap();
    }

    let dispatcher = NotificationDispatcher::inline(Arc::new(LogNotifier));
    let engine = LeaveEngine::with_dispatcher(EngineConfig::default(), directory, dispatcher);
    let period = engine
        .provision_period(
            ana.id,
            date("2025-01-01"),
            date("2025-12-31"),
            Decimal::from_str("1000").unwrap(),
        )
        .unwrap()
        .id();

    Office {
        engine: Arc::new(engine),
        admin,
        accountant,
        boss,
        ana,
        period,
    }
}

/// Benchmark: chargeable days over ranges from one day to a full year.
fn bench_chargeable_days(c: &mut Criterion) {
    let start = date("2025-01-06");
    let mut group = c.benchmark_group("chargeable_days");

    for span in [1i64, 5, 14, 31, 365].iter() {
        let end = start + Duration::days(span - 1);
        group.throughput(Throughput::Elements(*span as u64));
        group.bench_with_input(BenchmarkId::new("days", span), span, |b, _| {
            b.iter(|| black_box(chargeable_days(black_box(start), black_box(end))))
        });
    }

    group.finish();
}

/// Benchmark: a request through both approval stages, then deleted so the
/// ledger and request store stay the same size between iterations.
fn bench_approval_cycle(c: &mut Criterion) {
    let office = create_office();
    let new_request = NewLeaveRequest {
        period_id: office.period,
        start_date: date("2025-08-11"),
        end_date: date("2025-08-15"),
        days: None,
        notes: String::new(),
    };

    c.bench_function("approval_cycle", |b| {
        b.iter(|| {
            let engine = &office.engine;
            let draft = engine
                .create_request(office.ana.id, new_request.clone())
                .unwrap();
            engine.submit(office.ana.id, draft.id).unwrap();
            engine.approve(office.boss.id, draft.id, "").unwrap();
            let approved = engine.approve(office.accountant.id, draft.id, "").unwrap();
            engine.delete_request(office.admin.id, draft.id).unwrap();
            black_box(approved)
        })
    });
}

/// Benchmark: balance lookup through the HTTP router.
fn bench_balance_endpoint(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let office = create_office();
    let router = create_router(AppState::new(office.engine.clone()));
    let uri = format!("/employees/{}/balance", office.ana.id);
    let actor = office.ana.id.to_string();

    c.bench_function("balance_endpoint", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .uri(uri.as_str())
                        .header("x-actor-id", actor.as_str())
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_chargeable_days,
    bench_approval_cycle,
    bench_balance_endpoint,
);
criterion_main!(benches);
