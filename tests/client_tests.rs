//! HTTP client against an in-process mock of the combat service.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use combat_viewer::client::{ClientError, CombatService, HttpCombatClient};

fn fixture_body() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("ten_turn_report.json");
    std::fs::read_to_string(path).expect("read fixture")
}

async fn spawn_service(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock service");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

fn client(base_url: &str, timeout: Duration) -> HttpCombatClient {
    HttpCombatClient::new(base_url, timeout).expect("client builds")
}

type Calls = Arc<Mutex<Vec<String>>>;

async fn record_simulate(
    State(calls): State<Calls>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    let turns = params.get("turns").cloned().unwrap_or_default();
    calls.lock().expect("calls lock").push(format!("simulate:{turns}"));
    StatusCode::OK
}

async fn serve_fixture(State(calls): State<Calls>) -> impl IntoResponse {
    calls.lock().expect("calls lock").push("report".to_string());
    ([(header::CONTENT_TYPE, "application/json")], fixture_body())
}

#[tokio::test]
async fn simulate_then_fetch_report_round_trip() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/combat/simulate", post(record_simulate))
        .route("/combat/report", get(serve_fixture))
        .with_state(Arc::clone(&calls));
    let base = spawn_service(router).await;
    let client = client(&base, Duration::from_secs(5));

    client.simulate(12).await.expect("simulate succeeds");
    let report = client.fetch_report().await.expect("report succeeds");

    assert_eq!(report.total_turns, 10);
    assert_eq!(report.timeline.len(), 10);
    assert_eq!(report.characters.len(), 2);
    assert_eq!(
        *calls.lock().expect("calls lock"),
        vec!["simulate:12".to_string(), "report".to_string()]
    );
}

#[tokio::test]
async fn non_success_simulate_is_simulation_failed() {
    let router = Router::new().route(
        "/combat/simulate",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base = spawn_service(router).await;

    let err = client(&base, Duration::from_secs(5))
        .simulate(10)
        .await
        .expect_err("500 should fail");
    assert!(matches!(err, ClientError::SimulationFailed { status: 500 }));
    assert_eq!(err.to_string(), "Simulation failed");
}

#[tokio::test]
async fn missing_report_is_report_fetch_failed() {
    let router = Router::new().route("/combat/simulate", post(|| async { StatusCode::OK }));
    let base = spawn_service(router).await;

    let err = client(&base, Duration::from_secs(5))
        .fetch_report()
        .await
        .expect_err("404 should fail");
    assert!(matches!(err, ClientError::ReportFetchFailed { status: 404 }));
    assert_eq!(err.to_string(), "Failed to fetch report");
}

#[tokio::test]
async fn malformed_report_body_is_invalid_report() {
    let router = Router::new().route("/combat/report", get(|| async { "{\"total_turns\": " }));
    let base = spawn_service(router).await;

    let err = client(&base, Duration::from_secs(5))
        .fetch_report()
        .await
        .expect_err("truncated json should fail");
    assert!(matches!(err, ClientError::InvalidReport(_)));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let err = client(&format!("http://{addr}"), Duration::from_secs(5))
        .simulate(10)
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_service_times_out() {
    let router = Router::new().route(
        "/combat/simulate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let base = spawn_service(router).await;

    let err = client(&base, Duration::from_millis(100))
        .simulate(10)
        .await
        .expect_err("should time out");
    assert!(matches!(err, ClientError::Timeout(_)), "got {err:?}");
}
