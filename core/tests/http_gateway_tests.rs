//! HttpGateway against a local axum server

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use dashboard_core::gateway::{CatalogSource, FetchGateway, GatewayError, HttpGateway};
use dashboard_core::panels::{PanelDriver, SliceView};
use dashboard_types::{
    ChartWindow, ControlBarState, FieldConfig, FieldKind, KvOption, QuerySnapshot,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::LocalSet;

type RequestLog = Arc<Mutex<Vec<(&'static str, Value)>>>;

async fn table(State(log): State<RequestLog>, Json(body): Json<Value>) -> Response {
    let broken = body["field"] == "broken";
    log.lock().unwrap().push(("table", body));
    if broken {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "table exploded" })),
        )
            .into_response();
    }
    Json(json!([
        { "region": "EMEA", "asofValue": 1200.0, "prevValue": 1000.0, "change": 200.0, "changePct": 20.0 },
        { "region": "APAC", "asofValue": 800.0, "prevValue": null, "change": null, "changePct": null },
    ]))
    .into_response()
}

async fn trend(State(log): State<RequestLog>, Json(body): Json<Value>) -> Response {
    let garbled = body["categoryField"] == "garbled";
    log.lock().unwrap().push(("trend", body));
    if garbled {
        return Json(json!({ "rows": "not a list" })).into_response();
    }
    Json(json!([
        { "date": "2024-02-13", "category": "EMEA", "value": 10.0 },
        { "date": "2024-02-14", "category": "EMEA", "value": 12.5 },
    ]))
    .into_response()
}

async fn fields() -> Json<Value> {
    Json(json!([
        { "field": "region", "label": "Region", "type": "categorical" },
        { "field": "revenue", "label": "Revenue", "type": "value" },
    ]))
}

async fn filter_options() -> Json<Value> {
    Json(json!([
        { "key": "region", "value": "EMEA" },
        { "key": "region", "value": "APAC" },
    ]))
}

async fn spawn_server() -> (String, RequestLog) {
    let log = RequestLog::default();
    let app = Router::new()
        .route("/query/table", post(table))
        .route("/query/trend", post(trend))
        .route("/catalog/fields", get(fields))
        .route("/catalog/filter-options", get(filter_options))
        .with_state(Arc::clone(&log));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), log)
}

fn make_gateway(base_url: &str) -> HttpGateway {
    HttpGateway::new(base_url, Duration::from_secs(5), "total_revenue").unwrap()
}

fn dated_snapshot(fields: Vec<FieldConfig>) -> QuerySnapshot {
    ControlBarState {
        asof_date: NaiveDate::from_ymd_opt(2024, 2, 14),
        prev_date: NaiveDate::from_ymd_opt(2024, 2, 13),
        filters: vec![KvOption::new("region", "EMEA")],
        exclusions: vec![],
        chart_window: ChartWindow::Days30,
        measure: Some("revenue".to_string()),
        field_configs: fields,
    }
    .to_snapshot()
    .unwrap()
}

#[tokio::test]
async fn test_fetch_table_posts_comparison_body() {
    let (base, log) = spawn_server().await;
    let gateway = make_gateway(&format!("{base}/"));
    let snapshot = dated_snapshot(vec![FieldConfig::table("region")]);

    let rows = gateway.fetch_table(&snapshot, "region").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["asofValue"].as_f64(), Some(1200.0));
    assert_eq!(rows[1]["region"].as_str(), Some("APAC"));

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    let (route, body) = &log[0];
    assert_eq!(*route, "table");
    assert_eq!(body["field"], "region");
    assert_eq!(body["measure"], "revenue");
    assert_eq!(body["asofDate"], "2024-02-14");
    assert_eq!(body["prevDate"], "2024-02-13");
    assert_eq!(body["filters"], json!({ "region": ["EMEA"] }));
}

#[tokio::test]
async fn test_fetch_chart_posts_window_range() {
    let (base, log) = spawn_server().await;
    let gateway = make_gateway(&base);
    let snapshot = dated_snapshot(vec![FieldConfig::chart("region")]);

    let points = gateway.fetch_chart(&snapshot, "region").await.unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1].value, 12.5);

    let log = log.lock().unwrap();
    let (route, body) = &log[0];
    assert_eq!(*route, "trend");
    assert_eq!(body["categoryField"], "region");
    assert_eq!(body["startDate"], "2024-01-15");
    assert_eq!(body["endDate"], "2024-02-14");
}

#[tokio::test]
async fn test_missing_dates_skip_the_request() {
    let (base, log) = spawn_server().await;
    let gateway = make_gateway(&base);
    let snapshot = QuerySnapshot::with_fields(vec![FieldConfig::new("region", true, true)]).unwrap();

    assert!(gateway.fetch_table(&snapshot, "region").await.unwrap().is_empty());
    assert!(gateway.fetch_chart(&snapshot, "region").await.unwrap().is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let (base, _log) = spawn_server().await;
    let gateway = make_gateway(&base);
    let snapshot = dated_snapshot(vec![FieldConfig::table("broken")]);

    let err = gateway.fetch_table(&snapshot, "broken").await.unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 500, .. }));
    assert_eq!(
        err.to_string(),
        "POST /query/table failed (500): table exploded"
    );
}

#[tokio::test]
async fn test_unknown_route_falls_back_to_reason_phrase() {
    let (base, _log) = spawn_server().await;
    let gateway = make_gateway(&format!("{base}/v2"));

    let err = gateway.catalog_fields().await.unwrap_err();
    assert_eq!(err.to_string(), "GET /catalog/fields failed (404): Not Found");
}

#[tokio::test]
async fn test_unexpected_payload_is_decode_error() {
    let (base, _log) = spawn_server().await;
    let gateway = make_gateway(&base);
    let snapshot = dated_snapshot(vec![FieldConfig::chart("garbled")]);

    let err = gateway.fetch_chart(&snapshot, "garbled").await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let gateway = make_gateway("http://127.0.0.1:1");
    let err = gateway.filter_options().await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport { method: "GET", .. }));
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let (base, _log) = spawn_server().await;
    let gateway = make_gateway(&base);

    let fields = gateway.catalog_fields().await.unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[1].kind, FieldKind::Value);

    let options = gateway.filter_options().await.unwrap();
    assert_eq!(options, vec![KvOption::new("region", "EMEA"), KvOption::new("region", "APAC")]);
}

#[tokio::test]
async fn test_driver_end_to_end() {
    let (base, _log) = spawn_server().await;
    LocalSet::new()
        .run_until(async {
            let driver = PanelDriver::new(make_gateway(&base), 2);
            let run = driver.apply(Arc::new(dated_snapshot(vec![
                FieldConfig::new("region", true, true),
                FieldConfig::table("broken"),
            ])));
            assert_eq!(run.fetch_count(), 3);
            run.finished().await;

            let board = driver.board();
            assert!(!board.is_loading());
            let region = board.get("region").unwrap();
            assert!(matches!(region.table_view(), SliceView::Populated(r) if r.len() == 2));
            assert!(matches!(region.chart_view(), SliceView::Populated(p) if p.len() == 2));

            let broken = board.get("broken").unwrap();
            assert_eq!(
                broken.table_view(),
                SliceView::Error("POST /query/table failed (500): table exploded")
            );
            assert_eq!(broken.chart_view(), SliceView::Absent);
        })
        .await;
}
