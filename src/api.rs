// 🌐 JSON API - read-only views over one loaded dataset

use crate::alerts::collect_alerts;
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::EngineError;
use crate::graph::{build_supply_chain_graph, EdgeView, SupplyChainGraph, SupplyNode};
use crate::metrics::{detect_bottlenecks, MetricsReport};
use crate::quality::DataQualityEngine;
use crate::report::AnalyticsReport;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    dataset: Arc<Dataset>,
    graph: Arc<SupplyChainGraph>,
    config: EngineConfig,
    /// Fixed reference day for alerts; `None` = today
    as_of: Option<NaiveDate>,
}

impl AppState {
    pub fn new(dataset: Dataset, config: EngineConfig) -> Self {
        let graph = build_supply_chain_graph(
            &dataset.transactions,
            &dataset.batches,
            &dataset.logistics,
        );
        AppState {
            dataset: Arc::new(dataset),
            graph: Arc::new(graph),
            config,
            as_of: None,
        }
    }

    /// Builder pattern: pin the alert reference day
    pub fn with_as_of(mut self, day: NaiveDate) -> Self {
        self.as_of = Some(day);
        self
    }

    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(message),
    };
    (status, Json(body)).into_response()
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct TraceResponse {
    batch_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch: Option<SupplyNode>,
    steps: Vec<EdgeView>,
}

#[derive(Debug, Deserialize)]
pub struct BottleneckQuery {
    factor: Option<f64>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok(HealthResponse {
        status: "OK",
        version: crate::VERSION,
    })
}

/// GET /api/report - Full analytics report
async fn get_report(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(AnalyticsReport::from_graph(
        &state.dataset,
        &state.graph,
        &state.config,
        state.today(),
    ))
}

/// GET /api/graph - Graph statistics
async fn get_graph(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(state.graph.stats())
}

/// GET /api/graph/dot - Graphviz rendering
async fn get_graph_dot(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(state.graph.to_dot())
}

/// GET /api/metrics - Finance and logistics metrics
async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(MetricsReport::compute(
        &state.dataset.transactions,
        &state.dataset.logistics,
    ))
}

/// GET /api/bottlenecks?factor=2.0 - Slow logistics legs
async fn get_bottlenecks(
    State(state): State<AppState>,
    query: Result<Query<BottleneckQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let config = match query.factor {
        Some(factor) => match EngineConfig::new(factor) {
            Ok(config) => config,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        },
        None => state.config,
    };

    ApiResponse::ok(detect_bottlenecks(
        &state.dataset.logistics,
        config.bottleneck_factor,
    ))
    .into_response()
}

/// GET /api/alerts - Overdue payments and delayed shipments
async fn get_alerts(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(collect_alerts(&state.dataset, state.today()))
}

/// GET /api/quality - Data quality report
async fn get_quality(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(DataQualityEngine::new().validate(&state.dataset))
}

/// GET /api/batches/:batch_id/trace - Chronological path of one batch
async fn get_batch_trace(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Response {
    match state.graph.batch_trace(&batch_id) {
        Ok(steps) => ApiResponse::ok(TraceResponse {
            batch: state.graph.node(&batch_id).cloned(),
            batch_id,
            steps,
        })
        .into_response(),
        Err(e @ EngineError::BatchNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e) => {
            tracing::error!("Error tracing batch {}: {}", batch_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/report", get(get_report))
        .route("/graph", get(get_graph))
        .route("/graph/dot", get(get_graph_dot))
        .route("/metrics", get(get_metrics))
        .route("/bottlenecks", get(get_bottlenecks))
        .route("/alerts", get(get_alerts))
        .route("/quality", get(get_quality))
        .route("/batches/:batch_id/trace", get(get_batch_trace))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn fixture_app() -> Router {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata");
        let dataset = Dataset::from_dir(&dir).expect("fixture loads");
        let day = NaiveDate::from_ymd_opt(2024, 7, 15).expect("valid date");
        router(AppState::new(dataset, EngineConfig::default()).with_as_of(day))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        let res = fixture_app().oneshot(req).await.expect("response");

        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "OK");
    }

    #[tokio::test]
    async fn test_graph_stats() {
        let (status, body) = get_json("/api/graph").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["node_count"], 16);
        assert_eq!(body["data"]["edge_count"], 10);
    }

    #[tokio::test]
    async fn test_graph_dot() {
        let (_, body) = get_json("/api/graph/dot").await;
        let dot = body["data"].as_str().expect("dot string");

        assert!(dot.starts_with("digraph"));
    }

    #[tokio::test]
    async fn test_metrics_and_report() {
        let (_, metrics) = get_json("/api/metrics").await;
        assert_eq!(metrics["data"]["average_payment_lead_time"], 7.0);

        let (_, report) = get_json("/api/report").await;
        assert_eq!(report["data"]["as_of"], "2024-07-15");
        assert_eq!(report["data"]["alerts"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_bottlenecks_with_factor_override() {
        let (_, default) = get_json("/api/bottlenecks").await;
        assert_eq!(default["data"].as_array().map(Vec::len), Some(1));

        let (_, relaxed) = get_json("/api/bottlenecks?factor=3").await;
        assert_eq!(relaxed["data"].as_array().map(Vec::len), Some(0));

        let (status, bad) = get_json("/api/bottlenecks?factor=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(bad["success"], false);
    }

    #[tokio::test]
    async fn test_bottlenecks_with_malformed_factor() {
        let (status, body) = get_json("/api/bottlenecks?factor=abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert!(
            body["error"].as_str().is_some_and(|e| e.contains("query string")),
            "error should explain the rejected query: {body}"
        );
    }

    #[tokio::test]
    async fn test_alerts_and_quality() {
        let (_, alerts) = get_json("/api/alerts").await;
        assert_eq!(alerts["data"][0]["message"], "1 payments overdue!");

        let (_, quality) = get_json("/api/quality").await;
        assert_eq!(quality["data"]["records_checked"], 13);
        assert_eq!(quality["data"]["issues"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_batch_trace() {
        let (status, body) = get_json("/api/batches/B002/trace").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["batch"]["status"], "In Transit");
        let steps = body["data"]["steps"].as_array().expect("steps");
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0]["from"], "Green Oceans");
    }

    #[tokio::test]
    async fn test_unknown_batch_is_404() {
        let (status, body) = get_json("/api/batches/B404/trace").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Batch not found: B404");
        assert!(body["data"].is_null());
    }
}
