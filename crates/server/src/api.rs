//! HTTP API for the SLA dashboard
//!
//! Tickets, aggregate statistics, the prediction endpoint, artifact
//! vocabularies, and the health/metrics surface. All errors leave as
//! structured `{status: "error", message}` JSON; validation problems map
//! to 400, unknown resources to 404, everything else to 500 with the
//! details logged server-side.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use server_lib::health::ComponentStatus;
use server_lib::predictor::{
    CategoryEncoderTable, PredictError, SlaPredictor, CATEGORY_FIELD, ITEM_FIELD,
    SUB_CATEGORY_FIELD,
};
use server_lib::{
    ClusterReport, DashboardMetrics, FeatureImportance, HealthRegistry, PredictionLogEntry,
    PredictionRequest, PredictionResponse, SortOrder, StatsFilter, StoreError, StructuredLogger,
    TicketPage, TicketQuery, TicketStore, TicketView, VocabularyResponse,
};

/// Entries returned by the feature-importance endpoint
const IMPORTANCE_LIMIT: usize = 10;

/// Shared application state, assembled once at startup and read-only
/// from then on.
pub struct AppState {
    pub store: TicketStore,
    pub predictor: SlaPredictor,
    pub encoders: Arc<CategoryEncoderTable>,
    pub importances: Vec<FeatureImportance>,
    pub clusters: ClusterReport,
    pub health_registry: HealthRegistry,
    pub metrics: DashboardMetrics,
    pub logger: StructuredLogger,
    pub page_size: u32,
    pub max_page_size: u32,
}

/// API failure with its client-facing status code
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(err) => {
                error!(error = %format!("{err:#}"), "request failed internally");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (
            status,
            Json(json!({ "status": "error", "message": message })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.into())
    }
}

#[derive(Debug, Deserialize)]
struct TicketListParams {
    search: Option<String>,
    priority: Option<String>,
    category: Option<String>,
    sort: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TicketListParams>,
) -> Result<Json<TicketPage>, ApiError> {
    let query = TicketQuery {
        search: params.search.filter(|s| !s.is_empty()),
        priority: none_if_all(params.priority),
        category: none_if_all(params.category),
        sort: SortOrder::from_param(params.sort.as_deref().unwrap_or("-open_date")),
        page: params.page.unwrap_or(1).max(1),
        page_size: params
            .page_size
            .unwrap_or(state.page_size)
            .clamp(1, state.max_page_size),
    };

    let start = Instant::now();
    let page = state.store.list_tickets(&query)?;
    state
        .metrics
        .observe_query_latency(start.elapsed().as_secs_f64());
    Ok(Json(page))
}

async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> Result<Json<TicketView>, ApiError> {
    let ticket = state
        .store
        .get_ticket(&number)?
        .ok_or_else(|| ApiError::NotFound(format!("ticket {number} not found")))?;
    Ok(Json(TicketView::from(&ticket)))
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    priority: Option<String>,
    category: Option<String>,
    is_sla_violated: Option<String>,
}

impl StatsParams {
    /// `all` (or an empty value) means unfiltered for every parameter
    fn into_filter(self) -> Result<StatsFilter, ApiError> {
        let is_sla_violated = match self.is_sla_violated.as_deref() {
            None | Some("") | Some("all") => None,
            Some("true") | Some("1") => Some(true),
            Some("false") | Some("0") => Some(false),
            Some(other) => {
                return Err(ApiError::BadRequest(format!(
                    "invalid is_sla_violated {other:?}: expected true, false or all"
                )))
            }
        };
        Ok(StatsFilter {
            priority: none_if_all(self.priority),
            category: none_if_all(self.category),
            is_sla_violated,
        })
    }
}

fn none_if_all(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "all")
}

async fn stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Response, ApiError> {
    let filter = params.into_filter()?;
    let start = Instant::now();
    let stats = state.store.dashboard_stats(&filter)?;
    state
        .metrics
        .observe_query_latency(start.elapsed().as_secs_f64());
    Ok(Json(stats).into_response())
}

async fn violation_by_category(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Response, ApiError> {
    let filter = params.into_filter()?;
    let start = Instant::now();
    let results = state.store.violation_by_category(&filter)?;
    state
        .metrics
        .observe_query_latency(start.elapsed().as_secs_f64());
    Ok(Json(results).into_response())
}

async fn monthly_trend(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Response, ApiError> {
    let filter = params.into_filter()?;
    let start = Instant::now();
    let results = state.store.monthly_trend(&filter)?;
    state
        .metrics
        .observe_query_latency(start.elapsed().as_secs_f64());
    Ok(Json(results).into_response())
}

async fn feature_importance(State(state): State<Arc<AppState>>) -> Json<Vec<FeatureImportance>> {
    Json(
        state
            .importances
            .iter()
            .take(IMPORTANCE_LIMIT)
            .cloned()
            .collect(),
    )
}

async fn predict(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let start = Instant::now();
    match state.predictor.predict(&request) {
        Ok(response) => {
            state
                .metrics
                .observe_prediction_latency(start.elapsed().as_secs_f64());
            state.metrics.inc_predictions();

            let client_address = connect_info.map(|ConnectInfo(addr)| addr.ip().to_string());
            state.logger.log_prediction(
                client_address.as_deref(),
                response.sla_violated,
                response.confidence,
                response.days_to_due,
                state.predictor.model_version(),
            );

            let entry = PredictionLogEntry {
                requester: None,
                input: serde_json::to_value(&request).unwrap_or(serde_json::Value::Null),
                result: serde_json::to_value(&response).unwrap_or(serde_json::Value::Null),
                client_address,
            };
            if let Err(err) = state.store.log_prediction(&entry) {
                warn!(error = %err, "failed to append prediction audit log");
            }

            Ok(Json(response))
        }
        Err(PredictError::Validation(err)) => Err(ApiError::BadRequest(err.to_string())),
        Err(PredictError::Inference(err)) => {
            state.metrics.inc_prediction_errors();
            state
                .logger
                .log_prediction_error("inference", &format!("{err:#}"));
            Err(ApiError::Internal(err))
        }
    }
}

async fn unique_values(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VocabularyResponse>, ApiError> {
    let categories = state
        .encoders
        .vocabulary(CATEGORY_FIELD, true)
        .ok_or_else(|| missing_encoder_key(CATEGORY_FIELD))?;
    let items = state
        .encoders
        .vocabulary(ITEM_FIELD, false)
        .ok_or_else(|| missing_encoder_key(ITEM_FIELD))?;
    let sub_categories = state
        .encoders
        .vocabulary(SUB_CATEGORY_FIELD, false)
        .ok_or_else(|| missing_encoder_key(SUB_CATEGORY_FIELD))?;

    Ok(Json(VocabularyResponse {
        categories,
        items,
        sub_categories,
    }))
}

fn missing_encoder_key(field: &str) -> ApiError {
    ApiError::Internal(anyhow::anyhow!(
        "encoder artifact has no {field:?} key; re-export label_encoders.json with \
         Category, Item and Sub Category"
    ))
}

async fn clusters(State(state): State<Arc<AppState>>) -> Json<ClusterReport> {
    Json(state.clusters.clone())
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, Vec::new()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/tickets", get(list_tickets))
        .route("/api/tickets/:number", get(get_ticket))
        .route("/api/stats", get(stats))
        .route("/api/stats/violation-by-category", get(violation_by_category))
        .route("/api/stats/monthly-trend", get(monthly_trend))
        .route("/api/stats/feature-importance", get(feature_importance))
        .route("/api/predict", post(predict))
        .route("/api/unique-values", get(unique_values))
        .route("/api/clusters", get(clusters))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDateTime;
    use server_lib::predictor::{
        Classification, Classifier, FeatureNormalizer, MinMaxScaler, PRIORITY_FIELD,
    };
    use server_lib::{Ticket, TICKET_TIME_FORMAT};
    use std::collections::HashMap;
    use tower::ServiceExt;

    struct StubClassifier {
        violated: bool,
        probability: f32,
    }

    impl Classifier for StubClassifier {
        fn classify(&self, _features: &[f32]) -> anyhow::Result<Classification> {
            Ok(Classification {
                violated: self.violated,
                violated_probability: self.probability,
            })
        }

        fn version(&self) -> &str {
            "stub-model"
        }
    }

    fn sample_ticket(
        number: &str,
        priority: &str,
        category: &str,
        open: &str,
        violated: bool,
    ) -> Ticket {
        let open_date = NaiveDateTime::parse_from_str(open, TICKET_TIME_FORMAT).unwrap();
        Ticket {
            number: number.to_string(),
            priority: priority.to_string(),
            category: category.to_string(),
            item: "application 84".to_string(),
            open_date,
            closed_date: None,
            due_date: open_date + chrono::Duration::days(2),
            time_left_incl_on_hold: 0.5,
            is_sla_violated: violated,
            is_open_date_off: "Workday".to_string(),
            is_due_date_off: "Workday".to_string(),
            days_to_due: 2,
            open_month: 1,
            creation_day_of_week: "Monday".to_string(),
            creation_hour: 9,
            deadline_day_of_week: "Wednesday".to_string(),
            deadline_hour: 9,
            resolution_duration: 3.0,
            total_tickets_resolved_wc: 100.0,
            sla_threshold: 2.0,
            average_resolution_time_ac: 2.5,
            sla_to_average_resolution_ratio_rc: 0.8,
            compliance_rate: 0.8,
            created_at: open_date,
        }
    }

    fn encoder_table() -> Arc<CategoryEncoderTable> {
        let mut fields = HashMap::new();
        fields.insert(
            PRIORITY_FIELD.to_string(),
            vec!["1 - critical".into(), "3 - medium".into(), "4 - low".into()],
        );
        fields.insert(
            CATEGORY_FIELD.to_string(),
            vec!["cannot-access".into(), "hardware".into(), "nan".into(), "transaction".into()],
        );
        fields.insert(
            ITEM_FIELD.to_string(),
            vec!["application 12".into(), "application 84".into()],
        );
        fields.insert(
            SUB_CATEGORY_FIELD.to_string(),
            vec!["disk".into(), "nan".into()],
        );
        Arc::new(CategoryEncoderTable::new(fields))
    }

    async fn setup_state(tickets: &[Ticket]) -> Arc<AppState> {
        let store = TicketStore::open_in_memory().unwrap();
        store.insert_tickets(tickets).unwrap();

        let encoders = encoder_table();
        let feature_names: Vec<String> = [
            "Days to Due",
            "Open Month",
            "Application Creation Day of Week",
            "Application Creation Hour",
            "Application SLA Deadline Day of Week",
            "Application SLA Deadline Hour",
            "Is Open Date Off",
            "Is Due Date Off",
            "Priority",
            "Category",
            "Item",
            "Sub Category",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let normalizer = FeatureNormalizer::new(
            Arc::new(feature_names),
            encoders.clone(),
            MinMaxScaler::identity(),
            None,
        );
        let predictor = SlaPredictor::new(
            normalizer,
            Arc::new(StubClassifier {
                violated: true,
                probability: 0.87,
            }),
        );

        let health_registry = HealthRegistry::new();
        health_registry
            .register(server_lib::health::components::STORE)
            .await;
        health_registry
            .register(server_lib::health::components::PREDICTOR)
            .await;
        health_registry.set_ready(true).await;

        let importances = (0..12)
            .map(|i| FeatureImportance {
                feature: format!("feature-{i}"),
                importance: 1.0 - f64::from(i) * 0.05,
            })
            .collect();

        Arc::new(AppState {
            store,
            predictor,
            encoders,
            importances,
            clusters: ClusterReport::sample(),
            health_registry,
            metrics: DashboardMetrics::new(),
            logger: StructuredLogger::new("test"),
            page_size: 7,
            max_page_size: 100,
        })
    }

    fn seeded_tickets() -> Vec<Ticket> {
        vec![
            sample_ticket("3226220", "3 - Medium", "hardware", "2024-01-01 09:00:00", true),
            sample_ticket("3226221", "4 - Low", "transaction", "2024-02-10 14:00:00", false),
            sample_ticket("3226222", "3 - Medium", "hardware", "2024-02-15 08:00:00", false),
            sample_ticket("4000001", "1 - Critical", "cannot-access", "2024-03-01 10:00:00", true),
        ]
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(
        app: &Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn predict_payload() -> serde_json::Value {
        json!({
            "open_date": "2024-01-01T09:00",
            "due_date": "2024-01-03T17:00",
            "priority": "3 - Medium",
            "category": "hardware",
            "item": "application 84",
            "sub_category": ""
        })
    }

    #[tokio::test]
    async fn stats_are_zero_safe_on_an_empty_store() {
        let state = setup_state(&[]).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_tickets"], 0);
        assert_eq!(body["compliance_rate"], 0.0);

        let (status, body) = get_json(&app, "/api/stats?priority=3%20-%20Medium").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["compliance_rate"], 0.0);
    }

    #[tokio::test]
    async fn priority_all_equals_no_filter() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (_, unfiltered) = get_json(&app, "/api/stats").await;
        let (_, all) = get_json(&app, "/api/stats?priority=all&is_sla_violated=all").await;
        assert_eq!(unfiltered, all);
    }

    #[tokio::test]
    async fn stats_honor_priority_filter() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/stats?priority=3%20-%20Medium").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_tickets"], 2);
        assert_eq!(body["violation_count"], 1);
        assert_eq!(body["medium_priority_count"], 2);
        assert_eq!(body["low_priority_count"], 0);
    }

    #[tokio::test]
    async fn bad_violation_filter_is_rejected() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/stats?is_sla_violated=maybe").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn monthly_trend_is_chronological() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/stats/monthly-trend").await;
        assert_eq!(status, StatusCode::OK);
        let months: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["month"].as_str().unwrap())
            .collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[tokio::test]
    async fn violation_by_category_orders_by_volume() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/stats/violation-by-category").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows[0]["category"], "hardware");
        assert_eq!(rows[0]["total_tickets"], 2);
    }

    #[tokio::test]
    async fn tickets_list_paginates_and_caps_page_size() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/tickets?page_size=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 4);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        // Newest first by default
        assert_eq!(body["results"][0]["number"], "4000001");

        let (_, capped) = get_json(&app, "/api/tickets?page_size=100000").await;
        assert_eq!(capped["page_size"], 100);
    }

    #[tokio::test]
    async fn tickets_search_matches_partial_numbers() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (_, body) = get_json(&app, "/api/tickets?search=32262").await;
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn ticket_detail_includes_display_extras() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/tickets/3226220").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sla_violated_text"], "Yes");
        assert_eq!(body["open_date"], "2024-01-01 09:00:00");
    }

    #[tokio::test]
    async fn unknown_ticket_is_a_structured_404() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/tickets/9999999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn predict_returns_the_verdict_and_logs_it() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state.clone());

        let (status, body) = post_json(&app, "/api/predict", predict_payload()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["sla_violated"], true);
        assert_eq!(body["violation_text"], "Yes");
        assert_eq!(body["days_to_due"], 2);
        assert_eq!(body["open_hour"], 9);
        let confidence = body["confidence"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&confidence));
        assert_eq!(confidence, 87.0);

        assert_eq!(state.store.prediction_log_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn predict_with_unseen_category_still_succeeds() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let mut payload = predict_payload();
        payload["category"] = json!("category-the-model-never-saw");
        let (status, body) = post_json(&app, "/api/predict", payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn predict_rejects_malformed_timestamps() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state.clone());

        let mut payload = predict_payload();
        payload["open_date"] = json!("01/02/2024 9am");
        let (status, body) = post_json(&app, "/api/predict", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("YYYY-MM-DDTHH:MM"));
        // Failed calls are not audited
        assert_eq!(state.store.prediction_log_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn predict_rejects_unknown_and_missing_fields() {
        let state = setup_state(&seeded_tickets()).await;
        let app = create_router(state);

        let mut extra = predict_payload();
        extra["surprise"] = json!(1);
        let (status, body) = post_json(&app, "/api/predict", extra).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");

        let mut missing = predict_payload();
        missing.as_object_mut().unwrap().remove("due_date");
        let (status, _) = post_json(&app, "/api/predict", missing).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unique_values_exclude_sentinels_and_sort_by_label() {
        let state = setup_state(&[]).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/unique-values").await;
        assert_eq!(status, StatusCode::OK);
        let categories: Vec<&str> = body["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["label"].as_str().unwrap())
            .collect();
        assert_eq!(categories, vec!["Cannot Access", "Hardware", "Transaction"]);
        assert!(body["sub_categories"]
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["value"] != "nan"));
    }

    #[tokio::test]
    async fn feature_importance_returns_top_ten() {
        let state = setup_state(&[]).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/stats/feature-importance").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0]["feature"], "feature-0");
    }

    #[tokio::test]
    async fn clusters_serve_the_loaded_report() {
        let state = setup_state(&[]).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/clusters").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["num_clusters"], 4);
        assert_eq!(body["clusters"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn health_endpoints_report_ready_state() {
        let state = setup_state(&[]).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = get_json(&app, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }
}
