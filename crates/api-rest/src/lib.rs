//! # API REST
//!
//! REST API implementation for Medstat.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes, request timeouts)
//!
//! Report generation itself is synchronous and lives in `medstat-core`; handlers run it on the
//! blocking pool under a caller-side timeout.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use medstat_core::{
    DatasetDir, EngineConfig, RecordSource, Report, ReportAssembler, ReportError, ReportKind,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Default listen address when `MEDSTAT_REST_ADDR` is unset.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default dataset directory when `MEDSTAT_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default per-request report timeout when `MEDSTAT_REPORT_TIMEOUT_MS` is unset.
pub const DEFAULT_REPORT_TIMEOUT_MS: u64 = 10_000;

/// Record source shared between request handlers and blocking report tasks.
pub type SharedSource = Arc<dyn RecordSource + Send + Sync>;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    assembler: Arc<ReportAssembler<SharedSource>>,
    report_timeout: Duration,
}

impl AppState {
    pub fn new<S>(config: EngineConfig, source: S, report_timeout: Duration) -> Self
    where
        S: RecordSource + Send + Sync + 'static,
    {
        let source: SharedSource = Arc::new(source);
        Self {
            assembler: Arc::new(ReportAssembler::new(config, source)),
            report_timeout,
        }
    }
}

/// Build the application state from the process environment.
///
/// Reads every setting once; handlers never touch the environment.
///
/// # Environment Variables
/// - `MEDSTAT_DATA_DIR`: directory holding `<kind>.json` record files (default: `data`)
/// - `MEDSTAT_REPORT_TIMEOUT_MS`: per-request timeout in milliseconds (default: 10000)
/// - `MEDSTAT_MIN_YEAR`, `MEDSTAT_MAX_YEAR`, `MEDSTAT_ORGANISATION`, `MEDSTAT_LOG_UNKNOWN`:
///   engine settings, see [`EngineConfig::from_env_values`]
///
/// # Errors
/// Returns an error if the data directory does not exist or any value fails to parse.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let config = EngineConfig::from_env_values(
        std::env::var("MEDSTAT_MIN_YEAR").ok(),
        std::env::var("MEDSTAT_MAX_YEAR").ok(),
        std::env::var("MEDSTAT_ORGANISATION").ok(),
        std::env::var("MEDSTAT_LOG_UNKNOWN").ok(),
    )?;

    let data_dir = PathBuf::from(
        std::env::var("MEDSTAT_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into()),
    );
    let source = DatasetDir::new(data_dir)?;
    let report_timeout =
        timeout_from_env_value(std::env::var("MEDSTAT_REPORT_TIMEOUT_MS").ok())?;

    tracing::info!(
        data_dir = %source.root().display(),
        timeout_ms = report_timeout.as_millis() as u64,
        "REST state configured"
    );

    let state = AppState::new(config, source, report_timeout);
    let config = state.assembler.config();
    tracing::info!(
        organisation = %config.organisation_name(),
        min_year = config.min_year(),
        max_year = config.max_year(),
        "Report engine configured"
    );
    Ok(state)
}

/// Parse the report timeout from an optional millisecond value.
///
/// # Errors
/// Returns an error if the value is not a positive integer.
pub fn timeout_from_env_value(value: Option<String>) -> anyhow::Result<Duration> {
    let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(Duration::from_millis(DEFAULT_REPORT_TIMEOUT_MS));
    };
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => anyhow::bail!("MEDSTAT_REPORT_TIMEOUT_MS must be a positive integer, got '{raw}'"),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_kinds, get_report, get_chart),
    components(schemas(
        HealthRes,
        StatusRes,
        KindRes,
        ListKindsRes,
        ChartPointRes,
        ChartRes,
        ErrorRes
    ))
)]
struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reports", get(list_kinds))
        .route("/reports/:kind", get(get_report))
        .route("/reports/:kind/charts/:breakdown", get(get_chart))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Display metadata of one declared status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusRes {
    pub key: String,
    pub label: String,
    pub description: String,
    /// Hex colour for chart renderers.
    pub colour: String,
    /// `success`, `failure` or `open`.
    pub outcome: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KindRes {
    pub kind: String,
    pub title: String,
    pub statuses: Vec<StatusRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListKindsRes {
    pub kinds: Vec<KindRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChartPointRes {
    pub label: String,
    pub value: f64,
    /// Present on status breakdowns for declared statuses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChartRes {
    pub breakdown: String,
    pub series: Vec<ChartPointRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Period selection shared by the report endpoints.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Calendar year of the report.
    pub year: i32,
    /// Month 1-12 for a monthly report; omit for the whole year.
    pub month: Option<u32>,
}

/// Error response carrying a status code and a client-safe message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match &err {
            ReportError::InvalidPeriod(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            ReportError::UnknownKind(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ReportError::Fetch(_) => {
                tracing::error!("Report fetch error: {:?}", err);
                Self::new(StatusCode::BAD_GATEWAY, "Record source unavailable")
            }
            ReportError::InvalidReport(_) | ReportError::Config(_) => {
                tracing::error!("Report generation error: {:?}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorRes { error: self.message })).into_response()
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Medstat REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/reports",
    responses(
        (status = 200, description = "Available report kinds and status metadata", body = ListKindsRes)
    )
)]
/// List the report kinds this server can generate, with their status vocabularies.
async fn list_kinds() -> Json<ListKindsRes> {
    Json(ListKindsRes {
        kinds: ReportKind::ALL
            .iter()
            .map(|kind| {
                let profile = kind.profile();
                KindRes {
                    kind: kind.as_str().to_string(),
                    title: profile.title.to_string(),
                    statuses: profile
                        .statuses
                        .iter()
                        .map(|s| StatusRes {
                            key: s.key.to_string(),
                            label: s.label.to_string(),
                            description: s.description.to_string(),
                            colour: s.colour.to_string(),
                            outcome: s.outcome.as_str().to_string(),
                        })
                        .collect(),
                }
            })
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/reports/{kind}",
    params(
        ("kind" = String, Path, description = "Report kind, e.g. appointment"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Assembled report as JSON"),
        (status = 400, description = "Invalid period", body = ErrorRes),
        (status = 404, description = "Unknown report kind", body = ErrorRes),
        (status = 502, description = "Record source unavailable", body = ErrorRes),
        (status = 504, description = "Report generation timed out", body = ErrorRes)
    )
)]
/// Generate one report.
///
/// # Returns
/// * `Ok(Json<Report>)` - The full report tree
/// * `Err(ApiError)` - Mapped from the engine error, or 504 on timeout
async fn get_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, ApiError> {
    let report = run_report(&state, &kind, query).await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/reports/{kind}/charts/{breakdown}",
    params(
        ("kind" = String, Path, description = "Report kind, e.g. appointment"),
        ("breakdown" = String, Path, description = "Breakdown name, e.g. monthly"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Ordered (label, value) series, with status colours", body = ChartRes),
        (status = 400, description = "Invalid period", body = ErrorRes),
        (status = 404, description = "Unknown report kind or breakdown", body = ErrorRes),
        (status = 502, description = "Record source unavailable", body = ErrorRes),
        (status = 504, description = "Report generation timed out", body = ErrorRes)
    )
)]
/// Chart series of one breakdown of a report.
async fn get_chart(
    State(state): State<AppState>,
    Path((kind, breakdown)): Path<(String, String)>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ChartRes>, ApiError> {
    let report = run_report(&state, &kind, query).await?;
    let Some(series) = report.chart_series(&breakdown) else {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("unknown breakdown: {breakdown}"),
        ));
    };

    Ok(Json(ChartRes {
        breakdown,
        series: series
            .into_iter()
            .map(|point| ChartPointRes {
                label: point.label,
                value: point.value,
                colour: point.colour.map(str::to_string),
            })
            .collect(),
    }))
}

async fn run_report(state: &AppState, kind: &str, query: ReportQuery) -> Result<Report, ApiError> {
    let kind: ReportKind = kind.parse()?;
    let assembler = Arc::clone(&state.assembler);
    let task =
        tokio::task::spawn_blocking(move || assembler.generate(kind, query.year, query.month));

    match tokio::time::timeout(state.report_timeout, task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(join_err)) => {
            tracing::error!("Report task failed: {:?}", join_err);
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
        Err(_) => {
            tracing::error!(kind = %kind, "Report generation timed out");
            Err(ApiError::new(
                StatusCode::GATEWAY_TIMEOUT,
                "Report generation timed out",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use medstat_core::{FetchError, NonEmptyText, Period, RawRecord};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn config() -> EngineConfig {
        EngineConfig::with_organisation(NonEmptyText::new("Test Hospital").unwrap())
    }

    fn app(dir: &TempDir) -> Router {
        let source = DatasetDir::new(dir.path()).unwrap();
        router(AppState::new(config(), source, Duration::from_secs(5)))
    }

    struct SlowSource(Duration);

    impl RecordSource for SlowSource {
        fn fetch(&self, _: ReportKind, _: &Period) -> Result<Vec<RawRecord>, FetchError> {
            std::thread::sleep(self.0);
            Ok(Vec::new())
        }
    }

    struct PanickingSource;

    impl RecordSource for PanickingSource {
        fn fetch(&self, _: ReportKind, _: &Period) -> Result<Vec<RawRecord>, FetchError> {
            panic!("source crashed");
        }
    }

    fn write_appointments(dir: &TempDir) {
        fs::write(
            dir.path().join("appointment.json"),
            r#"[
                {"id": 1, "timestamp": "2024-03-04T09:00:00", "status": "COMPLETED", "category": "Cardiology", "value": 20},
                {"id": 2, "timestamp": "2024-03-05T10:30:00", "status": "CANCELLED", "category": "Cardiology"},
                {"id": 3, "timestamp": "2024-07-01T14:00:00", "status": "COMPLETED", "category": "Neurology", "value": 35},
                {"id": 4, "timestamp": "2023-07-01T14:00:00", "status": "COMPLETED", "category": "Neurology"}
            ]"#,
        )
        .unwrap();
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn timeout_defaults_and_parses() {
        assert_eq!(
            timeout_from_env_value(None).unwrap(),
            Duration::from_millis(DEFAULT_REPORT_TIMEOUT_MS)
        );
        assert_eq!(
            timeout_from_env_value(Some("250".into())).unwrap(),
            Duration::from_millis(250)
        );
        assert!(timeout_from_env_value(Some("0".into())).is_err());
        assert!(timeout_from_env_value(Some("soon".into())).is_err());
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(app(&dir), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn lists_all_kinds() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(app(&dir), "/reports").await;
        assert_eq!(status, StatusCode::OK);
        let kinds = body["kinds"].as_array().unwrap();
        assert_eq!(kinds.len(), ReportKind::ALL.len());
        assert!(kinds.iter().any(|k| k["kind"] == "dialysis"));

        let lab = kinds.iter().find(|k| k["kind"] == "lab").unwrap();
        let rejected = lab["statuses"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["key"] == "REJECTED")
            .unwrap();
        assert_eq!(rejected["label"], "Rejected");
        assert_eq!(rejected["colour"], "#C62828");
        assert_eq!(rejected["outcome"], "failure");
        assert!(!rejected["description"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn returns_annual_report() {
        let dir = TempDir::new().unwrap();
        write_appointments(&dir);
        let (status, body) = get_json(app(&dir), "/reports/appointment?year=2024").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Appointment Analytics Report");
        assert_eq!(body["summary"]["total"], 3);
        assert_eq!(body["summary"]["previous_total"], 1);
        assert_eq!(body["summary"]["year_over_year"], 200.0);
        assert_eq!(body["period"]["year"], 2024);
        assert!(body["narrative"]["introduction"]
            .as_str()
            .unwrap()
            .contains("Test Hospital"));
    }

    #[tokio::test]
    async fn kind_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write_appointments(&dir);
        let (status, _) = get_json(app(&dir), "/reports/Appointment?year=2024&month=3").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn returns_chart_series() {
        let dir = TempDir::new().unwrap();
        write_appointments(&dir);
        let (status, body) = get_json(app(&dir), "/reports/appointment/charts/monthly?year=2024").await;

        assert_eq!(status, StatusCode::OK);
        let series = body["series"].as_array().unwrap();
        assert_eq!(series.len(), 12);
        assert_eq!(series[2]["label"], "March");
        assert_eq!(series[2]["value"], 2.0);
    }

    #[tokio::test]
    async fn status_chart_carries_colours() {
        let dir = TempDir::new().unwrap();
        write_appointments(&dir);
        let (status, body) = get_json(app(&dir), "/reports/appointment/charts/status?year=2024").await;

        assert_eq!(status, StatusCode::OK);
        let series = body["series"].as_array().unwrap();
        assert_eq!(series[0]["label"], "Completed");
        assert_eq!(series[0]["value"], 2.0);
        assert_eq!(series[0]["colour"], "#2E7D32");
        assert_eq!(series[1]["label"], "Cancelled");
        assert_eq!(series[1]["colour"], "#C62828");
    }

    #[tokio::test]
    async fn monthly_chart_has_no_colours() {
        let dir = TempDir::new().unwrap();
        write_appointments(&dir);
        let (_, body) = get_json(app(&dir), "/reports/appointment/charts/monthly?year=2024").await;
        let series = body["series"].as_array().unwrap();
        assert!(series.iter().all(|p| p.get("colour").is_none()));
    }

    #[tokio::test]
    async fn slow_source_times_out_with_gateway_timeout() {
        let app = router(AppState::new(
            config(),
            SlowSource(Duration::from_millis(500)),
            Duration::from_millis(20),
        ));
        let (status, body) = get_json(app, "/reports/clinic?year=2024").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "Report generation timed out");
    }

    #[tokio::test]
    async fn crashed_report_task_is_internal_error() {
        let app = router(AppState::new(config(), PanickingSource, Duration::from_secs(5)));
        let (status, body) = get_json(app, "/reports/clinic?year=2024").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal error");
    }

    #[tokio::test]
    async fn unknown_breakdown_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (status, _) = get_json(app(&dir), "/reports/lab/charts/weekly?year=2024").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_month_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(app(&dir), "/reports/lab?year=2024&month=13").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid period"));
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (status, _) = get_json(app(&dir), "/reports/radiology?year=2024").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_dataset_is_bad_gateway() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ward.json"), "{ broken").unwrap();
        let (status, body) = get_json(app(&dir), "/reports/ward?year=2024").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Record source unavailable");
    }
}
