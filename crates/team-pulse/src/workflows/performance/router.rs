use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::config_store::{ConfigStoreError, ScoringConfigUpdate};
use super::domain::Scope;
use super::report::ReportError;
use super::service::PerformanceService;
use super::sources::ReportRepository;
use crate::workflows::kpi::{KpiDefinition, KpiError, KpiId, KpiUpdate};

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub scope: Scope,
    pub week_start: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct InitializeDefaultsRequest {
    #[serde(default = "default_initializer")]
    pub initialized_by: String,
}

fn default_initializer() -> String {
    "system".to_string()
}

/// Router exposing scoring configuration, weekly reports, and KPI tracking.
pub fn performance_router<R>(service: Arc<PerformanceService<R>>) -> Router
where
    R: ReportRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/scoring/config",
            get(get_config_handler::<R>).put(set_config_handler::<R>),
        )
        .route(
            "/api/v1/scoring/config/defaults",
            post(initialize_defaults_handler::<R>),
        )
        .route("/api/v1/reports", post(generate_report_handler::<R>))
        .route(
            "/api/v1/reports/:scope_kind/:scope_id/:week_start",
            get(get_report_handler::<R>),
        )
        .route("/api/v1/kpis", post(register_kpi_handler::<R>))
        .route(
            "/api/v1/kpis/:kpi_id",
            get(get_kpi_handler::<R>).patch(record_week_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn get_config_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.get_active_config() {
        Ok(config) => (StatusCode::OK, axum::Json(config)).into_response(),
        Err(error) => config_error_response(error),
    }
}

pub(crate) async fn set_config_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
    axum::Json(candidate): axum::Json<ScoringConfigUpdate>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.set_config(candidate) {
        Ok(config) => (StatusCode::OK, axum::Json(config)).into_response(),
        Err(error) => config_error_response(error),
    }
}

pub(crate) async fn initialize_defaults_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
    axum::Json(request): axum::Json<InitializeDefaultsRequest>,
) -> Response
where
    R: ReportRepository + 'static,
{
    let config = service.initialize_defaults(&request.initialized_by);
    (StatusCode::OK, axum::Json(config)).into_response()
}

pub(crate) async fn generate_report_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
    axum::Json(request): axum::Json<GenerateReportRequest>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.generate(&request.scope, request.week_start).await {
        Ok(report) => (StatusCode::CREATED, axum::Json(report)).into_response(),
        Err(error) => report_error_response(error),
    }
}

pub(crate) async fn get_report_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
    Path((scope_kind, scope_id, week_start)): Path<(String, String, String)>,
) -> Response
where
    R: ReportRepository + 'static,
{
    let Some(scope) = Scope::from_parts(&scope_kind, &scope_id) else {
        let payload = json!({ "error": format!("unknown scope kind '{scope_kind}'") });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };
    let week_start = match NaiveDate::parse_from_str(week_start.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(err) => {
            let payload = json!({
                "error": format!("failed to parse '{week_start}' as YYYY-MM-DD ({err})"),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.get_report(&scope, week_start) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => report_error_response(error),
    }
}

pub(crate) async fn register_kpi_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
    axum::Json(definition): axum::Json<KpiDefinition>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.register_kpi(definition) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(error) => kpi_error_response(error),
    }
}

pub(crate) async fn get_kpi_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
    Path(kpi_id): Path<String>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.kpi(&KpiId(kpi_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => kpi_error_response(error),
    }
}

pub(crate) async fn record_week_handler<R>(
    State(service): State<Arc<PerformanceService<R>>>,
    Path(kpi_id): Path<String>,
    axum::Json(update): axum::Json<KpiUpdate>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.record_week(&KpiId(kpi_id), update) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => kpi_error_response(error),
    }
}

fn config_error_response(error: ConfigStoreError) -> Response {
    match error {
        ConfigStoreError::InvalidConfig { got } => {
            let payload = json!({
                "error": error.to_string(),
                "got": got,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ConfigStoreError::NotFound => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) fn report_status(error: &ReportError) -> StatusCode {
    match error {
        ReportError::WeekOutOfRange(_) => StatusCode::BAD_REQUEST,
        ReportError::EmptyScope(_) | ReportError::NotFound { .. } => StatusCode::NOT_FOUND,
        ReportError::ScopeUnavailable { .. } | ReportError::Directory(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ReportError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ReportError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn report_error_response(error: ReportError) -> Response {
    let status = report_status(&error);
    let payload = match &error {
        ReportError::ScopeUnavailable { failures, .. } => json!({
            "error": error.to_string(),
            "failures": failures,
        }),
        _ => json!({ "error": error.to_string() }),
    };
    (status, axum::Json(payload)).into_response()
}

fn kpi_error_response(error: KpiError) -> Response {
    let status = match error {
        KpiError::NotFound(_) => StatusCode::NOT_FOUND,
        KpiError::AlreadyExists(_) | KpiError::StaleWeek { .. } => StatusCode::CONFLICT,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
