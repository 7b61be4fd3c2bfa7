//! API handlers for the report server
//!
//! - `POST /generate-pdf` renders the infographic report
//! - `GET /health` reports service status

use std::sync::Arc;

use axum::{
    extract::{FromRequest, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use recmap_report::report::REPORT_FILENAME;
use recmap_report::{ReportCompositor, ReportInput, StatusCount};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, info};

use crate::error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub compositor: Arc<ReportCompositor>,
}

impl AppState {
    pub fn new(compositor: ReportCompositor) -> Self {
        Self {
            compositor: Arc::new(compositor),
        }
    }
}

/// JSON body extractor whose rejections become 422 validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidatedJson<T>(pub T);

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "recmap-report-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// One `denunciasPorStatus` entry of the request body
#[derive(Deserialize, Debug)]
pub struct StatusItem {
    pub status: String,
    pub count: u64,
}

/// Request body of `POST /generate-pdf`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    pub total_denuncias: u64,
    pub denuncias_pendentes: u64,
    pub denuncias_validadas: u64,
    pub total_pontos_coleta: u64,
    pub denuncias_por_status: Vec<StatusItem>,
}

impl From<GenerateReportRequest> for ReportInput {
    fn from(req: GenerateReportRequest) -> Self {
        ReportInput::new(req.total_denuncias)
            .with_pendentes(req.denuncias_pendentes)
            .with_validadas(req.denuncias_validadas)
            .with_pontos_coleta(req.total_pontos_coleta)
            .with_statuses(
                req.denuncias_por_status
                    .into_iter()
                    .map(|item| StatusCount::new(item.status, item.count)),
            )
    }
}

/// Handler: POST /generate-pdf
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<GenerateReportRequest>,
) -> Result<Response, ApiError> {
    debug!("Request: {:?}", req);
    let input = ReportInput::from(req);
    info!(
        total = input.total_denuncias(),
        statuses = input.denuncias_por_status().len(),
        "Rendering report"
    );

    let compositor = Arc::clone(&state.compositor);
    let bytes = tokio::task::spawn_blocking(move || compositor.generate(&input)).await??;
    info!(bytes = bytes.len(), "Report rendered");

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={REPORT_FILENAME}"),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Routes of the service, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/generate-pdf", post(handle_generate_pdf))
        .with_state(state)
}

/// CORS policy for the configured frontend origins.
///
/// Credentials are allowed, so requested methods and headers are mirrored
/// instead of answered with a wildcard.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
