//! Error types for the report server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recmap_report::ReportError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Validation(String),

    #[error("Report rendering failed: {0}")]
    Render(#[from] ReportError),

    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// One entry of a validation error body
#[derive(Serialize, Debug)]
pub struct ValidationDetail {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Body returned for rejected request payloads
#[derive(Serialize, Debug)]
struct ValidationResponse {
    detail: Vec<ValidationDetail>,
}

/// Body returned for rendering failures
#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => {
                let body = ValidationResponse {
                    detail: vec![ValidationDetail {
                        loc: vec!["body".to_string()],
                        msg,
                        kind: "value_error",
                    }],
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            ApiError::Render(_) | ApiError::Task(_) => {
                tracing::error!(error = %self, "failed to generate report");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ErrorResponse {
                    error: self.to_string(),
                    status: status.as_u16(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
