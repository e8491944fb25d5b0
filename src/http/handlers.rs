//! Request handlers for the registry API.
//!
//! Handlers are thin: they translate query/path parameters, call the
//! registry service, and map errors to status codes.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::http::server::AppState;
use crate::registry::ServiceError;

/// Error body returned by every failing endpoint.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Invalid(_) | ServiceError::InvalidCursor(_) => {
                ApiError::BadRequest(e.to_string())
            }
            ServiceError::AlreadyExists { .. } => ApiError::BadRequest(e.to_string()),
            ServiceError::Store(inner) => {
                tracing::error!(error = %inner, "Store error while serving request");
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn ping(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "pong": true, "version": state.version.version }))
}

pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.version.clone())
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

pub async fn list_servers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .service
        .list(params.cursor.as_deref(), params.limit)
        .await?;
    Ok(Json(page))
}

pub async fn get_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::BadRequest(format!("invalid server id: {id}")))?;
    match state.service.get(id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("server {id} not found"))),
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => ApiError::NotFound("telemetry disabled".into()).into_response(),
    }
}
