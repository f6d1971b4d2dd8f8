//! Route handlers for the upload form.

use crate::adapters::LocalStorage;
use crate::app::predictor::WinnerPredictor;
use crate::app::sample::sample_season;
use crate::config::AppConfig;
use crate::core::{ConfigProvider, Storage, Table};
use crate::utils::error::{ErrorCategory, EtlError};
use crate::web::page;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

pub const UPLOAD_FIELD: &str = "file";

/// Shared by every handler.
pub struct WebState {
    pub predictor: WinnerPredictor,
    pub storage: LocalStorage,
    pub config: AppConfig,
}

impl WebState {
    pub fn new(predictor: WinnerPredictor, storage: LocalStorage, config: AppConfig) -> Self {
        Self {
            predictor,
            storage,
            config,
        }
    }
}

pub type AppState = Arc<WebState>;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<EtlError> for WebError {
    fn from(e: EtlError) -> Self {
        match e.category() {
            ErrorCategory::Data => Self::bad_request(e.user_friendly_message()),
            _ => Self::internal(e.user_friendly_message()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        } else {
            tracing::warn!("Rejected request: {}", self.message);
        }
        let body = page::layout(&format!("{}\n{}", page::error_section(&self.message), page::upload_form()));
        (self.status, Html(body)).into_response()
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for WebError {}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub features: usize,
    pub trees: usize,
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let predictions = state.predictor.predict(&sample_season())?;
    let section = page::predictions_section("Sample season", &predictions)?;
    Ok(Html(page::layout(&format!("{}\n{}", page::upload_form(), section))))
}

/// POST /predict
pub async fn predict(State(state): State<AppState>, mut multipart: Multipart) -> Result<Html<String>, WebError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::bad_request(e.to_string()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let file_name = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| WebError::bad_request(e.to_string()))?;
            upload = Some((file_name, bytes));
        }
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| WebError::bad_request(format!("no '{}' field in the upload", UPLOAD_FIELD)))?;
    tracing::info!("Scoring upload {} ({} bytes)", file_name, bytes.len());

    let table = Table::from_csv(&bytes)?;
    let predictions = state.predictor.predict(&table)?;

    let output_path = state.config.web_predictions_path();
    state
        .storage
        .write_file(&output_path, &predictions.to_csv()?)
        .await?;
    tracing::debug!("Saved web predictions to {}", output_path);

    let section = page::predictions_section(&format!("Predictions for {}", file_name), &predictions)?;
    Ok(Html(page::layout(&format!("{}\n{}", page::upload_form(), section))))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let forest = &state.predictor.artifact().forest;
    Json(HealthResponse {
        status: "ok",
        features: forest.n_features(),
        trees: forest.n_trees(),
    })
}
