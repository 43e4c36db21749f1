use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    classifier::{AnalyzeResponse, Error},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Absent text is treated as empty.
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("error processing request: {}", self.0);
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// `POST /analyze`: classify one text as Ad or Non-Ad.
///
/// Empty and whitespace-only inputs never reach the model; they get a
/// fixed Non-Ad response.
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Ok(Json(AnalyzeResponse::empty_default()));
    }

    let response = state.classifier.classify(&req.text)?;
    tracing::debug!(
        prediction = ?response.prediction,
        "classified {} byte request",
        response.text.len()
    );
    Ok(Json(response))
}
