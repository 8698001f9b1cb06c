// HTTP error responses
use crate::domain::error::AlignError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid upstream data: {0}")]
    InvalidData(AlignError),

    #[error("Data API error: {0}")]
    Upstream(String),

    #[error("Internal error")]
    Internal,
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<AlignError>() {
            Some(align_error) => ApiError::InvalidData(align_error.clone()),
            None => ApiError::Upstream(format!("{:#}", error)),
        }
    }
}

impl From<StatusCode> for ApiError {
    fn from(_: StatusCode) -> Self {
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::InvalidData(e) => {
                tracing::error!("Invalid upstream data: {}", e);
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            Self::Upstream(msg) => {
                tracing::error!("Data API error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Data API error".to_string())
            }
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
