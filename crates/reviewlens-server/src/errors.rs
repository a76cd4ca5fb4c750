//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reviewlens_core::Error;
use serde_json::json;

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    /// Failure raised by the sentiment core or the store
    Core(Error),
    /// Malformed request outside the core's error kinds
    InvalidRequest(String),
    /// Unknown review id
    NotFound(String),
    /// Worker task panicked or was cancelled
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(err) => match err {
                Error::ModelNotFound(_) => StatusCode::NOT_FOUND,
                Error::InvalidLabel(_) => StatusCode::BAD_REQUEST,
                Error::TransformFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::UnsupportedOperation(_) => StatusCode::CONFLICT,
                Error::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable kind for bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Core(err) => err.kind(),
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{err}"),
            Self::InvalidRequest(msg) | Self::NotFound(msg) | Self::Internal(msg) => f.write_str(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": self.kind(),
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(Error::model_not_found("x")).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(Error::invalid_label("x")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(Error::transform("x")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::from(Error::unsupported("x")).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("review 3".into()).kind(), "not_found");
    }
}
