use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Error taxonomy for the whole service. Every variant carries the
/// user-facing message that ends up in the JSON body.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed or missing input (400).
    InvalidArgument(String),
    /// Missing or invalid credential token (401).
    Unauthenticated(String),
    /// No such entity, or no data for the requested period (404).
    NotFound(String),
    /// Duplicate unique-field insert (409).
    Conflict(String),
    /// Upstream provider answered with a non-success result (502).
    UpstreamUnavailable(String),
    /// Could not reach the upstream provider at all (503).
    UpstreamConnection(String),
    /// Unexpected parse/processing failure (500).
    Internal(String),
}

impl AppError {
    /// Converts a driver error at the service boundary. The driver message
    /// is logged, the caller only sees a generic one.
    pub fn database(err: mongodb::error::Error) -> Self {
        log::error!("❌ Database error: {}", err);
        AppError::Internal("Une erreur interne du service est survenue.".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidArgument(msg)
            | AppError::Unauthenticated(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::UpstreamUnavailable(msg)
            | AppError::UpstreamConnection(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self)).json(serde_json::json!({
            "message": self.message(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            AppError::InvalidArgument("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::UpstreamUnavailable("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::UpstreamConnection("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_carries_the_message() {
        let err = AppError::NotFound("Devise non trouvée.".to_string());
        assert_eq!(err.to_string(), "Devise non trouvée.");
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }
}
