use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

/// Error body carried inside a failed response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status the error maps to when surfaced through a response envelope.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the client-facing error body. Internal details are kept out of
    /// the message and only exposed through `details`.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            AppError::BadRequest(err) => ErrorResponse {
                error: err.to_string(),
                details: None,
            },
            AppError::NotFound(err) => ErrorResponse {
                error: err.to_string(),
                details: None,
            },
            AppError::Conflict(err) => ErrorResponse {
                error: err.to_string(),
                details: None,
            },
            AppError::InternalError(err) => ErrorResponse {
                error: "Internal server error".to_string(),
                details: Some(format!("{:#?}", err)),
            },
            AppError::ServiceUnavailable => ErrorResponse {
                error: "Service unavailable".to_string(),
                details: None,
            },
            AppError::ConfigError(err) => ErrorResponse {
                error: "Configuration error".to_string(),
                details: Some(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound(anyhow::anyhow!("missing")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::BadRequest(anyhow::anyhow!("bad")).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_error_hides_message() {
        let err = AppError::InternalError(anyhow::anyhow!("lock poisoned"));
        let body = err.to_response();
        assert_eq!(body.error, "Internal server error");
        assert!(body.details.unwrap().contains("lock poisoned"));
    }

    #[test]
    fn test_not_found_message_is_public() {
        let err = AppError::NotFound(anyhow::anyhow!("Policy not found: p1"));
        let body = err.to_response();
        assert_eq!(body.error, "Policy not found: p1");
        assert!(body.details.is_none());
    }
}
