use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Simulated network fault. Never retried by this crate.
    #[error("Transient failure during {operation}")]
    Transient { operation: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient { .. })
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { entity, id } => {
                AppError::NotFound(anyhow::anyhow!("{} not found: {}", entity, id))
            }
            ServiceError::ValidationError(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Transient { .. } => AppError::ServiceUnavailable,
            ServiceError::Conflict(e) => AppError::Conflict(anyhow::anyhow!(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_not_found_maps_to_404() {
        let app: AppError = ServiceError::not_found("Policy", "p1").into();
        assert_eq!(app.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(app.to_response().error, "Policy not found: p1");
    }

    #[test]
    fn test_transient_maps_to_503() {
        let err = ServiceError::Transient {
            operation: "GET /policies".to_string(),
        };
        assert!(err.is_transient());
        let app: AppError = err.into();
        assert_eq!(app.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let app: AppError = ServiceError::Conflict("Policy already exists: p1".into()).into();
        assert_eq!(app.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let app: AppError = ServiceError::ValidationError("empty name".into()).into();
        assert_eq!(app.status_code(), StatusCode::BAD_REQUEST);
    }
}
