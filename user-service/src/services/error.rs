use service_core::error::AppError;
use thiserror::Error;

use super::jwt::TokenError;
use super::store::StoreError;

/// Domain failures. Each variant carries the client-facing message; the HTTP
/// status is decided once, in the `AppError` conversion.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Missing, invalid or expired credentials, or an unknown subject.
    #[error("{0}")]
    Authentication(String),

    /// Authenticated, but the role does not grant a required scope.
    #[error("{0}")]
    Authorization(String),

    #[error("Email error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(msg: &str) -> Self {
        ServiceError::NotFound(msg.to_string())
    }

    pub fn conflict(msg: &str) -> Self {
        ServiceError::Conflict(msg.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(detail) => {
                ServiceError::Conflict(format!("Unique key constraint fails with {}", detail))
            }
            StoreError::ForeignKeyViolation(detail) => {
                ServiceError::Conflict(format!("Foreign key constraint fails with {}", detail))
            }
            StoreError::Other(e) => ServiceError::Internal(e),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ServiceError::Authentication("Token expired".to_string()),
            TokenError::Invalid => ServiceError::Authentication("Invalid token".to_string()),
            TokenError::Signing(e) => {
                ServiceError::Internal(anyhow::anyhow!("Token signing failed: {}", e))
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ServiceError::Authentication(msg) => AppError::Unauthorized(anyhow::anyhow!(msg)),
            ServiceError::Authorization(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ServiceError::Upstream(msg) => AppError::EmailError(msg),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
