use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// No credential was presented at all.
    #[error("missing credential")]
    MissingCredential,
    /// A credential was presented but its signature or shape is wrong.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    /// The credential verified but its validity window has passed.
    #[error("credential expired")]
    ExpiredCredential,
    /// The identity provider rejected the token or was unreachable.
    #[error("identity verification failed: {0}")]
    VerificationFailed(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A persistence invariant was violated (e.g. duplicate rows behind a
    /// unique key). Not a client error; logged for operator attention.
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredential(message.into())
    }

    pub fn verification_failed(message: impl Into<String>) -> Self {
        Self::VerificationFailed(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AppError::MissingCredential
                | AppError::InvalidCredential(_)
                | AppError::ExpiredCredential
                | AppError::VerificationFailed(_)
        )
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The whole 401 class collapses to a generic body: which check failed
        // is useful to an attacker and belongs in the log, not the response.
        if self.is_unauthenticated() {
            tracing::debug!(detail = %self, "request unauthenticated");
            let payload = ErrorResponse {
                error: "unauthenticated".to_string(),
                message: "unauthenticated".to_string(),
            };
            return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
        }

        let status = match self {
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error = match &self {
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Unprocessable(_) => "unprocessable",
            AppError::BadRequest(_) => "bad_request",
            AppError::Configuration(_) => "configuration",
            AppError::Integrity(_) => "integrity",
            AppError::Database(_) => "database",
            _ => "internal",
        };

        match &self {
            AppError::Integrity(detail) => {
                tracing::error!(%detail, "persistence integrity violation");
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
            }
            _ => {}
        }

        let message = match &self {
            // 500s carry a generic body too; the log has the detail.
            AppError::Configuration(_)
            | AppError::Integrity(_)
            | AppError::Database(_)
            | AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
