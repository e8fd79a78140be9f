use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    models::{AdStatus, ErrorBody},
    views::advertisements::SubmitError,
};

/// RepoError
///
/// Failures reported by the backend collaborator. `Backend` keeps the service's own
/// message so that screens can show it verbatim.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{0}")]
    Backend(String),

    #[error("advertisement {0} not found")]
    NotFound(Uuid),

    #[error("advertisement cannot move from {from} to {to}")]
    InvalidTransition { from: AdStatus, to: AdStatus },

    #[error("category {0} does not exist")]
    UnknownCategory(Uuid),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => RepoError::Backend(db_err.message().to_string()),
            other => RepoError::Backend(other.to_string()),
        }
    }
}

/// AppError
///
/// Handler-level error. Redirects for missing sessions or roles are not errors and
/// never pass through here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Storage(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(msg) => AppError::BadRequest(msg),
            SubmitError::Repo(e) => AppError::Repo(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Repo(RepoError::Backend(msg)) => {
                tracing::error!(error = %msg, "backend request failed");
                StatusCode::BAD_GATEWAY
            }
            AppError::Repo(RepoError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Repo(RepoError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            AppError::Repo(RepoError::UnknownCategory(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "storage request failed");
                StatusCode::BAD_GATEWAY
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
