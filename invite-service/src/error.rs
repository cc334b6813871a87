use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use referral_shared::invite_store::InviteStoreError;
use referral_shared::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: String) -> Self {
        AppError::Unauthorized(msg)
    }

    pub fn forbidden(msg: String) -> Self {
        AppError::Forbidden(msg)
    }

    pub fn conflict(msg: String) -> Self {
        AppError::Conflict(msg)
    }

    pub fn unprocessable(msg: String) -> Self {
        AppError::Unprocessable(msg)
    }

    pub fn internal(msg: String) -> Self {
        AppError::Internal(msg)
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the log
        let message = match &self {
            AppError::Internal(detail) => {
                error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<InviteStoreError> for AppError {
    fn from(err: InviteStoreError) -> Self {
        match err {
            InviteStoreError::Exhausted { .. } => AppError::ServiceUnavailable(
                "Unable to issue an invite right now, please retry".to_string(),
            ),
            InviteStoreError::InvalidSettings(msg) => AppError::Internal(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
