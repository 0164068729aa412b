//! JSON error responses.
//!
//! Every handler returns [`ApiResult`]; the error side carries an
//! [`AppError`] and renders as `{"error": <code>, "message": <text>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use budgetaire_core::auth::PasswordError;
use budgetaire_core::budget::BudgetError;
use budgetaire_core::reports::ReportError;
use budgetaire_core::storage::StorageError;
use budgetaire_core::workflow::WorkflowError;
use budgetaire_db::RepositoryError;
use budgetaire_shared::{AppError, EmailError, JwtError};

/// Result type of route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 403 with the given message.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// 401 with the given message.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// 400 with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 404 with the given message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }

    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_internal() {
            error!(error = %self.0, "Request failed");
        }
        let body = json!({
            "error": self.0.error_code(),
            "message": self.0.public_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

macro_rules! via_app_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(err: $ty) -> Self {
                    Self(err.into())
                }
            }
        )*
    };
}

via_app_error!(
    RepositoryError,
    BudgetError,
    WorkflowError,
    ReportError,
    StorageError,
);

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        Self(AppError::ExternalService(err.to_string()))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(msg) => Self(AppError::Internal(msg)),
            JwtError::Expired => Self::unauthorized("Le jeton a expiré."),
            JwtError::WrongKind | JwtError::DecodingError(_) => {
                warn!(error = %err, "Rejected token");
                Self::unauthorized("Jeton invalide.")
            }
        }
    }
}
