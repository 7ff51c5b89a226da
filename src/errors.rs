use crate::accounting::AccountingError;
use crate::lookup::LookupError;
use crate::session::SessionError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        error!("internal error: {err}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<AccountingError> for AppError {
    fn from(err: AccountingError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::ProfileRequired => Self::new(StatusCode::CONFLICT, err.to_string()),
            SessionError::Invalid(_) | SessionError::Accounting(_) => {
                Self::bad_request(err.to_string())
            }
        }
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        let status = match &err {
            LookupError::NoMatch(_) => StatusCode::NOT_FOUND,
            LookupError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            LookupError::NoCredentials => StatusCode::SERVICE_UNAVAILABLE,
            LookupError::Upstream(_) | LookupError::Http(_) => {
                error!("nutrition lookup failed: {err}");
                StatusCode::BAD_GATEWAY
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
