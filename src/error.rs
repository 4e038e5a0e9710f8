use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::billing::BillingError;

/// The main error type for fxa-shared callers
#[derive(Debug, thiserror::Error)]
pub enum FxaError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON body returned to API clients for a failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    error_id: String,
}

impl FxaError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The billing error kind carried by this error, if any.
    #[must_use]
    pub fn as_billing(&self) -> Option<&BillingError> {
        match self {
            Self::Billing(err) => Some(err),
            _ => None,
        }
    }

    /// Convert error to a response.
    ///
    /// Internal error details are only exposed when `dev_mode` is `true`.
    pub fn into_response_with_dev_mode(self, dev_mode: bool) -> Response {
        let status = self.status_code();

        let error = if dev_mode {
            self.to_string()
        } else {
            self.safe_message()
        };

        let error_id = uuid::Uuid::new_v4().to_string();
        let response = ErrorResponse {
            error,
            code: self.as_billing().map(BillingError::code),
            error_id: error_id.clone(),
        };

        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Request failed"
        );

        (status, Json(response)).into_response()
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Billing(err) => err.status_code(),
            Self::Internal(_) | Self::Config(_) | Self::Anyhow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a message that is safe to show clients in production.
    ///
    /// Client errors keep their message; server errors are replaced with a
    /// generic one and only logged.
    fn safe_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => format!("Bad request: {}", msg),
            Self::Billing(err) if err.is_client_error() => err.to_string(),
            Self::Billing(_) => "Billing service error".to_string(),
            Self::Internal(_) | Self::Config(_) | Self::Anyhow(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for FxaError {
    fn into_response(self) -> Response {
        self.into_response_with_dev_mode(false)
    }
}

/// Result type alias for fxa-shared operations
pub type Result<T> = std::result::Result<T, FxaError>;

impl From<serde_json::Error> for FxaError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            FxaError::BadRequest(format!("JSON error: {}", err))
        } else {
            FxaError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}
