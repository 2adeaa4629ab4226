//! API error types and the JSON error body they render to.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

use crate::database::StoreError;
use crate::types::PayloadError;

pub const NOT_FOUND_MESSAGE: &str = "No data found";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Required accelerometer axis absent from the payload
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {0} must be a number")]
    InvalidField(&'static str),

    /// Body is not valid JSON
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("No data found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PayloadError> for ApiError {
    fn from(e: PayloadError) -> Self {
        match e {
            PayloadError::MissingField(field) => ApiError::MissingField(field),
            PayloadError::InvalidField(field) => ApiError::InvalidField(field),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MissingField(_)
            | Self::InvalidField(_)
            | Self::MalformedPayload(_)
            | Self::StoreUnavailable(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::NotFound => warn!("API error: {}", self),
            _ => error!("API error: {}", self),
        }

        let body = ErrorResponse {
            status: "error",
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MissingField("accX").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::StoreUnavailable(StoreError::Disconnected).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_matches_wire_contract() {
        assert_eq!(ApiError::NotFound.to_string(), NOT_FOUND_MESSAGE);
    }

    #[test]
    fn payload_errors_keep_the_field_name() {
        let err: ApiError = PayloadError::MissingField("accZ").into();
        assert!(matches!(err, ApiError::MissingField("accZ")));
        assert_eq!(err.to_string(), "missing required field: accZ");
    }
}
