use axum::{
    http::{header::InvalidHeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failure of a single logging call.
///
/// A failed call never changes the committed payload or the header value.
#[derive(Error, Debug)]
pub enum LogError {
    /// Appending the row would push the encoded header past the ceiling.
    #[error("You can't log more than {limit} Bytes of data in the headers (payload would be {size} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The bound response has already transmitted its headers.
    #[error("Can't log anything: the headers were already sent")]
    HeadersAlreadySent,

    /// A log argument could not be converted to JSON.
    #[error("log argument is not serializable: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The encoded payload was rejected as a header value.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
}

impl LogError {
    /// Short machine-readable reason, used as a metrics label
    pub fn reason(&self) -> &'static str {
        match self {
            Self::PayloadTooLarge { .. } => "too_large",
            Self::HeadersAlreadySent => "headers_sent",
            Self::Serialization(_) => "serialization",
            Self::InvalidHeaderValue(_) => "invalid_header",
        }
    }
}

/// Failure to read back a captured header value
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("header is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("header does not contain a chromelogger payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Demo server error types
#[derive(Debug)]
pub enum AppError {
    /// A logging call was rejected
    Logging(LogError),
    /// The logging middleware is not installed on this route
    MissingConsole,
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "Logging error: {}", err),
            Self::MissingConsole => write!(f, "Chrome logger middleware is not installed"),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Logging(LogError::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Logging(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingConsole => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type_name(&self),
            }
        }));

        (status, body).into_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::Logging(LogError::PayloadTooLarge { .. }) => "payload_too_large",
        AppError::Logging(LogError::HeadersAlreadySent) => "headers_already_sent",
        AppError::Logging(_) => "logging_error",
        AppError::MissingConsole => "missing_console",
        AppError::InternalError(_) => "internal_error",
    }
}

impl From<LogError> for AppError {
    fn from(err: LogError) -> Self {
        Self::Logging(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::MAX_HEADER_BYTES;

    #[test]
    fn test_log_error_messages() {
        let err = LogError::PayloadTooLarge {
            size: 300_000,
            limit: MAX_HEADER_BYTES,
        };
        assert!(err
            .to_string()
            .starts_with("You can't log more than 245760 Bytes of data in the headers"));
        assert!(LogError::HeadersAlreadySent
            .to_string()
            .contains("headers were already sent"));
    }

    #[test]
    fn test_error_type_name() {
        assert_eq!(
            error_type_name(&AppError::Logging(LogError::HeadersAlreadySent)),
            "headers_already_sent"
        );
        assert_eq!(error_type_name(&AppError::MissingConsole), "missing_console");
        assert_eq!(
            error_type_name(&AppError::InternalError("boom".to_string())),
            "internal_error"
        );
    }

    #[tokio::test]
    async fn test_missing_console_maps_to_500() {
        let response = AppError::MissingConsole.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::InternalError("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_payload_too_large_maps_to_413() {
        let error = AppError::from(LogError::PayloadTooLarge {
            size: 1,
            limit: 0,
        });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_headers_sent_maps_to_500() {
        let response = AppError::from(LogError::HeadersAlreadySent).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
