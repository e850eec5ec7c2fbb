//! HTTP error responses.
//!
//! Domain errors are mapped to a status code and rendered as
//! `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chatbridge_core::{RequestError, UpstreamError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error that ends a request.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        let status = match err {
            RequestError::MissingBearerToken => StatusCode::UNAUTHORIZED,
            RequestError::InvalidPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::MissingChatbotUuid
            | RequestError::NoUserMessage
            | RequestError::UnrecognizedRole { .. } => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, detail } => Self::new(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                format!("Upstream error: {detail}"),
            ),
            UpstreamError::InvalidResponse(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                "Non-JSON response received from upstream",
            ),
            other @ (UpstreamError::Network(_) | UpstreamError::Timeout(_)) => {
                Self::new(StatusCode::BAD_GATEWAY, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        } else {
            warn!(status = self.status.as_u16(), error = %self.message, "Request rejected");
        }

        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(RequestError::MissingBearerToken).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(RequestError::InvalidPayload("x".into())).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(RequestError::NoUserMessage).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_status_is_mirrored() {
        let err = ApiError::from(UpstreamError::Status {
            status: 403,
            detail: "Invalid token".into(),
        });
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Upstream error: Invalid token");
    }

    #[test]
    fn bogus_upstream_status_becomes_bad_gateway() {
        let err = ApiError::from(UpstreamError::Status {
            status: 42,
            detail: "?".into(),
        });
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn transport_failures_are_bad_gateway() {
        for err in [
            UpstreamError::Network("refused".into()),
            UpstreamError::Timeout("20s".into()),
            UpstreamError::InvalidResponse("<html>".into()),
        ] {
            assert_eq!(ApiError::from(err).status, StatusCode::BAD_GATEWAY);
        }
    }
}
