//! JSON error responses.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidAmount { .. }
            | Self::InvalidQuantity { .. }
            | Self::EmptyOrder
            | Self::AmountMismatch { .. }
            | Self::InsufficientFunds { .. }
            | Self::InsufficientStock { .. }
            | Self::IncompleteDeliveryInfo { .. }
            | Self::IncompleteConfirmation { .. }
            | Self::InvalidStatus { .. }
            | Self::InvalidOrderId { .. }
            | Self::Json(_)
            | Self::Form(_)
            | Self::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound { .. } | Self::ProductNotFound { .. } | Self::OrderNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Toml(_)
            | Self::FormEncode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            _ if status.is_server_error() => {
                error!(error = %self, "Request failed");
                json!({ "error": "Internal server error" })
            }
            Self::Json(source) => {
                warn!(error = %source, "Malformed JSON payload");
                json!({ "error": "Malformed payload", "details": source.to_string() })
            }
            Self::Form(source) => {
                warn!(error = %source, "Malformed form payload");
                json!({ "error": "Malformed payload", "details": source.to_string() })
            }
            Self::MalformedRequest { details } => {
                warn!(details = %details, "Request rejected by extractor");
                json!({ "error": "Malformed payload", "details": details })
            }
            _ => {
                warn!(error = %self, status = status.as_u16(), "Request rejected");
                json!({ "error": self.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::EmptyOrder.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::InsufficientFunds {
                current: 1.0,
                required: 2.0
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::OrderNotFound {
                reference: "x".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_malformed_request_body_is_json() {
        let response = Error::MalformedRequest {
            details: "expected value at line 1 column 1".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Malformed payload");
        assert_eq!(body["details"], "expected value at line 1 column 1");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response = Error::Database(sea_orm::DbErr::Custom("secret".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
