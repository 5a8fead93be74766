use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::service::BookingError;

/// Errors returned by the handlers, rendered as plain text bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error parsing request body")]
    InvalidBody(#[source] JsonRejection),

    #[error("Invalid number of tickets")]
    InvalidTicketCount,

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("server is shutting down")]
    ShuttingDown,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidBody(rejection) => {
                tracing::debug!("rejected request body: {rejection}");
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidTicketCount => StatusCode::BAD_REQUEST,
            ApiError::Booking(err) => {
                tracing::debug!("booking failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, self.to_string()).into_response()
    }
}
