//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::BookingError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Booking, cancellation, or query failure.
    Booking(BookingError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Booking(err) => booking_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn booking_error_to_response(err: BookingError) -> (StatusCode, String) {
    match &err {
        BookingError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        BookingError::NoAvailability
        | BookingError::InsufficientSeats { .. }
        | BookingError::NoContiguousBlock { .. } => (StatusCode::CONFLICT, err.to_string()),
        BookingError::OverRefund { .. } => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        BookingError::StoreUnavailable(_) => {
            tracing::error!(error = %err, "seat store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}
