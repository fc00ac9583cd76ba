// src/errors.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for the kite-dispatch engine
#[derive(Debug)]
pub enum DispatchError {
    // Entity lookups
    DriverNotFound(String),
    BookingNotFound(String),
    RideRequestNotFound(String),
    SessionNotFound(String),
    OfferNotFound(String),

    // Caller-correctable validation
    MissingRequiredField(String),
    InvalidFieldValue { field: String, value: String, reason: String },
    ValidationFailed(Vec<ValidationError>),
    InvalidRoute(String),
    InvalidDriverId(String),
    InvalidBookingId(String),
    InvalidRequestId(String),

    // Lifecycle violations
    InvalidTransition { from: String, to: String },
    SessionClosed(String),
    RequestAlreadyAccepted(String),
    RequestExpired(String),
    CounterAlreadySubmitted(String),
    DriverNotAvailable(String),

    // Outbound event delivery
    EventDeliveryFailed(String),

    // Network and HTTP client errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),
    InvalidFormat(String),

    // Collaborator throttling and catch-all
    RateLimitExceeded,
    InternalServer(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::DriverNotFound(id) => write!(f, "Driver not found: {}", id),
            DispatchError::BookingNotFound(id) => write!(f, "Booking not found: {}", id),
            DispatchError::RideRequestNotFound(id) => write!(f, "Ride request not found: {}", id),
            DispatchError::SessionNotFound(id) => write!(f, "Negotiation session not found: {}", id),
            DispatchError::OfferNotFound(id) => write!(f, "Offer not found: {}", id),

            DispatchError::MissingRequiredField(field) => {
                write!(f, "Missing required field: {}", field)
            }
            DispatchError::InvalidFieldValue { field, value, reason } => {
                write!(f, "Invalid value '{}' for field '{}': {}", value, field, reason)
            }
            DispatchError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            DispatchError::InvalidRoute(msg) => write!(f, "Invalid route: {}", msg),
            DispatchError::InvalidDriverId(id) => write!(f, "Invalid driver ID: {}", id),
            DispatchError::InvalidBookingId(id) => write!(f, "Invalid booking ID: {}", id),
            DispatchError::InvalidRequestId(id) => write!(f, "Invalid ride request ID: {}", id),

            DispatchError::InvalidTransition { from, to } => {
                write!(f, "Illegal booking status transition: {} -> {}", from, to)
            }
            DispatchError::SessionClosed(id) => {
                write!(f, "Negotiation session already resolved: {}", id)
            }
            DispatchError::RequestAlreadyAccepted(id) => {
                write!(f, "Ride request already accepted by another driver: {}", id)
            }
            DispatchError::RequestExpired(id) => write!(f, "Ride request expired: {}", id),
            DispatchError::CounterAlreadySubmitted(id) => {
                write!(f, "Counter-offer already submitted for offer: {}", id)
            }
            DispatchError::DriverNotAvailable(id) => write!(f, "Driver is not available: {}", id),

            DispatchError::EventDeliveryFailed(msg) => write!(f, "Event delivery failed: {}", msg),

            DispatchError::NetworkTimeout => write!(f, "Network request timed out"),
            DispatchError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            DispatchError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),

            DispatchError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            DispatchError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),
            DispatchError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),

            DispatchError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            DispatchError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for DispatchError {}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            DispatchError::DriverNotFound(id) => {
                (StatusCode::NOT_FOUND, "driver_not_found", format!("Driver not found: {}", id), None)
            }
            DispatchError::BookingNotFound(id) => {
                (StatusCode::NOT_FOUND, "booking_not_found", format!("Booking not found: {}", id), None)
            }
            DispatchError::RideRequestNotFound(id) => {
                (StatusCode::NOT_FOUND, "ride_request_not_found", format!("Ride request not found: {}", id), None)
            }
            DispatchError::SessionNotFound(id) => {
                (StatusCode::NOT_FOUND, "session_not_found", format!("Session not found: {}", id), None)
            }
            DispatchError::OfferNotFound(id) => {
                (StatusCode::NOT_FOUND, "offer_not_found", format!("Offer not found: {}", id), None)
            }

            DispatchError::MissingRequiredField(field) => {
                (StatusCode::BAD_REQUEST, "missing_field", format!("Missing required field: {}", field), None)
            }
            DispatchError::InvalidFieldValue { field, reason, .. } => {
                (StatusCode::BAD_REQUEST, "invalid_field", format!("Invalid value for {}: {}", field, reason), None)
            }
            DispatchError::ValidationFailed(errors) => {
                let details = serde_json::to_value(&errors).ok();
                (StatusCode::BAD_REQUEST, "validation_failed", "Validation errors occurred".to_string(), details)
            }
            DispatchError::InvalidRoute(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_route", format!("Invalid route: {}", msg), None)
            }
            DispatchError::InvalidDriverId(id) => {
                (StatusCode::BAD_REQUEST, "invalid_driver_id", format!("Invalid driver ID: {}", id), None)
            }
            DispatchError::InvalidBookingId(id) => {
                (StatusCode::BAD_REQUEST, "invalid_booking_id", format!("Invalid booking ID: {}", id), None)
            }
            DispatchError::InvalidRequestId(id) => {
                (StatusCode::BAD_REQUEST, "invalid_request_id", format!("Invalid ride request ID: {}", id), None)
            }

            DispatchError::InvalidTransition { from, to } => {
                (StatusCode::CONFLICT, "invalid_transition", format!("Illegal booking status transition: {} -> {}", from, to), None)
            }
            DispatchError::SessionClosed(id) => {
                (StatusCode::CONFLICT, "session_closed", format!("Negotiation session already resolved: {}", id), None)
            }
            DispatchError::RequestAlreadyAccepted(id) => {
                (StatusCode::CONFLICT, "request_already_accepted", format!("Ride request already accepted: {}", id), None)
            }
            DispatchError::RequestExpired(id) => {
                (StatusCode::CONFLICT, "request_expired", format!("Ride request expired: {}", id), None)
            }
            DispatchError::CounterAlreadySubmitted(id) => {
                (StatusCode::CONFLICT, "counter_already_submitted", format!("Counter-offer already submitted: {}", id), None)
            }
            DispatchError::DriverNotAvailable(id) => {
                (StatusCode::CONFLICT, "driver_not_available", format!("Driver is not available: {}", id), None)
            }

            DispatchError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded", "Rate limit exceeded".to_string(), None)
            }

            // Delivery, network and serialization failures map to internal errors
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", self.to_string(), None),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type DispatchResult<T> = Result<T, DispatchError>;

// Conversion implementations for common error types
impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::NetworkTimeout
        } else if err.is_connect() {
            DispatchError::NetworkConnection(err.to_string())
        } else {
            DispatchError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            DispatchError::JsonParsing(err.to_string())
        } else {
            DispatchError::JsonSerialization(err.to_string())
        }
    }
}

impl From<chrono::ParseError> for DispatchError {
    fn from(err: chrono::ParseError) -> Self {
        DispatchError::InvalidFormat(format!("Invalid date/time format: {}", err))
    }
}

// Helper functions for creating common errors
impl DispatchError {
    pub fn driver_not_found(driver_id: impl Into<String>) -> Self {
        DispatchError::DriverNotFound(driver_id.into())
    }

    pub fn booking_not_found(booking_id: impl Into<String>) -> Self {
        DispatchError::BookingNotFound(booking_id.into())
    }

    pub fn request_not_found(request_id: impl Into<String>) -> Self {
        DispatchError::RideRequestNotFound(request_id.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        DispatchError::MissingRequiredField(field.into())
    }

    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        DispatchError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        DispatchError::InternalServer(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }
}
