//! Service error types with HTTP status code mapping.
//!
//! [`AppError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Store failures are logged server-side and surfaced to callers with a
//! generic message so internal detail never leaks to non-admin clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::TicketStatus;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "ticket is awaiting approval; please try again later",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`AppError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                |
/// |-----------|---------------------|----------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request            |
/// | 2000–2999 | Ticket state        | 403 / 404 / 409            |
/// | 3000–3999 | Server / store      | 500 Internal Server Error  |
/// | 4000–4999 | Inventory / auth    | 401 / 500 / 503            |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request validation failed (missing or malformed input).
    #[error("invalid request: {0}")]
    Validation(String),

    /// The phone number is already registered.
    #[error("phone number already registered")]
    DuplicatePhone,

    /// A registration already exists from the same network location.
    #[error("registration already exists from this location")]
    DuplicateLocation,

    /// A registration already exists from the same device.
    #[error("registration already exists from this device")]
    DuplicateDevice,

    /// No ticket with the given code exists.
    #[error("invalid ticket code: {0}")]
    TicketNotFound(String),

    /// The ticket has already reached a terminal state.
    #[error("ticket already {0}")]
    AlreadyFinalized(TicketStatus),

    /// No prize with the given ID exists. Admin-facing.
    #[error("prize not found: {0}")]
    PrizeNotFound(i64),

    /// The ticket exists but has not been approved yet. Transient: the
    /// caller should wait for approval and retry, this is not a hard
    /// failure.
    #[error("ticket is awaiting approval; please try again later")]
    PendingApproval,

    /// Client exceeded rate limit.
    #[error("too many requests; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// The prize pool is empty. Operator-fixable; users see a generic
    /// "try later".
    #[error("no prizes available")]
    NoPrizesAvailable,

    /// Voucher selection was attempted on an empty voucher pool. Fatal
    /// configuration error: operators must keep at least one unlimited
    /// voucher in the pool.
    #[error("no vouchers available")]
    NoVouchersAvailable,

    /// Ticket code generation failed to find a free code within the
    /// bounded attempt count. Fatal and alert-worthy, not a user retry.
    #[error("ticket code space exhausted")]
    CodeSpaceExhausted,

    /// Admin authentication failed.
    #[error("unauthorized")]
    Unauthorized,

    /// Backing store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::TicketNotFound(_) => 2001,
            Self::PrizeNotFound(_) => 2004,
            Self::AlreadyFinalized(_) => 2002,
            Self::PendingApproval => 2003,
            Self::DuplicatePhone => 2101,
            Self::DuplicateLocation => 2102,
            Self::DuplicateDevice => 2103,
            Self::Internal(_) => 3000,
            Self::Store(_) => 3001,
            Self::CodeSpaceExhausted => 3002,
            Self::NoPrizesAvailable => 4001,
            Self::NoVouchersAvailable => 4002,
            Self::Unauthorized => 4010,
            Self::RateLimited { .. } => 429,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TicketNotFound(_) | Self::PrizeNotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyFinalized(_)
            | Self::DuplicatePhone
            | Self::DuplicateLocation
            | Self::DuplicateDevice => StatusCode::CONFLICT,
            Self::PendingApproval => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NoPrizesAvailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NoVouchersAvailable
            | Self::CodeSpaceExhausted
            | Self::Store(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message sent to the client.
    ///
    /// Store and internal errors are redacted: the full error text is
    /// logged server-side while the caller receives a generic message.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Store(detail) | Self::Internal(detail) => {
                tracing::error!(%detail, code = self.error_code(), "internal failure");
                "internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<crate::domain::SelectionError> for AppError {
    fn from(e: crate::domain::SelectionError) -> Self {
        match e {
            crate::domain::SelectionError::NoPrizesAvailable => Self::NoPrizesAvailable,
            crate::domain::SelectionError::NoVouchersAvailable => Self::NoVouchersAvailable,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failure: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
