//! Public endpoints: registration, redemption, ticket lookup, and
//! proof uploads.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ProofUploadResponse, RedeemRequest, RedeemResponse, RegisterRequest, RegisterResponse,
    SessionResponse, TicketLookupResponse,
};
use crate::app_state::AppState;
use crate::domain::{hash_ip, Platform, TicketStatus};
use crate::error::{AppError, ErrorResponse};
use crate::service::{NewRegistration, RegistrationService};

use super::client_ip;

/// Checks the fixed-window rate limit for one keyed action.
async fn enforce_rate_limit(state: &AppState, action: &str, ip: &str) -> Result<(), AppError> {
    let decision = state.rate_limiter.check(&format!("{action}:{ip}")).await;
    if !decision.allowed {
        return Err(AppError::RateLimited {
            retry_after_ms: state.rate_limiter.window_ms(),
        });
    }
    Ok(())
}

/// `POST /register` — Register for the event and receive a ticket code.
///
/// # Errors
///
/// Returns [`AppError`] on validation failure, duplicate registration,
/// or rate limiting.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    tag = "Public",
    summary = "Register for the event",
    description = "Creates a ticket after checking the anti-duplication guard (phone, network location, device). Proofs uploaded under the given session are re-keyed to the generated ticket code.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Ticket created", body = RegisterResponse),
        (status = 400, description = "Missing or malformed fields", body = ErrorResponse),
        (status = 409, description = "Duplicate phone, location, or device", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers);
    enforce_rate_limit(&state, "register", &ip).await?;

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let code = state
        .registration
        .register(NewRegistration {
            name: req.name,
            phone: req.phone,
            email: req.email,
            device_id: req.device_id,
            session_id: req.session_id,
            ip_hash: hash_ip(&ip, &state.config.ip_hash_salt),
            user_agent,
        })
        .await?;

    let response = RegisterResponse {
        code: code.into(),
        status: TicketStatus::Active,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /redeem` — Redeem a ticket for a prize.
///
/// # Errors
///
/// Returns [`AppError`] when the ticket is unknown, already finalized,
/// unapproved, or the pool is exhausted.
#[utoipa::path(
    post,
    path = "/api/v1/redeem",
    tag = "Public",
    summary = "Redeem a ticket",
    description = "Consumes an approved active ticket and awards a prize via the tiered weighted draw. A ticket can be redeemed at most once.",
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "Prize awarded", body = RedeemResponse),
        (status = 403, description = "Ticket awaiting approval", body = ErrorResponse),
        (status = 404, description = "Unknown ticket code", body = ErrorResponse),
        (status = 409, description = "Ticket already used or cancelled", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 503, description = "No prizes available", body = ErrorResponse),
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RedeemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers);
    enforce_rate_limit(&state, "redeem", &ip).await?;

    let ip_hash = hash_ip(&ip, &state.config.ip_hash_salt);
    let prize = state
        .redemption
        .redeem(&req.code, &req.device_id, &ip_hash)
        .await?;

    Ok(Json(RedeemResponse {
        prize: prize.into(),
    }))
}

/// `GET /tickets/:code` — Public ticket status lookup.
///
/// # Errors
///
/// Returns [`AppError::TicketNotFound`] for an unknown code.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{code}",
    tag = "Public",
    summary = "Look up a ticket",
    description = "Returns the ticket's status, approval flag, and the prize awarded if it has been redeemed. Identity fields stay hidden.",
    params(
        ("code" = String, Path, description = "Ticket code"),
    ),
    responses(
        (status = 200, description = "Ticket status", body = TicketLookupResponse),
        (status = 404, description = "Unknown ticket code", body = ErrorResponse),
    )
)]
pub async fn lookup_ticket(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.admin.get_ticket(&code).await?;
    Ok(Json(TicketLookupResponse::from_ticket(
        detail.ticket,
        detail.prize,
    )))
}

/// `POST /session` — Start a proof-upload session.
#[utoipa::path(
    post,
    path = "/api/v1/session",
    tag = "Public",
    summary = "Start a proof-upload session",
    description = "Issues an ephemeral session ID. Proofs uploaded under it are attached to the ticket created by a later registration with the same session.",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
    )
)]
pub async fn start_session() -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: RegistrationService::start_session(),
        }),
    )
}

/// `POST /proofs` — Upload one proof image for a session.
///
/// Multipart fields: `session_id` (text), `platform` (text, one of
/// `instagram`, `youtube`, `facebook`), `file` (image part).
///
/// # Errors
///
/// Returns [`AppError::Validation`] for missing parts, unknown
/// platforms, non-image content, or oversized files.
#[utoipa::path(
    post,
    path = "/api/v1/proofs",
    tag = "Public",
    summary = "Upload a follow proof",
    description = "Stores one screenshot proving a social follow. Accepts multipart form data with `session_id`, `platform`, and an image `file` part up to 5 MiB.",
    responses(
        (status = 201, description = "Proof stored", body = ProofUploadResponse),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
    )
)]
pub async fn upload_proof(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut session_id: Option<String> = None;
    let mut platform: Option<Platform> = None;
    let mut file: Option<(Option<String>, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("session_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid session_id: {e}")))?;
                session_id = Some(value);
            }
            Some("platform") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid platform: {e}")))?;
                platform = Some(
                    value
                        .parse()
                        .map_err(|_| AppError::Validation(format!("unknown platform: {value}")))?,
                );
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid file part: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let session_id =
        session_id.ok_or_else(|| AppError::Validation("missing session_id".to_string()))?;
    let platform =
        platform.ok_or_else(|| AppError::Validation("missing platform".to_string()))?;
    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("missing file".to_string()))?;

    let file_path = state
        .registration
        .upload_proof(
            &session_id,
            platform,
            file_name.as_deref(),
            content_type.as_deref(),
            &bytes,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProofUploadResponse { file_path })))
}

/// Public routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/redeem", post(redeem))
        .route("/tickets/{code}", get(lookup_ticket))
        .route("/session", post(start_session))
        .route("/proofs", post(upload_proof))
}
