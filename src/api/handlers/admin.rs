//! Admin endpoints: ticket review, prize inventory, CSV export.
//!
//! Every route requires the shared secret in the `x-admin-secret`
//! header; requests without it get a 401 before any work happens.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{
    AdminPrizeDto, CreatePrizeRequest, CreatePrizeResponse, TicketDetailResponse, TicketDto,
    TicketSearchParams, UpdatePrizeRequest, UpdateTicketRequest,
};
use crate::app_state::AppState;
use crate::error::{AppError, ErrorResponse};

/// Header carrying the admin shared secret.
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let secret = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    state.admin.authorize(secret)
}

/// `GET /admin/tickets` — Search tickets.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] without a valid secret.
#[utoipa::path(
    get,
    path = "/api/v1/admin/tickets",
    tag = "Admin",
    summary = "Search tickets",
    description = "Searches tickets by phone, code, or name fragment. Without a query, returns the most recent tickets.",
    params(TicketSearchParams),
    responses(
        (status = 200, description = "Matching tickets", body = Vec<TicketDto>),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
    )
)]
pub async fn search_tickets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TicketSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    let tickets = state.admin.search_tickets(params.q.as_deref()).await?;
    let dtos: Vec<TicketDto> = tickets.into_iter().map(TicketDto::from).collect();
    Ok(Json(dtos))
}

/// `GET /admin/tickets/export` — Export all tickets as CSV.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] without a valid secret.
#[utoipa::path(
    get,
    path = "/api/v1/admin/tickets/export",
    tag = "Admin",
    summary = "Export tickets as CSV",
    description = "Returns every ticket as a CSV download, newest first.",
    responses(
        (status = 200, description = "CSV export", body = String, content_type = "text/csv"),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
    )
)]
pub async fn export_tickets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    let csv = state.admin.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"tickets.csv\"",
            ),
        ],
        csv,
    ))
}

/// `GET /admin/tickets/:code` — Full ticket detail with proofs.
///
/// # Errors
///
/// Returns [`AppError::TicketNotFound`] for an unknown code.
#[utoipa::path(
    get,
    path = "/api/v1/admin/tickets/{code}",
    tag = "Admin",
    summary = "Get ticket detail",
    description = "Returns the full ticket row with attached proofs and the awarded prize snapshot, if redeemed.",
    params(
        ("code" = String, Path, description = "Ticket code"),
    ),
    responses(
        (status = 200, description = "Ticket detail", body = TicketDetailResponse),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
        (status = 404, description = "Unknown ticket code", body = ErrorResponse),
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    let detail = state.admin.get_ticket(&code).await?;
    Ok(Json(TicketDetailResponse::from(detail)))
}

/// `PATCH /admin/tickets/:code` — Update status and/or approval.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for an empty update and
/// [`AppError::TicketNotFound`] for an unknown code.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/tickets/{code}",
    tag = "Admin",
    summary = "Update a ticket",
    description = "Applies a status and/or approval change. At least one field must be present.",
    params(
        ("code" = String, Path, description = "Ticket code"),
    ),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Updated ticket", body = TicketDto),
        (status = 400, description = "Empty update", body = ErrorResponse),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
        (status = 404, description = "Unknown ticket code", body = ErrorResponse),
    )
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    let ticket = state
        .admin
        .update_ticket(&code, req.status, req.approved)
        .await?;
    Ok(Json(TicketDto::from(ticket)))
}

/// `DELETE /admin/tickets/:code` — Delete a ticket and its attachments.
///
/// # Errors
///
/// Returns [`AppError::TicketNotFound`] for an unknown code.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/tickets/{code}",
    tag = "Admin",
    summary = "Delete a ticket",
    description = "Removes the ticket with its proofs, redemption record, and stored proof files.",
    params(
        ("code" = String, Path, description = "Ticket code"),
    ),
    responses(
        (status = 204, description = "Ticket deleted"),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
        (status = 404, description = "Unknown ticket code", body = ErrorResponse),
    )
)]
pub async fn delete_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    state.admin.delete_ticket(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /admin/tickets/:code/proofs` — Proof rows for a ticket.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] without a valid secret.
#[utoipa::path(
    get,
    path = "/api/v1/admin/tickets/{code}/proofs",
    tag = "Admin",
    summary = "List proofs for a ticket",
    description = "Returns the proof rows recorded under a ticket code, in upload order.",
    params(
        ("code" = String, Path, description = "Ticket code"),
    ),
    responses(
        (status = 200, description = "Proof rows", body = Vec<crate::domain::Proof>),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
    )
)]
pub async fn list_proofs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    let proofs = state.admin.proofs_for(&code).await?;
    Ok(Json(proofs))
}

/// `GET /admin/prizes` — List all prizes including drained ones.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] without a valid secret.
#[utoipa::path(
    get,
    path = "/api/v1/admin/prizes",
    tag = "Admin",
    summary = "List prizes",
    description = "Returns every prize with stock and weight, newest first.",
    responses(
        (status = 200, description = "Prize list", body = Vec<AdminPrizeDto>),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
    )
)]
pub async fn list_prizes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    let prizes = state.admin.list_prizes().await?;
    let dtos: Vec<AdminPrizeDto> = prizes.into_iter().map(AdminPrizeDto::from).collect();
    Ok(Json(dtos))
}

/// `POST /admin/prizes` — Create a prize.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for invalid prize fields.
#[utoipa::path(
    post,
    path = "/api/v1/admin/prizes",
    tag = "Admin",
    summary = "Create a prize",
    description = "Adds a prize to the pool. Weight must be positive; quantity is -1 for unlimited or a non-negative stock count.",
    request_body = CreatePrizeRequest,
    responses(
        (status = 201, description = "Prize created", body = CreatePrizeResponse),
        (status = 400, description = "Invalid prize fields", body = ErrorResponse),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
    )
)]
pub async fn create_prize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePrizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    let id = state.admin.create_prize(req.into()).await?;
    Ok((StatusCode::CREATED, Json(CreatePrizeResponse { id })))
}

/// `PATCH /admin/prizes/:id` — Partially update a prize.
///
/// # Errors
///
/// Returns [`AppError::PrizeNotFound`] for an unknown ID.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/prizes/{id}",
    tag = "Admin",
    summary = "Update a prize",
    description = "Applies a partial update. Past redemption snapshots are never rewritten.",
    params(
        ("id" = i64, Path, description = "Prize ID"),
    ),
    request_body = UpdatePrizeRequest,
    responses(
        (status = 204, description = "Prize updated"),
        (status = 400, description = "Empty or invalid update", body = ErrorResponse),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
        (status = 404, description = "Unknown prize ID", body = ErrorResponse),
    )
)]
pub async fn update_prize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePrizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    state.admin.update_prize(id, req.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/prizes/:id` — Remove a prize from the pool.
///
/// # Errors
///
/// Returns [`AppError::PrizeNotFound`] for an unknown ID.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/prizes/{id}",
    tag = "Admin",
    summary = "Delete a prize",
    description = "Removes a prize from future draws. Past redemption snapshots are unaffected.",
    params(
        ("id" = i64, Path, description = "Prize ID"),
    ),
    responses(
        (status = 204, description = "Prize deleted"),
        (status = 401, description = "Missing or wrong admin secret", body = ErrorResponse),
        (status = 404, description = "Unknown prize ID", body = ErrorResponse),
    )
)]
pub async fn delete_prize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers)?;
    state.admin.delete_prize(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admin routes, all under `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/tickets", get(search_tickets))
        .route("/admin/tickets/export", get(export_tickets))
        .route(
            "/admin/tickets/{code}",
            get(get_ticket).patch(update_ticket).delete(delete_ticket),
        )
        .route("/admin/tickets/{code}/proofs", get(list_proofs))
        .route("/admin/prizes", post(create_prize).get(list_prizes))
        .route(
            "/admin/prizes/{id}",
            patch(update_prize).delete(delete_prize),
        )
}
