//! DTOs for the secret-guarded admin endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    NewPrize, Prize, PrizeKind, PrizePatch, Proof, Ticket, TicketStatus, UNLIMITED_QUANTITY,
};
use crate::service::TicketDetail;

use super::public_dto::PrizeDto;

/// Full ticket row as shown to administrators.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketDto {
    /// Row identifier.
    pub id: i64,
    /// Registrant name.
    pub name: String,
    /// Registrant phone number.
    pub phone: String,
    /// Registrant email, if given.
    pub email: Option<String>,
    /// Ticket code.
    pub code: String,
    /// Lifecycle state.
    pub status: TicketStatus,
    /// Approval flag.
    pub approved: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Salted hash of the registering client's address.
    pub ip_hash: String,
    /// Registering device identifier.
    pub device_id: String,
    /// Registering client user agent, if any.
    pub user_agent: Option<String>,
}

impl From<Ticket> for TicketDto {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            name: t.name,
            phone: t.phone,
            email: t.email,
            code: t.code,
            status: t.status,
            approved: t.approved,
            created_at: t.created_at,
            updated_at: t.updated_at,
            ip_hash: t.ip_hash,
            device_id: t.device_id,
            user_agent: t.user_agent,
        }
    }
}

/// Response body for `GET /admin/tickets/{code}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketDetailResponse {
    /// The ticket row.
    pub ticket: TicketDto,
    /// Proof images attached to the ticket.
    pub proofs: Vec<Proof>,
    /// Prize snapshot, when the ticket has been redeemed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<PrizeDto>,
}

impl From<TicketDetail> for TicketDetailResponse {
    fn from(detail: TicketDetail) -> Self {
        Self {
            ticket: detail.ticket.into(),
            proofs: detail.proofs,
            prize: detail.prize.map(PrizeDto::from),
        }
    }
}

/// Query parameters for `GET /admin/tickets`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct TicketSearchParams {
    /// Phone, code, or name fragment; omit to list recent tickets.
    #[serde(default)]
    pub q: Option<String>,
}

/// Request body for `PATCH /admin/tickets/{code}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateTicketRequest {
    /// New lifecycle state, if changing.
    #[serde(default)]
    pub status: Option<TicketStatus>,
    /// New approval flag, if changing.
    #[serde(default)]
    pub approved: Option<bool>,
}

/// Request body for `POST /admin/prizes`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePrizeRequest {
    /// Prize title.
    pub title: String,
    /// Tier discriminator.
    pub kind: PrizeKind,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional image reference.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Initial stock; `-1` or omitted means unlimited.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Relative draw weight within the tier; defaults to `1.0`.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_quantity() -> i64 {
    UNLIMITED_QUANTITY
}

fn default_weight() -> f64 {
    1.0
}

impl From<CreatePrizeRequest> for NewPrize {
    fn from(req: CreatePrizeRequest) -> Self {
        Self {
            title: req.title,
            kind: req.kind,
            description: req.description,
            image_url: req.image_url,
            quantity: req.quantity,
            weight: req.weight,
        }
    }
}

/// Response body for `POST /admin/prizes` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePrizeResponse {
    /// Identifier of the created prize.
    pub id: i64,
}

/// Request body for `PATCH /admin/prizes/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePrizeRequest {
    /// New title, if changing.
    #[serde(default)]
    pub title: Option<String>,
    /// New tier, if changing.
    #[serde(default)]
    pub kind: Option<PrizeKind>,
    /// New description, if changing.
    #[serde(default)]
    pub description: Option<String>,
    /// New image reference, if changing.
    #[serde(default)]
    pub image_url: Option<String>,
    /// New stock level, if changing.
    #[serde(default)]
    pub quantity: Option<i64>,
    /// New draw weight, if changing.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl From<UpdatePrizeRequest> for PrizePatch {
    fn from(req: UpdatePrizeRequest) -> Self {
        Self {
            title: req.title,
            kind: req.kind,
            description: req.description,
            image_url: req.image_url,
            quantity: req.quantity,
            weight: req.weight,
        }
    }
}

/// Prize list entry for `GET /admin/prizes`, including stock and weight.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPrizeDto {
    /// Prize identifier.
    pub id: i64,
    /// Prize title.
    pub title: String,
    /// Tier discriminator.
    pub kind: PrizeKind,
    /// Optional description.
    pub description: Option<String>,
    /// Optional image reference.
    pub image_url: Option<String>,
    /// Remaining stock (`-1` = unlimited).
    pub quantity: i64,
    /// Relative draw weight.
    pub weight: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Prize> for AdminPrizeDto {
    fn from(p: Prize) -> Self {
        Self {
            id: p.id,
            title: p.title,
            kind: p.kind,
            description: p.description,
            image_url: p.image_url,
            quantity: p.quantity,
            weight: p.weight,
            created_at: p.created_at,
        }
    }
}
