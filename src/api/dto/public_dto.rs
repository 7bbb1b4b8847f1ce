//! DTOs for the public registration and redemption endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Prize, Ticket, TicketStatus};

/// Request body for `POST /register`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Registrant name.
    pub name: String,
    /// Registrant phone number.
    pub phone: String,
    /// Optional registrant email.
    #[serde(default)]
    pub email: Option<String>,
    /// Client-generated device identifier.
    pub device_id: String,
    /// Proof-upload session issued by `POST /session`.
    pub session_id: String,
}

/// Response body for `POST /register` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    /// Generated ticket code.
    pub code: String,
    /// Initial ticket status.
    pub status: TicketStatus,
}

/// Request body for `POST /redeem`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RedeemRequest {
    /// Ticket code to redeem.
    pub code: String,
    /// Client-generated device identifier.
    pub device_id: String,
}

/// Prize fields exposed to registrants.
///
/// Stock levels and draw weights stay server-side.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrizeDto {
    /// Prize identifier.
    pub id: i64,
    /// Prize title.
    pub title: String,
    /// Tier: `voucher` or `product`.
    pub kind: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optional image reference.
    pub image_url: Option<String>,
}

impl From<Prize> for PrizeDto {
    fn from(prize: Prize) -> Self {
        Self {
            id: prize.id,
            title: prize.title,
            kind: prize.kind.to_string(),
            description: prize.description,
            image_url: prize.image_url,
        }
    }
}

/// Response body for `POST /redeem`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RedeemResponse {
    /// The prize awarded to this ticket.
    pub prize: PrizeDto,
}

/// Response body for `GET /tickets/{code}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketLookupResponse {
    /// Ticket code.
    pub code: String,
    /// Registrant name.
    pub name: String,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Whether an administrator has approved the ticket.
    pub approved: bool,
    /// Prize awarded, when the ticket has been redeemed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<PrizeDto>,
}

impl TicketLookupResponse {
    /// Builds the public view of a ticket.
    #[must_use]
    pub fn from_ticket(ticket: Ticket, prize: Option<Prize>) -> Self {
        Self {
            code: ticket.code,
            name: ticket.name,
            status: ticket.status,
            approved: ticket.approved,
            prize: prize.map(PrizeDto::from),
        }
    }
}

/// Response body for `POST /session`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Ephemeral upload-session identifier.
    pub session_id: String,
}

/// Response body for `POST /proofs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProofUploadResponse {
    /// Relative path of the stored image.
    pub file_path: String,
}
