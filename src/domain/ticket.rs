//! Ticket model and lifecycle states.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a ticket.
///
/// Transitions are one-way: `active → used` (successful redemption) and
/// `active → cancelled` (admin action). Terminal states are never
/// re-entered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Ticket may still be redeemed (subject to approval).
    Active,
    /// Ticket has been redeemed. Terminal.
    Used,
    /// Ticket was cancelled by an administrator. Terminal.
    Cancelled,
}

impl TicketStatus {
    /// Returns `true` for terminal states that cannot be redeemed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Used | Self::Cancelled)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// A one-time redemption right issued to a registrant.
///
/// `code` is globally unique and immutable after creation. A ticket may
/// be redeemed only when `status == Active && approved`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    /// Auto-increment row ID.
    pub id: i64,
    /// Registrant name.
    pub name: String,
    /// Registrant phone number (unique across all tickets).
    pub phone: String,
    /// Optional registrant email.
    pub email: Option<String>,
    /// Human-readable ticket code (unique, immutable once assigned).
    pub code: String,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Whether an administrator has approved the ticket for redemption.
    pub approved: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last state mutation.
    pub updated_at: DateTime<Utc>,
    /// Salted hash of the registrant's network address.
    pub ip_hash: String,
    /// Client-supplied device identifier.
    pub device_id: String,
    /// User agent captured at registration time.
    pub user_agent: Option<String>,
}

impl Ticket {
    /// Returns `true` if the ticket currently satisfies the redemption
    /// preconditions (`active` and approved).
    #[must_use]
    pub const fn is_redeemable(&self) -> bool {
        matches!(self.status, TicketStatus::Active) && self.approved
    }
}

/// Field set required to create a ticket at registration time.
///
/// New tickets always start as `active` and unapproved.
#[derive(Debug, Clone)]
pub struct NewTicket {
    /// Registrant name.
    pub name: String,
    /// Registrant phone number.
    pub phone: String,
    /// Optional registrant email.
    pub email: Option<String>,
    /// Generated ticket code.
    pub code: String,
    /// Salted hash of the registrant's network address.
    pub ip_hash: String,
    /// Client-supplied device identifier.
    pub device_id: String,
    /// User agent captured at registration time.
    pub user_agent: Option<String>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_ticket(status: TicketStatus, approved: bool) -> Ticket {
        Ticket {
            id: 1,
            name: "Jane".to_string(),
            phone: "+900000001".to_string(),
            email: None,
            code: "DRM25-KOL-A1B2C3".to_string(),
            status,
            approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ip_hash: "hash".to_string(),
            device_id: "device-1".to_string(),
            user_agent: None,
        }
    }

    #[test]
    fn redeemable_requires_active_and_approved() {
        assert!(make_ticket(TicketStatus::Active, true).is_redeemable());
        assert!(!make_ticket(TicketStatus::Active, false).is_redeemable());
        assert!(!make_ticket(TicketStatus::Used, true).is_redeemable());
        assert!(!make_ticket(TicketStatus::Cancelled, true).is_redeemable());
    }

    #[test]
    fn terminal_states() {
        assert!(!TicketStatus::Active.is_terminal());
        assert!(TicketStatus::Used.is_terminal());
        assert!(TicketStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_serde_is_lowercase() {
        let json = serde_json::to_string(&TicketStatus::Cancelled).ok();
        assert_eq!(json.as_deref(), Some("\"cancelled\""));
    }
}
