//! Domain layer: tickets, prizes, proofs, and the selection engine.
//!
//! This module contains the service-side domain model: ticket identity
//! and lifecycle, prize inventory semantics, proof records, client
//! identity hashing, and the pure tiered weighted-selection algorithm at
//! the heart of redemption.

pub mod identity;
pub mod prize;
pub mod proof;
pub mod selection;
pub mod ticket;
pub mod ticket_code;

pub use identity::hash_ip;
pub use prize::{NewPrize, Prize, PrizeKind, PrizePatch, Redemption, UNLIMITED_QUANTITY};
pub use proof::{Platform, Proof};
pub use selection::{SelectionError, pick_weighted, select_prize};
pub use ticket::{NewTicket, Ticket, TicketStatus};
pub use ticket_code::{CODE_PREFIX, TicketCode};
