//! # raffle-gateway
//!
//! REST backend for an event registration and prize-redemption raffle.
//!
//! Registrants upload social follow proofs, register for a human-typed
//! ticket code, and once approved redeem it for a prize chosen by a
//! tiered weighted draw: scarce products win at most a configured
//! probability per draw, vouchers cover the rest. Finalization is
//! at-most-once under concurrency via conditional updates inside one
//! SQLite transaction.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │     └── RateLimiter (rate_limit/)
//!     │
//!     ├── RegistrationService / RedemptionService / AdminService (service/)
//!     │     ├── selection (domain/): tiered weighted draw
//!     │     ├── ProofStore (proof_store/): uploaded images
//!     │     └── Notifier (notify/): Telegram sink
//!     │
//!     └── SQLite Persistence (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod proof_store;
pub mod rate_limit;
pub mod service;
