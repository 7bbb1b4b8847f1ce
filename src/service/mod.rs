//! Application services layered between the HTTP handlers and the
//! store.
//!
//! Each service owns one flow: [`registration`] issues tickets behind
//! the anti-duplication guard, [`redemption`] runs the weighted prize
//! draw and finalize, and [`admin`] covers the secret-guarded review
//! and inventory surface.

pub mod admin;
pub mod redemption;
pub mod registration;

pub use admin::{AdminService, TicketDetail};
pub use redemption::{RandomSource, RedemptionService};
pub use registration::{NewRegistration, RegistrationService, MAX_CODE_ATTEMPTS};
