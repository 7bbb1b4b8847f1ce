//! Data Transfer Objects for REST request/response serialization.
//!
//! Public DTOs never expose stock levels, draw weights, or identity
//! hashes; the admin DTOs carry the full rows.

pub mod admin_dto;
pub mod public_dto;

pub use admin_dto::*;
pub use public_dto::*;
