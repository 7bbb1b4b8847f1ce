//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::rate_limit::RateLimiter;
use crate::service::{AdminService, RedemptionService, RegistrationService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registration flow: guard, code issue, proof sessions.
    pub registration: Arc<RegistrationService>,
    /// Redemption flow: weighted draw and finalize.
    pub redemption: Arc<RedemptionService>,
    /// Secret-guarded review and inventory surface.
    pub admin: Arc<AdminService>,
    /// Per-IP fixed-window rate limiter for the public write endpoints.
    pub rate_limiter: Arc<RateLimiter>,
    /// Service configuration.
    pub config: Arc<AppConfig>,
}
