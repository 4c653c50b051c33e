//! Cross-cutting pipeline stages.
//!
//! The canonical stack, outermost first:
//!
//! ```text
//! Logging → Permission → RateLimit → Audit → handler
//! ```
//!
//! Logging sees every outcome, including thrown errors. Audit sits innermost
//! so only invocations that reach a returned result are recorded.

mod audit;
mod logging;
mod permission;
mod rate_limit;

pub use audit::AuditMiddleware;
pub use logging::LoggingMiddleware;
pub use permission::PermissionMiddleware;
pub use rate_limit::RateLimitMiddleware;

use crate::db::AuditRepository;
use crate::handlers::MiddlewarePipeline;
use crate::security::{PermissionService, RateLimitService};
use std::sync::Arc;

/// Extension key set by [`RateLimitMiddleware`] with the applied cooldown.
pub const COOLDOWN_EXTENSION: &str = "cooldown_ms";

/// Build the `[Logging, Permission, RateLimit, Audit]` pipeline.
pub fn default_stack(
    permissions: PermissionService,
    rate_limits: RateLimitService,
    audit: Arc<dyn AuditRepository>,
) -> MiddlewarePipeline {
    MiddlewarePipeline::default()
        .with(LoggingMiddleware)
        .with(PermissionMiddleware::new(permissions))
        .with(RateLimitMiddleware::new(rate_limits))
        .with(AuditMiddleware::new(audit))
}
