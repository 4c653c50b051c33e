//! Cooldown gate.

use super::COOLDOWN_EXTENSION;
use crate::command::CommandResult;
use crate::error::{BusError, BusResult};
use crate::handlers::{Middleware, Next, PipelineContext};
use crate::metrics;
use crate::security::RateLimitService;
use async_trait::async_trait;

/// Consumes one use of the command before continuing; a rejection is raised
/// as [`BusError::RateLimited`] and the chain stops here.
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    service: RateLimitService,
}

impl RateLimitMiddleware {
    pub fn new(service: RateLimitService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn handle(
        &self,
        ctx: &mut PipelineContext,
        next: Next<'_>,
    ) -> BusResult<CommandResult> {
        if let Err(err) = self.service.try_consume(&ctx.command, &ctx.category).await {
            if matches!(err, BusError::RateLimited { .. }) {
                metrics::record_rate_limited();
            }
            return Err(err);
        }

        let cooldown_ms = self.service.cooldown_for(&ctx.category);
        ctx.insert_extension(COOLDOWN_EXTENSION, cooldown_ms.into());
        next.run(ctx).await
    }
}
