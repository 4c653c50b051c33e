//! Audit trail writer.

use crate::command::CommandResult;
use crate::db::AuditRepository;
use crate::error::BusResult;
use crate::handlers::{Middleware, Next, PipelineContext};
use crate::metrics;
use async_trait::async_trait;
use std::sync::Arc;

/// Records `(command, result)` after the rest of the chain returns.
///
/// A thrown error from downstream propagates before the write, so only
/// invocations that produced a result (`Ok` or `Fail`) are audited. A failed
/// write is raised as a repository error.
#[derive(Clone)]
pub struct AuditMiddleware {
    repo: Arc<dyn AuditRepository>,
}

impl AuditMiddleware {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }
}

impl std::fmt::Debug for AuditMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditMiddleware").finish_non_exhaustive()
    }
}

#[async_trait]
impl Middleware for AuditMiddleware {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn handle(
        &self,
        ctx: &mut PipelineContext,
        next: Next<'_>,
    ) -> BusResult<CommandResult> {
        let result = next.run(ctx).await?;
        self.repo.log(&ctx.command, &result).await?;
        metrics::record_audit_entry();
        Ok(result)
    }
}
