//! Permission gate.

use crate::command::CommandResult;
use crate::error::{BusError, BusResult};
use crate::handlers::{Middleware, Next, PipelineContext};
use crate::metrics;
use crate::security::PermissionService;
use async_trait::async_trait;

/// Raises [`BusError::PermissionDenied`] without continuing when
/// [`PermissionService::can_execute`] says no.
#[derive(Debug, Clone)]
pub struct PermissionMiddleware {
    service: PermissionService,
}

impl PermissionMiddleware {
    pub fn new(service: PermissionService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Middleware for PermissionMiddleware {
    fn name(&self) -> &'static str {
        "permission"
    }

    async fn handle(
        &self,
        ctx: &mut PipelineContext,
        next: Next<'_>,
    ) -> BusResult<CommandResult> {
        if !self.service.can_execute(&ctx.command, &ctx.category).await? {
            metrics::record_permission_denied();
            return Err(BusError::PermissionDenied {
                command: ctx.command.name().to_string(),
                user_id: ctx.command.user_id().map(str::to_string),
            });
        }
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::db::Repositories;
    use crate::error::ErrorKind;
    use crate::handlers::MiddlewarePipeline;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_denial_never_reaches_terminal() {
        let svc = PermissionService::from_repositories(&Repositories::memory());
        svc.enable("deploy").await.unwrap();
        svc.allow_user("deploy", "u1").await.unwrap();
        let pipeline = MiddlewarePipeline::default().with(PermissionMiddleware::new(svc));

        let calls = AtomicUsize::new(0);
        let terminal = |_: &mut PipelineContext| -> BusResult<CommandResult> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(CommandResult::ok(json!(null)))
        };

        let mut denied = PipelineContext::new(Command::new("deploy", "t").with_user("u2"), "ops");
        let err = pipeline.execute(&mut denied, &terminal).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(matches!(
            err,
            BusError::PermissionDenied { ref user_id, .. } if user_id.as_deref() == Some("u2")
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut allowed = PipelineContext::new(Command::new("deploy", "t").with_user("u1"), "ops");
        pipeline.execute(&mut allowed, &terminal).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
