//! Structured logging and metrics around every invocation.

use crate::command::CommandResult;
use crate::error::BusResult;
use crate::handlers::{Middleware, Next, PipelineContext};
use crate::metrics;
use crate::telemetry::CommandTimer;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Logs entry and outcome, counts invocations and thrown errors, and times
/// the rest of the chain. Errors are re-raised unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(
        &self,
        ctx: &mut PipelineContext,
        next: Next<'_>,
    ) -> BusResult<CommandResult> {
        let command = ctx.command.name().to_string();
        let source = ctx.command.source().to_string();

        metrics::record_command(&command, &source);
        info!(
            command = %command,
            source = %source,
            user = ?ctx.command.user_id(),
            channel = ?ctx.command.channel_id(),
            category = %ctx.category,
            "Command received"
        );

        let timer = CommandTimer::new(&command);
        match next.run(ctx).await {
            Ok(result) => {
                let elapsed_ms = timer.elapsed_ms();
                match result.error() {
                    None => info!(command = %command, elapsed_ms, "Command succeeded"),
                    Some(reason) => {
                        warn!(command = %command, elapsed_ms, error = %reason, "Command failed")
                    }
                }
                Ok(result)
            }
            Err(err) => {
                metrics::record_command_error(&command, &source, err.code());
                error!(command = %command, code = err.code(), error = %err, "Command raised error");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::error::{BusError, ErrorKind};
    use crate::handlers::MiddlewarePipeline;
    use serde_json::json;

    fn context() -> PipelineContext {
        PipelineContext::new(Command::new("log-test", "unit"), "core")
    }

    #[tokio::test]
    async fn test_passes_results_through() {
        let pipeline = MiddlewarePipeline::default().with(LoggingMiddleware);

        let ok = |_: &mut PipelineContext| -> BusResult<CommandResult> {
            Ok(CommandResult::ok(json!(1)))
        };
        assert!(pipeline.execute(&mut context(), &ok).await.unwrap().success());

        let fail = |_: &mut PipelineContext| -> BusResult<CommandResult> {
            Ok(CommandResult::fail("nope"))
        };
        let result = pipeline.execute(&mut context(), &fail).await.unwrap();
        assert_eq!(result.error(), Some("nope"));
    }

    #[tokio::test]
    async fn test_rethrows_errors() {
        crate::metrics::init();
        let pipeline = MiddlewarePipeline::default().with(LoggingMiddleware);
        let throw = |_: &mut PipelineContext| -> BusResult<CommandResult> {
            Err(BusError::RateLimited {
                command: "log-test".into(),
                retry_after_ms: 5,
            })
        };

        let err = pipeline.execute(&mut context(), &throw).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(crate::metrics::gather_metrics().contains(r#"code="RATE_LIMITED""#));
    }
}
