//! Command bus: the single entry point transports call.
//!
//! `execute` resolves the command in the registry, builds the
//! [`PipelineContext`], and drives the middleware pipeline with the
//! resolved handler as the terminal step.

use crate::command::{Command, CommandResult};
use crate::error::{BusError, BusResult};
use crate::handlers::{
    CommandRegistry, DEFAULT_CATEGORY, Handler, MiddlewarePipeline, PipelineContext, Terminal,
};
use crate::telemetry::spans;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Instrument, debug};

/// Terminal that runs the resolved handler on the context's command.
struct HandlerTerminal {
    handler: Arc<dyn Handler>,
}

#[async_trait]
impl Terminal for HandlerTerminal {
    async fn call(&self, ctx: &mut PipelineContext) -> BusResult<CommandResult> {
        self.handler.handle(&ctx.command).await
    }
}

/// Routes commands through the pipeline to their handlers.
///
/// Holds no mutable state; clone freely and share across tasks.
#[derive(Clone)]
pub struct CommandBus {
    registry: Arc<CommandRegistry>,
    pipeline: Arc<MiddlewarePipeline>,
}

impl CommandBus {
    pub fn new(registry: Arc<CommandRegistry>, pipeline: MiddlewarePipeline) -> Self {
        Self {
            registry,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn pipeline(&self) -> &MiddlewarePipeline {
        &self.pipeline
    }

    /// Run `command` through the pipeline.
    ///
    /// Unknown names fail with [`BusError::CommandNotFound`] before any stage
    /// runs. Every other error raised inside the pipeline propagates as is.
    pub async fn execute(&self, command: Command) -> BusResult<CommandResult> {
        let Some(meta) = self.registry.get_meta(command.name()) else {
            debug!(command = %command.name(), "Unknown command");
            return Err(BusError::CommandNotFound(command.name().to_string()));
        };

        let category = if meta.category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            meta.category.clone()
        };
        let terminal = HandlerTerminal {
            handler: Arc::clone(&meta.handler),
        };

        let span = spans::command(&command, &category);
        let mut ctx = PipelineContext::new(command, category);
        self.pipeline
            .execute(&mut ctx, &terminal)
            .instrument(span)
            .await
    }
}

impl std::fmt::Debug for CommandBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBus")
            .field("commands", &self.registry.len())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::handlers::{Middleware, Next, RegisterOptions};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Upper;

    #[async_trait]
    impl Handler for Upper {
        async fn handle(&self, command: &Command) -> BusResult<CommandResult> {
            Ok(CommandResult::ok(json!(command.args().join(" ").to_uppercase())))
        }
    }

    /// Records the category each invocation saw.
    #[derive(Default)]
    struct Spy {
        seen: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Middleware for Arc<Spy> {
        fn name(&self) -> &'static str {
            "spy"
        }

        async fn handle(
            &self,
            ctx: &mut PipelineContext,
            next: Next<'_>,
        ) -> BusResult<CommandResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().push(ctx.category.clone());
            next.run(ctx).await
        }
    }

    fn bus_with_spy() -> (CommandBus, Arc<Spy>) {
        let mut registry = CommandRegistry::new();
        registry.register("upper", Arc::new(Upper), RegisterOptions::default());
        registry.register(
            "shout",
            Arc::new(Upper),
            RegisterOptions::default().category("messaging"),
        );

        let spy = Arc::new(Spy::default());
        let pipeline = MiddlewarePipeline::default().with(Arc::clone(&spy));
        (CommandBus::new(Arc::new(registry), pipeline), spy)
    }

    #[tokio::test]
    async fn test_routes_to_handler() {
        let (bus, spy) = bus_with_spy();
        let result = bus
            .execute(Command::new("upper", "t").with_args(["hi", "there"]))
            .await
            .unwrap();
        assert_eq!(result, CommandResult::ok(json!("HI THERE")));
        assert_eq!(*spy.seen.lock(), vec!["core"]);
    }

    #[tokio::test]
    async fn test_category_from_meta() {
        let (bus, spy) = bus_with_spy();
        bus.execute(Command::new("shout", "t")).await.unwrap();
        assert_eq!(*spy.seen.lock(), vec!["messaging"]);
    }

    #[tokio::test]
    async fn test_unknown_command_skips_pipeline() {
        let (bus, spy) = bus_with_spy();
        let err = bus.execute(Command::new("missing", "t")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CommandNotFound);
        assert_eq!(err.code(), "COMMAND_NOT_FOUND");
        assert!(err.to_string().contains("missing"));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_executes() {
        let (bus, spy) = bus_with_spy();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let bus = bus.clone();
            tasks.push(tokio::spawn(async move {
                bus.execute(Command::new("upper", "t").with_args([format!("n{i}")]))
                    .await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap().success());
        }
        assert_eq!(spy.calls.load(Ordering::SeqCst), 8);
    }
}
