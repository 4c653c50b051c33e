//! Capability traits at the seams of the dispatch core.
//!
//! - [`Handler`]: business logic bound to a command name.
//! - [`Middleware`]: a pipeline stage wrapping the rest of the chain.
//! - [`Terminal`]: the innermost step the pipeline runs once every stage has
//!   called through.

use super::context::PipelineContext;
use super::middleware::Next;
use crate::command::{Command, CommandResult};
use crate::error::BusResult;
use async_trait::async_trait;

/// Business handler for one command.
///
/// Returning `Ok(CommandResult::Fail { .. })` reports a business failure
/// ("quote not found"). Returning `Err` is a thrown failure that skips audit
/// and propagates to the caller unchanged.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, command: &Command) -> BusResult<CommandResult>;
}

/// A stage in the middleware chain.
///
/// Call `next.run(ctx)` to continue down the chain; anything after that call
/// runs on the way back out. Returning without calling `next` short-circuits
/// every downstream stage and the terminal.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Stage name, for logs and introspection.
    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &mut PipelineContext, next: Next<'_>)
    -> BusResult<CommandResult>;
}

/// Innermost step of a pipeline run.
#[async_trait]
pub trait Terminal: Send + Sync {
    async fn call(&self, ctx: &mut PipelineContext) -> BusResult<CommandResult>;
}

/// Plain functions work as terminals.
#[async_trait]
impl<F> Terminal for F
where
    F: Fn(&mut PipelineContext) -> BusResult<CommandResult> + Send + Sync,
{
    async fn call(&self, ctx: &mut PipelineContext) -> BusResult<CommandResult> {
        self(ctx)
    }
}
