//! Middleware pipeline: an ordered chain-of-responsibility executor.
//!
//! The pipeline knows nothing about commands. It runs its stages in order
//! around a [`Terminal`], each stage receiving a [`Next`] continuation.
//!
//! # Ordering
//!
//! ```text
//!  execute ─► m[0] ─► m[1] ─► ... ─► m[n-1] ─► terminal
//!  result  ◄─ m[0] ◄─ m[1] ◄─ ... ◄─ m[n-1] ◄──┘
//! ```
//!
//! A shared cursor records the highest stage index entered so far. Entering
//! an index at or below it means a stage invoked its continuation twice (or
//! re-invoked it after it already returned), which fails the run with
//! [`BusError::PipelineMisuse`] without re-entering downstream stages.

use super::context::PipelineContext;
use super::traits::{Middleware, Terminal};
use crate::command::CommandResult;
use crate::error::{BusError, BusResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Ordered list of middleware composed once at startup.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    stages: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    pub fn new(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self { stages }
    }

    /// Append a stage (builder style).
    pub fn with(mut self, stage: impl Middleware + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn push(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage around `terminal`.
    ///
    /// Errors raised by any stage or by the terminal propagate unchanged.
    pub async fn execute(
        &self,
        ctx: &mut PipelineContext,
        terminal: &dyn Terminal,
    ) -> BusResult<CommandResult> {
        let chain = Chain {
            stages: &self.stages,
            terminal,
            entered: AtomicUsize::new(0),
        };
        chain.dispatch(0, ctx).await
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("stages", &self.names())
            .finish()
    }
}

/// State of one pipeline run.
struct Chain<'a> {
    stages: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Terminal,
    /// Highest stage index entered, plus one (0 = nothing entered yet).
    entered: AtomicUsize,
}

impl Chain<'_> {
    fn dispatch<'s>(
        &'s self,
        index: usize,
        ctx: &'s mut PipelineContext,
    ) -> BoxFuture<'s, BusResult<CommandResult>> {
        Box::pin(async move {
            let previous = self.entered.fetch_max(index + 1, Ordering::SeqCst);
            if previous > index {
                return Err(BusError::PipelineMisuse);
            }

            match self.stages.get(index) {
                Some(stage) => {
                    let next = Next {
                        chain: self,
                        index: index + 1,
                    };
                    stage.handle(ctx, next).await
                }
                None => self.terminal.call(ctx).await,
            }
        })
    }
}

/// Continuation handed to a middleware: runs the rest of the chain.
pub struct Next<'a> {
    chain: &'a Chain<'a>,
    index: usize,
}

impl Next<'_> {
    /// Run the downstream stages and the terminal.
    ///
    /// Valid once per stage; a second call returns
    /// [`BusError::PipelineMisuse`].
    pub async fn run(&self, ctx: &mut PipelineContext) -> BusResult<CommandResult> {
        self.chain.dispatch(self.index, ctx).await
    }
}
