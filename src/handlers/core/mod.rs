//! Core dispatch infrastructure.
//!
//! This module contains the fundamental types the command bus is built from:
//!
//! - [`CommandRegistry`]: name → handler + metadata
//! - [`MiddlewarePipeline`]: ordered chain-of-responsibility executor
//! - [`PipelineContext`]: per-invocation state shared by every stage
//!
//! ### Traits
//!
//! - [`Handler`]: business logic for one command
//! - [`Middleware`]: a stage wrapping the rest of the chain
//! - [`Terminal`]: the innermost step of a pipeline run

pub mod context;
pub mod middleware;
pub mod registry;
pub mod traits;

pub use context::{DEFAULT_CATEGORY, PipelineContext};
pub use middleware::{MiddlewarePipeline, Next};
pub use registry::{
    CommandInfo, CommandMeta, CommandRegistry, DEFAULT_GROUP, OptionSpec, PermissionRequirement,
    RegisterOptions,
};
pub use traits::{Handler, Middleware, Terminal};
