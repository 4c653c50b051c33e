//! cmdbus - chat command dispatch bus.
//!
//! Commands arrive from a transport, are resolved in a [`CommandRegistry`],
//! and run through a middleware pipeline (logging, permission, cooldown,
//! audit) into their handler:
//!
//! ```text
//! transport → CommandBus::execute → registry lookup
//!           → Logging → Permission → RateLimit → Audit → Handler
//! ```
//!
//! [`CommandRegistry`]: handlers::CommandRegistry

pub mod app;
pub mod bus;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod network;
pub mod security;
pub mod telemetry;

pub use app::App;
pub use bus::CommandBus;
pub use command::{Command, CommandResult};
pub use error::{BusError, BusResult, ErrorKind};
