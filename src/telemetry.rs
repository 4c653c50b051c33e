//! Telemetry utilities for command timing and span construction.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }

    /// Time since the timer started.
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::observe_command_latency(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::command::Command;
    use tracing::{Span, info_span};

    /// Span for one bus invocation.
    pub fn command(command: &Command, category: &str) -> Span {
        info_span!(
            "command.execute",
            command = %command.name(),
            source = %command.source(),
            user = command.user_id().unwrap_or("-"),
            channel = command.channel_id().unwrap_or("-"),
            category = %category,
        )
    }

    /// Span for one gateway connection.
    pub fn connection(peer: &str) -> Span {
        info_span!("connection", peer = %peer)
    }
}
