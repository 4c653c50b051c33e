//! PING: liveness check.

use crate::command::{Command, CommandResult};
use crate::error::BusResult;
use crate::handlers::Handler;
use async_trait::async_trait;
use serde_json::json;

pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, _command: &Command) -> BusResult<CommandResult> {
        Ok(CommandResult::ok(json!({ "pong": true })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping() {
        let result = PingHandler.handle(&Command::new("ping", "t")).await.unwrap();
        assert_eq!(result, CommandResult::ok(json!({ "pong": true })));
    }
}
