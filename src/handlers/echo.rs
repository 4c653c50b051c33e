//! ECHO: repeat the arguments back.

use crate::command::{Command, CommandResult};
use crate::error::BusResult;
use crate::handlers::Handler;
use async_trait::async_trait;
use serde_json::json;

pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, command: &Command) -> BusResult<CommandResult> {
        if command.args().is_empty() {
            return Ok(CommandResult::fail("nothing to echo"));
        }
        Ok(CommandResult::ok(json!(command.args().join(" "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo() {
        let cmd = Command::new("echo", "t").with_args(["hello", "world"]);
        let result = EchoHandler.handle(&cmd).await.unwrap();
        assert_eq!(result.data(), Some(&json!("hello world")));
    }

    #[tokio::test]
    async fn test_echo_without_args_fails() {
        let result = EchoHandler.handle(&Command::new("echo", "t")).await.unwrap();
        assert_eq!(result.error(), Some("nothing to echo"));
    }
}
