//! Connection - Handles an individual command-socket client.
//!
//! Each line read is one JSON-encoded [`Command`]; each line written is the
//! reply for it, in order:
//!
//! ```text
//! → {"name":"echo","userId":"u1","args":["hi"]}
//! ← {"success":true,"data":"hi"}
//! → {"name":"nope"}
//! ← {"success":false,"error":"command not found: nope","code":"COMMAND_NOT_FOUND"}
//! ```
//!
//! Errors raised by the bus are converted to failure replies here; the
//! connection stays open.

use crate::bus::CommandBus;
use crate::command::{Command, CommandResult};
use crate::error::{BusError, BusResult};
use crate::network::SOCKET_SOURCE;
use crate::telemetry::spans;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{Instrument, debug, warn};

/// Longest accepted request line, in bytes.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Code for replies to lines that are not a valid command.
pub const BAD_REQUEST: &str = "BAD_REQUEST";

/// Failure reply for errors raised instead of returned.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorReply<'a> {
    success: bool,
    error: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_ms: Option<u64>,
}

impl<'a> ErrorReply<'a> {
    fn new(error: String, code: &'a str) -> Self {
        Self {
            success: false,
            error,
            code,
            retry_after_ms: None,
        }
    }
}

impl From<&BusError> for ErrorReply<'static> {
    fn from(err: &BusError) -> Self {
        let mut reply = ErrorReply::new(err.to_string(), err.code());
        if let BusError::RateLimited { retry_after_ms, .. } = err {
            reply.retry_after_ms = Some(*retry_after_ms);
        }
        reply
    }
}

/// Encode the outcome of one command as a reply line (without newline).
pub fn encode_reply(outcome: &BusResult<CommandResult>) -> String {
    let encoded = match outcome {
        Ok(result) => serde_json::to_string(result),
        Err(err) => serde_json::to_string(&ErrorReply::from(err)),
    };
    encoded.unwrap_or_else(|e| bad_request(format!("unencodable reply: {e}")))
}

fn bad_request(error: String) -> String {
    serde_json::to_string(&ErrorReply::new(error, BAD_REQUEST)).unwrap_or_else(|_| {
        format!(r#"{{"success":false,"code":"{BAD_REQUEST}"}}"#)
    })
}

/// A client connection handler.
pub struct Connection {
    addr: SocketAddr,
    stream: TcpStream,
    bus: CommandBus,
}

impl Connection {
    pub fn new(stream: TcpStream, addr: SocketAddr, bus: CommandBus) -> Self {
        Self { addr, stream, bus }
    }

    /// Run the read loop until the client disconnects.
    pub async fn run(self) -> anyhow::Result<()> {
        let Self { addr, stream, bus } = self;
        let span = spans::connection(&addr.to_string());
        serve(stream, bus).instrument(span).await
    }
}

async fn serve(stream: TcpStream, bus: CommandBus) -> anyhow::Result<()> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    while let Some(line) = framed.next().await {
        let reply = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => dispatch(&bus, &line).await,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!("Request line too long");
                bad_request(format!("request exceeds {MAX_LINE_LENGTH} bytes"))
            }
            Err(LinesCodecError::Io(e)) => return Err(e.into()),
        };
        framed.send(reply).await?;
    }

    debug!("Client disconnected");
    Ok(())
}

async fn dispatch(bus: &CommandBus, line: &str) -> String {
    let command = match serde_json::from_str::<Command>(line) {
        Ok(command) => command.with_source(SOCKET_SOURCE),
        Err(e) => {
            debug!(error = %e, "Malformed request");
            return bad_request(format!("invalid command: {e}"));
        }
    };

    encode_reply(&bus.execute(command).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_encode_ok_and_fail() {
        let ok = encode_reply(&Ok(CommandResult::ok(json!({"pong": true}))));
        assert_eq!(parse(&ok), json!({"success": true, "data": {"pong": true}}));

        let fail = encode_reply(&Ok(CommandResult::fail("nothing to echo")));
        assert_eq!(parse(&fail), json!({"success": false, "error": "nothing to echo"}));
    }

    #[test]
    fn test_encode_errors() {
        let reply = parse(&encode_reply(&Err(BusError::CommandNotFound("x".into()))));
        assert_eq!(reply["success"], false);
        assert_eq!(reply["code"], "COMMAND_NOT_FOUND");
        assert_eq!(reply["error"], "command not found: x");
        assert!(reply.get("retryAfterMs").is_none());

        let reply = parse(&encode_reply(&Err(BusError::RateLimited {
            command: "echo".into(),
            retry_after_ms: 1200,
        })));
        assert_eq!(reply["code"], "RATE_LIMITED");
        assert_eq!(reply["retryAfterMs"], 1200);
    }

    #[test]
    fn test_bad_request() {
        let reply = parse(&bad_request("invalid command: eof".into()));
        assert_eq!(reply["code"], BAD_REQUEST);
        assert_eq!(reply["success"], false);
    }
}
