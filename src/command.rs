//! Command and result value types.
//!
//! A [`Command`] is built once per inbound interaction by a transport adapter
//! and never mutated afterwards. A [`CommandResult`] is the envelope every
//! handler returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport-specific extras attached to a command (caller roles, guild id, ...).
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding the caller's platform roles.
pub const ROLES_KEY: &str = "roles";

/// One inbound chat-command invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    name: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    metadata: Metadata,
}

impl Command {
    /// Create a command with no caller, channel, args, or metadata.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            user_id: None,
            channel_id: None,
            args: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Attach the caller's role list under [`ROLES_KEY`].
    pub fn with_roles<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = roles
            .into_iter()
            .map(|r| Value::String(r.into()))
            .collect();
        self.with_metadata(ROLES_KEY, Value::Array(roles))
    }

    /// Force the transport tag (used by adapters that decode untrusted input).
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Caller roles from metadata. Accepts an array of strings or a single
    /// string; anything else reads as no roles.
    pub fn roles(&self) -> Vec<&str> {
        match self.metadata.get(ROLES_KEY) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(role)) => vec![role.as_str()],
            _ => Vec::new(),
        }
    }
}

/// Outcome returned by handlers: exactly one of `data` or `error`.
///
/// Serialises as `{"success": true, "data": ...}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ResultEnvelope", try_from = "ResultEnvelope")]
pub enum CommandResult {
    Ok { data: Value },
    Fail { error: String },
}

impl CommandResult {
    pub fn ok(data: impl Into<Value>) -> Self {
        Self::Ok { data: data.into() }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self::Fail {
            error: error.into(),
        }
    }

    /// The `success` discriminator.
    pub fn success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Ok { data } => Some(data),
            Self::Fail { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Fail { error } => Some(error),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ResultEnvelope {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<CommandResult> for ResultEnvelope {
    fn from(result: CommandResult) -> Self {
        match result {
            CommandResult::Ok { data } => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            CommandResult::Fail { error } => Self {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<ResultEnvelope> for CommandResult {
    type Error = String;

    fn try_from(envelope: ResultEnvelope) -> Result<Self, Self::Error> {
        match (envelope.success, envelope.data, envelope.error) {
            (true, data, None) => Ok(Self::Ok {
                data: data.unwrap_or(Value::Null),
            }),
            (false, None, Some(error)) => Ok(Self::Fail { error }),
            (true, _, Some(_)) => Err("successful result must not carry an error".to_string()),
            (false, Some(_), _) => Err("failed result must not carry data".to_string()),
            (false, None, None) => Err("failed result is missing its error".to_string()),
        }
    }
}
