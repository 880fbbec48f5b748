//! Commands and their wire frames.
//!
//! A request frame is `{"command": <verb>, "id": <id>}` and a response or
//! notification frame is `{"message": <text>}`, one JSON object per line.
//! Ids arrive either as JSON numbers or as the text the user typed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::call::CallId;
use crate::error::{HotlineError, Result};
use crate::operator::OperatorId;

/// A decoded engine command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A new call arrives
    Call(CallId),
    /// The operator picks up its ringing call
    Answer(OperatorId),
    /// The operator declines its ringing call
    Reject(OperatorId),
    /// The caller hangs up
    Hangup(CallId),
    /// Render the current state
    State,
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Call(_) => "call",
            Command::Answer(_) => "answer",
            Command::Reject(_) => "reject",
            Command::Hangup(_) => "hangup",
            Command::State => "state",
        }
    }

    /// Build a command from a verb and its textual identifier
    ///
    /// The verb is checked before the identifier, so an unknown verb always
    /// reports `UnknownCommand`.
    pub fn from_parts(verb: &str, id: Option<&str>) -> Result<Self> {
        let verb = verb.trim().to_lowercase();
        let id = id.map(str::trim).filter(|id| !id.is_empty());

        match verb.as_str() {
            "call" => Ok(Command::Call(require_id(&verb, id)?.parse()?)),
            "hangup" => Ok(Command::Hangup(require_id(&verb, id)?.parse()?)),
            "answer" => Ok(Command::Answer(OperatorId::new(require_id(&verb, id)?))),
            "reject" => Ok(Command::Reject(OperatorId::new(require_id(&verb, id)?))),
            "state" => Ok(Command::State),
            _ => Err(HotlineError::unknown_command(verb)),
        }
    }

    /// Parse a typed line such as `call 1` or `answer a`
    pub fn parse_line(line: &str) -> Result<Self> {
        let (verb, id) = split_line(line)?;
        Self::from_parts(verb, id)
    }

    pub fn to_request(&self) -> Request {
        let id = match self {
            Command::Call(call) | Command::Hangup(call) => Value::from(call.0),
            Command::Answer(operator) | Command::Reject(operator) => Value::from(operator.as_str()),
            Command::State => Value::Null,
        };
        Request::new(self.verb(), id)
    }
}

impl TryFrom<&Request> for Command {
    type Error = HotlineError;

    fn try_from(request: &Request) -> Result<Self> {
        let id = request.id_text()?;
        Command::from_parts(&request.command, id.as_deref())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Call(call) | Command::Hangup(call) => write!(f, "{} {}", self.verb(), call),
            Command::Answer(operator) | Command::Reject(operator) => {
                write!(f, "{} {}", self.verb(), operator)
            }
            Command::State => f.write_str(self.verb()),
        }
    }
}

fn require_id<'a>(verb: &str, id: Option<&'a str>) -> Result<&'a str> {
    id.ok_or_else(|| HotlineError::invalid_argument(format!("{} requires an id", verb)))
}

fn split_line(line: &str) -> Result<(&str, Option<&str>)> {
    let line = line.trim();
    if line.is_empty() {
        return Err(HotlineError::invalid_argument("empty command"));
    }
    Ok(match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, Some(rest.trim())),
        None => (line, None),
    })
}

/// Request frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub id: Value,
}

impl Request {
    pub fn new(command: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            command: command.into(),
            id: id.into(),
        }
    }

    /// Frame a typed line verbatim, keeping the id as the typed text
    pub fn parse_line(line: &str) -> Result<Self> {
        let (verb, id) = split_line(line)?;
        Ok(Self::new(
            verb.to_lowercase(),
            id.map_or(Value::Null, Value::from),
        ))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text.trim())?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON followed by the frame delimiter
    pub fn to_line(&self) -> Result<String> {
        let mut line = self.to_json()?;
        line.push('\n');
        Ok(line)
    }

    /// The id as text, `None` when absent
    fn id_text(&self) -> Result<Option<String>> {
        match &self.id {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text.clone())),
            Value::Number(number) => Ok(Some(number.to_string())),
            other => Err(HotlineError::invalid_argument(format!(
                "id must be a number or a string, got {}",
                other
            ))),
        }
    }
}

/// Response and notification frame
///
/// Responses serialize as `{"message": ...}`. Unsolicited ring timeout
/// notifications add `"notification": true` so a client can tell them apart
/// from the answer to its own request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub message: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub notification: bool,
}

impl Response {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            notification: false,
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            notification: true,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text.trim())?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON followed by the frame delimiter
    pub fn to_line(&self) -> Result<String> {
        let mut line = self.to_json()?;
        line.push('\n');
        Ok(line)
    }
}
