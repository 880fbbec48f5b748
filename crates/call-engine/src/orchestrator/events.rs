use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::command::Command;
use crate::error::Result;
use crate::routing::EngineSnapshot;

/// Unsolicited message produced by a ring timeout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            emitted_at: Utc::now(),
        }
    }
}

/// Requests served by the engine task
#[derive(Debug)]
pub(crate) enum EngineRequest {
    Execute {
        command: Command,
        reply: oneshot::Sender<Result<String>>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
}
