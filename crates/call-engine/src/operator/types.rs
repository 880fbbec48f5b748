use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HotlineError;

/// Operator identifier, one upper-case letter per operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(pub String);

impl OperatorId {
    /// Normalize user input into an operator id (trimmed, upper-cased)
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperatorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Operator status
///
/// `Ringing` and `Busy` always come with an assignment entry for the operator;
/// `Available` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorStatus {
    /// Free to receive a call
    Available,

    /// A call has been offered and awaits answer or reject
    Ringing,

    /// A call has been answered and is in progress
    Busy,
}

impl OperatorStatus {
    pub fn is_available(self) -> bool {
        matches!(self, OperatorStatus::Available)
    }

    /// Whether the operator currently holds a call
    pub fn holds_call(self) -> bool {
        matches!(self, OperatorStatus::Ringing | OperatorStatus::Busy)
    }
}

impl fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorStatus::Available => f.write_str("available"),
            OperatorStatus::Ringing => f.write_str("ringing"),
            OperatorStatus::Busy => f.write_str("busy"),
        }
    }
}

impl FromStr for OperatorStatus {
    type Err = HotlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "available" | "Available" | "AVAILABLE" => Ok(OperatorStatus::Available),
            "ringing" | "Ringing" | "RINGING" => Ok(OperatorStatus::Ringing),
            "busy" | "Busy" | "BUSY" => Ok(OperatorStatus::Busy),
            other => Err(HotlineError::invalid_argument(format!(
                "unknown operator status: {}",
                other
            ))),
        }
    }
}

/// Call operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub id: OperatorId,
    pub status: OperatorStatus,
}

impl Operator {
    pub fn new(id: OperatorId) -> Self {
        Self {
            id,
            status: OperatorStatus::Available,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operator #{}: {}", self.id, self.status)
    }
}
