use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HotlineError;

/// Caller-supplied call identifier
///
/// Ids are not unique over time: a later, unrelated call may reuse one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub i64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CallId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for CallId {
    type Err = HotlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(CallId)
            .map_err(|_| HotlineError::invalid_argument(format!("call id must be an integer, got {:?}", s)))
    }
}
