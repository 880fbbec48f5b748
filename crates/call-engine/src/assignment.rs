use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::call::CallId;
use crate::operator::OperatorId;
use crate::timer::RingToken;

/// The call an operator is ringing for or talking on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub call: CallId,
    /// Token of the ringing episode that created this assignment
    pub token: RingToken,
    pub assigned_at: DateTime<Utc>,
}

/// Operator to call mapping for every `Ringing` or `Busy` operator
#[derive(Debug, Default)]
pub struct AssignmentTable {
    entries: HashMap<OperatorId, Assignment>,
}

impl AssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new assignment, returning the one it replaced
    pub fn assign(&mut self, operator: OperatorId, call: CallId, token: RingToken) -> Option<Assignment> {
        self.entries.insert(
            operator,
            Assignment {
                call,
                token,
                assigned_at: Utc::now(),
            },
        )
    }

    pub fn get(&self, operator: &OperatorId) -> Option<&Assignment> {
        self.entries.get(operator)
    }

    pub fn remove(&mut self, operator: &OperatorId) -> Option<Assignment> {
        self.entries.remove(operator)
    }

    /// Whether any operator currently holds `call`
    pub fn holds(&self, call: CallId) -> bool {
        self.entries.values().any(|assignment| assignment.call == call)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
