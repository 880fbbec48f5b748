use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::call::CallId;
use crate::operator::{OperatorId, OperatorStatus};
use crate::timer::RingToken;

/// Running counters kept by the routing engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoutingStats {
    pub calls_received: u64,
    pub calls_answered: u64,
    pub calls_rejected: u64,
    /// Ring timeouts that released a call
    pub calls_ignored: u64,
    /// Hung up while waiting or ringing
    pub calls_missed: u64,
    /// Hung up after being answered
    pub calls_finished: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorView {
    pub id: OperatorId,
    pub status: OperatorStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentView {
    pub operator: OperatorId,
    pub status: OperatorStatus,
    pub call: CallId,
    pub token: RingToken,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingView {
    pub call: CallId,
    pub queued_at: DateTime<Utc>,
}

/// Point-in-time copy of the engine state, rendered by the `state` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    /// Operators in registry order
    pub operators: Vec<OperatorView>,
    /// Ongoing calls in registry order of the holding operator
    pub ongoing: Vec<AssignmentView>,
    /// Waiting calls, head first
    pub waiting: Vec<WaitingView>,
    pub stats: RoutingStats,
    pub taken_at: DateTime<Utc>,
}

impl EngineSnapshot {
    /// Call held by `operator`, if any
    pub fn call_for(&self, operator: &OperatorId) -> Option<CallId> {
        self.ongoing
            .iter()
            .find(|assignment| &assignment.operator == operator)
            .map(|assignment| assignment.call)
    }

    pub fn status_of(&self, operator: &OperatorId) -> Option<OperatorStatus> {
        self.operators
            .iter()
            .find(|view| &view.id == operator)
            .map(|view| view.status)
    }

    pub fn waiting_ids(&self) -> Vec<CallId> {
        self.waiting.iter().map(|view| view.call).collect()
    }
}

impl fmt::Display for EngineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OPERATORS:")?;
        for operator in &self.operators {
            writeln!(f, "    Operator #{}: {}", operator.id, operator.status)?;
        }

        writeln!(f)?;
        writeln!(f, "ONGOING CALLS:")?;
        for assignment in &self.ongoing {
            writeln!(
                f,
                "    Operator #{}: {}, Call #{}",
                assignment.operator, assignment.status, assignment.call
            )?;
        }

        writeln!(f)?;
        writeln!(f, "WAITING QUEUE:")?;
        for waiting in &self.waiting {
            writeln!(f, "    Call #{}", waiting.call)?;
        }

        writeln!(f)?;
        write!(
            f,
            "STATS: received={} answered={} rejected={} ignored={} missed={} finished={}",
            self.stats.calls_received,
            self.stats.calls_answered,
            self.stats.calls_rejected,
            self.stats.calls_ignored,
            self.stats.calls_missed,
            self.stats.calls_finished
        )
    }
}
