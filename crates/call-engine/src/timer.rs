//! Ring timers.
//!
//! Every transition into `Ringing` arms one timer for the operator, tagged with
//! the [`RingToken`] of that ringing episode. Leaving `Ringing` cancels it. An
//! expiry that still slips through (already queued when the cancel happened)
//! is discarded by the engine because its token no longer matches.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::operator::OperatorId;

/// Tag of one ringing episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RingToken(u64);

impl RingToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints strictly increasing ring tokens
#[derive(Debug, Default)]
pub struct RingTokenMint {
    last: u64,
}

impl RingTokenMint {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    pub fn mint(&mut self) -> RingToken {
        self.last += 1;
        RingToken(self.last)
    }
}

/// A fired ring timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingExpiry {
    pub operator: OperatorId,
    pub token: RingToken,
}

/// Arms and cancels one deferred expiry per ringing operator
pub trait RingScheduler: Send {
    /// Arm a timer for `operator`, replacing any timer already pending for it
    fn arm(&mut self, operator: &OperatorId, token: RingToken, delay: Duration);

    /// Cancel the pending timer for `operator`, if any
    fn cancel(&mut self, operator: &OperatorId);
}

/// Scheduler backed by tokio sleep tasks
///
/// Expiries are delivered into the channel handed to [`TokioRingScheduler::new`].
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioRingScheduler {
    expiry_tx: mpsc::UnboundedSender<RingExpiry>,
    timers: HashMap<OperatorId, JoinHandle<()>>,
}

impl TokioRingScheduler {
    pub fn new(expiry_tx: mpsc::UnboundedSender<RingExpiry>) -> Self {
        Self {
            expiry_tx,
            timers: HashMap::new(),
        }
    }

    /// Number of timers not yet cancelled or fired
    pub fn pending(&self) -> usize {
        self.timers.values().filter(|handle| !handle.is_finished()).count()
    }
}

impl RingScheduler for TokioRingScheduler {
    fn arm(&mut self, operator: &OperatorId, token: RingToken, delay: Duration) {
        self.cancel(operator);

        let tx = self.expiry_tx.clone();
        let expiry = RingExpiry {
            operator: operator.clone(),
            token,
        };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!("⏰ Ring timer fired for operator {} ({})", expiry.operator, expiry.token);
            // The receiver is gone once the engine has shut down
            let _ = tx.send(expiry);
        });

        debug!("⏱️ Armed ring timer for operator {} ({}) in {:?}", operator, token, delay);
        self.timers.insert(operator.clone(), handle);
    }

    fn cancel(&mut self, operator: &OperatorId) {
        if let Some(handle) = self.timers.remove(operator) {
            handle.abort();
            debug!("⏱️ Cancelled ring timer for operator {}", operator);
        }
    }
}

impl Drop for TokioRingScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

/// Armed timer recorded by [`ManualRingScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub token: RingToken,
    pub delay: Duration,
}

/// Scheduler that only records timers; the caller decides when they fire
#[derive(Debug, Default)]
pub struct ManualRingScheduler {
    armed: HashMap<OperatorId, ArmedTimer>,
    cancellations: usize,
}

impl ManualRingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timer currently armed for `operator`
    pub fn armed(&self, operator: &OperatorId) -> Option<ArmedTimer> {
        self.armed.get(operator).copied()
    }

    pub fn is_armed(&self, operator: &OperatorId) -> bool {
        self.armed.contains_key(operator)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// How many armed timers have been cancelled so far
    pub fn cancellations(&self) -> usize {
        self.cancellations
    }

    /// Fire the timer for `operator`, as the runtime would once its delay elapsed
    pub fn fire(&mut self, operator: &OperatorId) -> Option<RingExpiry> {
        self.armed.remove(operator).map(|timer| RingExpiry {
            operator: operator.clone(),
            token: timer.token,
        })
    }
}

impl RingScheduler for ManualRingScheduler {
    fn arm(&mut self, operator: &OperatorId, token: RingToken, delay: Duration) {
        self.armed.insert(operator.clone(), ArmedTimer { token, delay });
    }

    fn cancel(&mut self, operator: &OperatorId) {
        if self.armed.remove(operator).is_some() {
            self.cancellations += 1;
        }
    }
}
