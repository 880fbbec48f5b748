use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::assignment::{Assignment, AssignmentTable};
use crate::call::CallId;
use crate::command::Command;
use crate::config::HotlineConfig;
use crate::error::{HotlineError, Result};
use crate::operator::{OperatorId, OperatorRegistry, OperatorStatus};
use crate::queue::WaitingQueue;
use crate::timer::{RingExpiry, RingScheduler, RingToken, RingTokenMint};

use super::snapshot::{AssignmentView, EngineSnapshot, OperatorView, RoutingStats, WaitingView};

/// Call routing state machine
///
/// Sole writer of the operator registry, assignment table and waiting queue.
/// Every public operation runs to completion and either succeeds or leaves
/// the state untouched.
pub struct RoutingEngine<S> {
    operators: OperatorRegistry,
    assignments: AssignmentTable,
    queue: WaitingQueue,
    /// Copies of each call id that are ringing, busy or waiting
    live_calls: HashMap<CallId, usize>,
    scheduler: S,
    tokens: RingTokenMint,
    /// `None` disables ring timers
    ring_timeout: Option<Duration>,
    stats: RoutingStats,
}

impl<S: RingScheduler> RoutingEngine<S> {
    /// Create an engine with `operator_count` available operators
    pub fn new(operator_count: usize, ring_timeout: Option<Duration>, scheduler: S) -> Result<Self> {
        if ring_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(HotlineError::config("ring timeout must be greater than zero"));
        }

        let operators = OperatorRegistry::with_count(operator_count)?;
        info!(
            "🚀 Routing engine ready with {} operators (ring timeout: {:?})",
            operators.len(),
            ring_timeout
        );

        Ok(Self {
            operators,
            assignments: AssignmentTable::new(),
            queue: WaitingQueue::new(),
            live_calls: HashMap::new(),
            scheduler,
            tokens: RingTokenMint::new(),
            ring_timeout,
            stats: RoutingStats::default(),
        })
    }

    pub fn from_config(config: &HotlineConfig, scheduler: S) -> Result<Self> {
        config.validate()?;
        Self::new(config.operators.count, config.routing.ring_timeout(), scheduler)
    }

    /// Dispatch a decoded command
    pub fn execute(&mut self, command: &Command) -> Result<String> {
        match command {
            Command::Call(call) => Ok(self.receive_call(*call)),
            Command::Answer(operator) => self.answer(operator),
            Command::Reject(operator) => self.reject(operator),
            Command::Hangup(call) => self.hangup(*call),
            Command::State => Ok(self.snapshot().to_string()),
        }
    }

    /// A new call arrives. Duplicate ids are accepted as distinct calls.
    pub fn receive_call(&mut self, call: CallId) -> String {
        info!("📞 Call {} received", call);
        self.stats.calls_received += 1;
        *self.live_calls.entry(call).or_default() += 1;

        let mut message = format!("Call {} received", call);
        message.push_str(&self.forward_call(call, None));
        message
    }

    /// The operator picks up its ringing call
    pub fn answer(&mut self, operator: &OperatorId) -> Result<String> {
        let call = self.ringing_call(operator)?;

        self.operators.set_status(operator, OperatorStatus::Busy)?;
        self.scheduler.cancel(operator);
        self.stats.calls_answered += 1;

        info!("✅ Call {} answered by operator {}", call, operator);
        Ok(format!("Call {} answered by operator {}", call, operator))
    }

    /// The operator declines its ringing call, which is forwarded elsewhere
    pub fn reject(&mut self, operator: &OperatorId) -> Result<String> {
        let call = self.ringing_call(operator)?;

        self.release(operator)?;
        self.stats.calls_rejected += 1;
        info!("❌ Call {} rejected by operator {}", call, operator);

        let mut message = format!("Call {} rejected by operator {}", call, operator);
        message.push_str(&self.forward_call(call, Some(operator)));
        message.push_str(&self.step_waiting_queue());
        Ok(message)
    }

    /// The caller hangs up, whether waiting, ringing or talking
    pub fn hangup(&mut self, call: CallId) -> Result<String> {
        let mut message = if self.queue.remove(call).is_some() {
            self.stats.calls_missed += 1;
            info!("📴 Call {} missed while waiting in queue", call);
            format!("Call {} missed", call)
        } else {
            let operator = self
                .holder_of(call)
                .ok_or_else(|| HotlineError::not_found(format!("call {}", call)))?;
            let status = self.operators.status(&operator)?;
            self.release(&operator)?;

            if status == OperatorStatus::Busy {
                self.stats.calls_finished += 1;
                info!("📴 Call {} finished, operator {} is available", call, operator);
                format!("Call {} finished and operator {} is available", call, operator)
            } else {
                self.stats.calls_missed += 1;
                info!("📴 Call {} missed while ringing operator {}", call, operator);
                format!("Call {} missed", call)
            }
        };

        self.retire(call);
        message.push_str(&self.step_waiting_queue());
        Ok(message)
    }

    /// Ring timer expiry for `operator`
    ///
    /// Returns the notification text, or `None` when the token is stale or
    /// the operator is no longer ringing.
    pub fn timeout_ring(&mut self, operator: &OperatorId, token: RingToken) -> Option<String> {
        let (call, current) = match self.assignments.get(operator) {
            Some(assignment) => (assignment.call, assignment.token),
            None => {
                debug!("⏰ Ignoring ring timeout {} for idle operator {}", token, operator);
                return None;
            }
        };

        if current != token {
            debug!(
                "⏰ Ignoring stale ring timeout {} for operator {} (current {})",
                token, operator, current
            );
            return None;
        }

        match self.operators.status(operator) {
            Ok(OperatorStatus::Ringing) => {}
            Ok(status) => {
                debug!("⏰ Ignoring ring timeout for operator {} in status {}", operator, status);
                return None;
            }
            Err(e) => {
                warn!("⏰ Ring timeout for unknown operator {}: {}", operator, e);
                return None;
            }
        }

        if let Err(e) = self.release(operator) {
            warn!("⏰ Failed to release operator {} after ring timeout: {}", operator, e);
            return None;
        }
        self.stats.calls_ignored += 1;
        info!("⏰ Call {} ignored by operator {}", call, operator);

        let mut message = format!("Call {} ignored by operator {}", call, operator);
        message.push_str(&self.forward_call(call, Some(operator)));
        message.push_str(&self.step_waiting_queue());
        Some(message)
    }

    pub fn handle_expiry(&mut self, expiry: &RingExpiry) -> Option<String> {
        self.timeout_ring(&expiry.operator, expiry.token)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> EngineSnapshot {
        let operators = self
            .operators
            .iter()
            .map(|operator| OperatorView {
                id: operator.id.clone(),
                status: operator.status,
            })
            .collect();

        let ongoing = self
            .operators
            .iter()
            .filter_map(|operator| {
                self.assignments.get(&operator.id).map(|assignment| AssignmentView {
                    operator: operator.id.clone(),
                    status: operator.status,
                    call: assignment.call,
                    token: assignment.token,
                    assigned_at: assignment.assigned_at,
                })
            })
            .collect();

        let waiting = self
            .queue
            .iter()
            .map(|waiting| WaitingView {
                call: waiting.call,
                queued_at: waiting.queued_at,
            })
            .collect();

        EngineSnapshot {
            operators,
            ongoing,
            waiting,
            stats: self.stats,
            taken_at: Utc::now(),
        }
    }

    /// Check that every ringing or busy operator has an assignment and no
    /// available operator does, and that every live call is either assigned
    /// or waiting, never both
    ///
    /// Call ids may repeat, so placements are counted per id against the
    /// number of live copies.
    pub fn verify_invariants(&self) -> Result<()> {
        for operator in self.operators.iter() {
            let assigned = self.assignments.get(&operator.id).is_some();
            if operator.status.holds_call() != assigned {
                return Err(HotlineError::invalid_transition(format!(
                    "operator {} is {} but {} an assignment",
                    operator.id,
                    operator.status,
                    if assigned { "has" } else { "lacks" }
                )));
            }
        }

        if self.assignments.len() > self.operators.len() {
            return Err(HotlineError::invalid_transition(
                "assignment table holds entries for unknown operators",
            ));
        }

        let mut placed: HashMap<CallId, usize> = HashMap::new();
        for operator in self.operators.iter() {
            if let Some(assignment) = self.assignments.get(&operator.id) {
                *placed.entry(assignment.call).or_default() += 1;
            }
        }
        for waiting in self.queue.iter() {
            *placed.entry(waiting.call).or_default() += 1;
        }

        if let Some((call, live)) = self
            .live_calls
            .iter()
            .find(|(call, live)| placed.get(*call) != Some(*live))
        {
            return Err(HotlineError::invalid_transition(format!(
                "call {} has {} live copies but is placed {} times",
                call,
                live,
                placed.get(call).copied().unwrap_or(0)
            )));
        }
        if let Some(call) = placed.keys().find(|call| !self.live_calls.contains_key(*call)) {
            return Err(HotlineError::invalid_transition(format!(
                "call {} is placed but was never received or already ended",
                call
            )));
        }

        Ok(())
    }

    /// Current ring token of `operator`, if it holds a call
    pub fn ring_token(&self, operator: &OperatorId) -> Option<RingToken> {
        self.assignments.get(operator).map(|assignment| assignment.token)
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn assignments(&self) -> &AssignmentTable {
        &self.assignments
    }

    pub fn queue(&self) -> &WaitingQueue {
        &self.queue
    }

    pub fn stats(&self) -> RoutingStats {
        self.stats
    }

    pub fn ring_timeout(&self) -> Option<Duration> {
        self.ring_timeout
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Call held by a ringing operator
    fn ringing_call(&self, operator: &OperatorId) -> Result<CallId> {
        let status = self.operators.status(operator)?;
        if status != OperatorStatus::Ringing {
            return Err(HotlineError::invalid_transition(format!(
                "operator {} is {}, not ringing",
                operator, status
            )));
        }

        self.assignments
            .get(operator)
            .map(|assignment| assignment.call)
            .ok_or_else(|| {
                HotlineError::invalid_transition(format!("operator {} has no ringing call", operator))
            })
    }

    /// First operator in registry order holding `call`
    fn holder_of(&self, call: CallId) -> Option<OperatorId> {
        self.operators
            .iter()
            .find(|operator| {
                self.assignments
                    .get(&operator.id)
                    .is_some_and(|assignment| assignment.call == call)
            })
            .map(|operator| operator.id.clone())
    }

    /// Return the operator to `Available`, dropping its assignment and timer
    fn release(&mut self, operator: &OperatorId) -> Result<Option<Assignment>> {
        self.operators.set_status(operator, OperatorStatus::Available)?;
        self.scheduler.cancel(operator);
        Ok(self.assignments.remove(operator))
    }

    /// Forget one live copy of `call` once it has ended
    fn retire(&mut self, call: CallId) {
        if let Some(live) = self.live_calls.get_mut(&call) {
            *live -= 1;
            if *live == 0 {
                self.live_calls.remove(&call);
            }
        }
    }

    /// Ring the first available operator other than `skip`, or queue the call
    fn forward_call(&mut self, call: CallId, skip: Option<&OperatorId>) -> String {
        match self.operators.claim_first_available(skip) {
            Some(operator) => self.ring(operator, call),
            None => {
                self.queue.push_back(call);
                format!("\nCall {} waiting in queue", call)
            }
        }
    }

    /// Offer the head of the queue to the first available operator
    fn step_waiting_queue(&mut self) -> String {
        if self.queue.is_empty() || self.operators.first_available(None).is_none() {
            return String::new();
        }

        let Some(waiting) = self.queue.pop_front() else {
            return String::new();
        };
        match self.operators.claim_first_available(None) {
            Some(operator) => self.ring(operator, waiting.call),
            None => String::new(),
        }
    }

    /// Record the assignment of an operator already marked ringing
    fn ring(&mut self, operator: OperatorId, call: CallId) -> String {
        let token = self.tokens.mint();
        if let Some(timeout) = self.ring_timeout {
            self.scheduler.arm(&operator, token, timeout);
        }

        info!("🔔 Call {} ringing for operator {} ({})", call, operator, token);
        let message = format!("\nCall {} ringing for operator {}", call, operator);
        self.assignments.assign(operator, call, token);
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualRingScheduler;
    use pretty_assertions::assert_eq;

    fn engine(count: usize) -> RoutingEngine<ManualRingScheduler> {
        RoutingEngine::new(count, Some(Duration::from_secs(10)), ManualRingScheduler::new()).unwrap()
    }

    fn op(id: &str) -> OperatorId {
        OperatorId::new(id)
    }

    #[test]
    fn test_new_rejects_bad_settings() {
        assert!(matches!(
            RoutingEngine::new(27, None, ManualRingScheduler::new()),
            Err(HotlineError::Configuration(_))
        ));
        assert!(matches!(
            RoutingEngine::new(2, Some(Duration::ZERO), ManualRingScheduler::new()),
            Err(HotlineError::Configuration(_))
        ));
    }

    #[test]
    fn test_invariants_count_duplicate_ids_per_copy() {
        let mut engine = engine(1);
        engine.receive_call(CallId(4));
        engine.receive_call(CallId(4));

        // One copy rings, the other waits: both are live, neither is misplaced
        assert_eq!(engine.queue().len(), 1);
        engine.verify_invariants().unwrap();

        engine.hangup(CallId(4)).unwrap();
        engine.verify_invariants().unwrap();
        engine.hangup(CallId(4)).unwrap();
        engine.verify_invariants().unwrap();
        assert!(engine.live_calls.is_empty());
    }

    #[test]
    fn test_invariants_catch_a_call_both_assigned_and_waiting() {
        let mut engine = engine(2);
        engine.receive_call(CallId(1));
        engine.queue.push_back(CallId(1));

        let err = engine.verify_invariants().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid transition: call 1 has 1 live copies but is placed 2 times"
        );
    }

    #[test]
    fn test_invariants_catch_a_call_that_already_ended() {
        let mut engine = engine(1);
        engine.receive_call(CallId(2));
        engine.hangup(CallId(2)).unwrap();
        engine.queue.push_back(CallId(2));

        assert!(engine.verify_invariants().is_err());
    }

    #[test]
    fn test_ringing_arms_timer_with_current_token() {
        let mut engine = engine(1);
        engine.receive_call(CallId(1));

        let token = engine.ring_token(&op("A")).unwrap();
        let armed = engine.scheduler().armed(&op("A")).unwrap();
        assert_eq!(armed.token, token);
        assert_eq!(armed.delay, Duration::from_secs(10));
    }

    #[test]
    fn test_answer_cancels_timer() {
        let mut engine = engine(1);
        engine.receive_call(CallId(1));

        assert_eq!(engine.answer(&op("a")).unwrap(), "Call 1 answered by operator A");
        assert!(!engine.scheduler().is_armed(&op("A")));
        assert_eq!(engine.operators().status(&op("A")).unwrap(), OperatorStatus::Busy);
    }

    #[test]
    fn test_answer_and_reject_require_ringing() {
        let mut engine = engine(2);
        assert!(matches!(engine.answer(&op("A")), Err(HotlineError::InvalidTransition(_))));
        assert!(matches!(engine.reject(&op("A")), Err(HotlineError::InvalidTransition(_))));
        assert!(matches!(engine.answer(&op("Q")), Err(HotlineError::NotFound(_))));

        engine.receive_call(CallId(1));
        engine.answer(&op("A")).unwrap();
        assert!(matches!(engine.answer(&op("A")), Err(HotlineError::InvalidTransition(_))));
        assert!(matches!(engine.reject(&op("A")), Err(HotlineError::InvalidTransition(_))));
        assert_eq!(engine.stats().calls_answered, 1);
    }

    #[test]
    fn test_reject_with_single_operator_requeues_then_rerings() {
        let mut engine = engine(1);
        engine.receive_call(CallId(1));

        let message = engine.reject(&op("A")).unwrap();
        assert_eq!(
            message,
            "Call 1 rejected by operator A\nCall 1 waiting in queue\nCall 1 ringing for operator A"
        );
        assert!(engine.queue().is_empty());
        assert_eq!(engine.operators().status(&op("A")).unwrap(), OperatorStatus::Ringing);
        engine.verify_invariants().unwrap();
    }

    #[test]
    fn test_hangup_while_ringing_is_missed() {
        let mut engine = engine(1);
        engine.receive_call(CallId(4));

        assert_eq!(engine.hangup(CallId(4)).unwrap(), "Call 4 missed");
        assert_eq!(engine.operators().status(&op("A")).unwrap(), OperatorStatus::Available);
        assert_eq!(engine.scheduler().cancellations(), 1);
        assert_eq!(engine.stats().calls_missed, 1);
    }

    #[test]
    fn test_hangup_of_waiting_call_removes_front_most_duplicate() {
        let mut engine = engine(1);
        engine.receive_call(CallId(1));
        engine.receive_call(CallId(2));
        engine.receive_call(CallId(2));

        assert_eq!(engine.hangup(CallId(2)).unwrap(), "Call 2 missed");
        assert_eq!(engine.queue().len(), 1);
        assert_eq!(engine.operators().status(&op("A")).unwrap(), OperatorStatus::Ringing);
    }

    #[test]
    fn test_hangup_frees_operator_for_queue_head() {
        let mut engine = engine(1);
        engine.receive_call(CallId(1));
        engine.answer(&op("A")).unwrap();
        engine.receive_call(CallId(2));

        assert_eq!(
            engine.hangup(CallId(1)).unwrap(),
            "Call 1 finished and operator A is available\nCall 2 ringing for operator A"
        );
        assert_eq!(engine.stats().calls_finished, 1);
    }

    #[test]
    fn test_timeout_forces_reject() {
        let mut engine = engine(2);
        engine.receive_call(CallId(1));

        let expiry = engine.scheduler_mut().fire(&op("A")).unwrap();
        assert_eq!(
            engine.handle_expiry(&expiry).unwrap(),
            "Call 1 ignored by operator A\nCall 1 ringing for operator B"
        );
        assert_eq!(engine.operators().status(&op("A")).unwrap(), OperatorStatus::Available);
        assert_eq!(engine.stats().calls_ignored, 1);
        engine.verify_invariants().unwrap();
    }

    #[test]
    fn test_timeout_ignored_after_answer() {
        let mut engine = engine(1);
        engine.receive_call(CallId(1));
        let token = engine.ring_token(&op("A")).unwrap();
        engine.answer(&op("A")).unwrap();

        assert!(engine.timeout_ring(&op("A"), token).is_none());
        assert_eq!(engine.operators().status(&op("A")).unwrap(), OperatorStatus::Busy);
    }

    #[test]
    fn test_disabled_timeout_arms_nothing() {
        let mut engine = RoutingEngine::new(1, None, ManualRingScheduler::new()).unwrap();
        engine.receive_call(CallId(1));
        assert_eq!(engine.scheduler().armed_count(), 0);
    }

    #[test]
    fn test_state_command_renders_snapshot() {
        let mut engine = engine(2);
        engine.receive_call(CallId(1));
        engine.receive_call(CallId(2));
        engine.receive_call(CallId(3));
        engine.answer(&op("B")).unwrap();

        let state = engine.execute(&Command::State).unwrap();
        assert!(state.starts_with("OPERATORS:\n    Operator #A: ringing\n    Operator #B: busy\n"));
        assert!(state.contains("ONGOING CALLS:\n    Operator #A: ringing, Call #1\n    Operator #B: busy, Call #2\n"));
        assert!(state.contains("WAITING QUEUE:\n    Call #3\n"));
        assert!(state.ends_with("STATS: received=3 answered=1 rejected=0 ignored=0 missed=0 finished=0"));
    }
}
