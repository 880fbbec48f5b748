use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::call::CallId;

/// A call waiting for an operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingCall {
    pub call: CallId,
    pub queued_at: DateTime<Utc>,
}

/// FIFO of calls with no available operator
///
/// Ordering is arrival order only. Duplicate ids may appear; removal by id
/// takes the front-most match.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    calls: VecDeque<WaitingCall>,
}

impl WaitingQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            calls: VecDeque::new(),
        }
    }

    /// Append a call at the tail
    pub fn push_back(&mut self, call: CallId) {
        self.calls.push_back(WaitingCall {
            call,
            queued_at: Utc::now(),
        });
        info!("📞 Call {} queued (queue size: {})", call, self.calls.len());
    }

    /// Remove and return the head of the queue
    pub fn pop_front(&mut self) -> Option<WaitingCall> {
        let next = self.calls.pop_front();
        if let Some(waiting) = &next {
            debug!("📤 Dequeued call {} (queue size: {})", waiting.call, self.calls.len());
        }
        next
    }

    pub fn front(&self) -> Option<&WaitingCall> {
        self.calls.front()
    }

    /// Remove the front-most entry for `call`
    ///
    /// Absence is a normal search outcome, reported as `None`.
    pub fn remove(&mut self, call: CallId) -> Option<WaitingCall> {
        let position = self.calls.iter().position(|waiting| waiting.call == call)?;
        let removed = self.calls.remove(position);
        if removed.is_some() {
            debug!("🗑️ Removed call {} from position {} in queue", call, position);
        }
        removed
    }

    pub fn contains(&self, call: CallId) -> bool {
        self.calls.iter().any(|waiting| waiting.call == call)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Waiting calls, head first
    pub fn iter(&self) -> impl Iterator<Item = &WaitingCall> {
        self.calls.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(queue: &WaitingQueue) -> Vec<i64> {
        queue.iter().map(|waiting| waiting.call.0).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = WaitingQueue::new();
        assert!(queue.pop_front().is_none());

        queue.push_back(CallId(1));
        queue.push_back(CallId(2));
        queue.push_back(CallId(3));

        assert_eq!(queue.front().map(|w| w.call), Some(CallId(1)));
        assert_eq!(queue.pop_front().map(|w| w.call), Some(CallId(1)));
        assert_eq!(ids(&queue), vec![2, 3]);
    }

    #[test]
    fn test_remove_takes_front_most_match() {
        let mut queue = WaitingQueue::new();
        for id in [5, 7, 5, 9] {
            queue.push_back(CallId(id));
        }

        assert!(queue.remove(CallId(5)).is_some());
        assert_eq!(ids(&queue), vec![7, 5, 9]);

        assert!(queue.remove(CallId(42)).is_none());
        assert_eq!(queue.len(), 3);
        assert!(queue.contains(CallId(5)));
    }
}
