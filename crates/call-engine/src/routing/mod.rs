//! # Call Routing Engine Module
//!
//! The routing engine is the state machine at the center of the hotline. It
//! assigns incoming calls to operators, queues calls when everybody is
//! occupied, and recovers calls whose operator does not pick up in time.
//!
//! ## Operator lifecycle
//!
//! ```text
//!              call / queue step
//!   ┌───────────┐ ───────────────▶ ┌───────────┐   answer   ┌───────────┐
//!   │ Available │                  │  Ringing  │ ─────────▶ │   Busy    │
//!   └───────────┘ ◀─────────────── └───────────┘            └─────┬─────┘
//!         ▲        reject / timeout / hangup                      │
//!         └───────────────────────────────────────────────────────┘
//!                                 hangup
//! ```
//!
//! ## Forwarding rules
//!
//! - A new call rings the first available operator in registry order (`A`
//!   before `B`), or joins the tail of the waiting queue.
//! - A rejected or ignored call is forwarded again, skipping the operator that
//!   released it; that operator may still pick up the queue head right after.
//! - Every reject, timeout and hangup ends with one attempt to offer the queue
//!   head to a free operator.
//!
//! ## Ring timeouts
//!
//! Each ringing episode carries a fresh [`RingToken`](crate::timer::RingToken).
//! Leaving `Ringing` cancels the timer; an expiry whose token no longer
//! matches is ignored.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use hotline_call_engine::prelude::*;
//!
//! let mut engine = RoutingEngine::new(2, Some(Duration::from_secs(10)), ManualRingScheduler::new())?;
//!
//! assert_eq!(engine.receive_call(CallId(1)), "Call 1 received\nCall 1 ringing for operator A");
//! assert_eq!(engine.answer(&OperatorId::new("A"))?, "Call 1 answered by operator A");
//! assert_eq!(
//!     engine.hangup(CallId(1))?,
//!     "Call 1 finished and operator A is available"
//! );
//! # Ok::<(), HotlineError>(())
//! ```

pub mod engine;
pub mod snapshot;

pub use engine::RoutingEngine;
pub use snapshot::{AssignmentView, EngineSnapshot, OperatorView, RoutingStats, WaitingView};
