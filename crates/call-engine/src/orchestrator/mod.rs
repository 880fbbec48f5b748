//! # Call Center Orchestration Module
//!
//! The orchestrator runs the [`RoutingEngine`](crate::routing::RoutingEngine)
//! inside a single tokio task and hands out cheap [`CallCenterEngine`] handles
//! to everything that needs to issue commands: TCP connections, the
//! interactive shell, tests.
//!
//! ## Architecture
//!
//! ```text
//!  client / shell ──┐                     ┌──────────────────────┐
//!  client / shell ──┼── Command + reply ─▶│     engine task      │── Notification ──▶ subscribers
//!  client / shell ──┘    (bounded mpsc)   │  owns RoutingEngine  │   (broadcast)
//!                                         └──────────▲───────────┘
//!                                                    │ RingExpiry (unbounded mpsc)
//!                                         ┌──────────┴───────────┐
//!                                         │  ring timer tasks    │
//!                                         └──────────────────────┘
//! ```
//!
//! Commands and timer expiries are handled strictly one after another, so the
//! registry, assignment table and queue need no locks. Each command gets its
//! result on a oneshot reply channel; timeout messages go out on the broadcast
//! channel to every subscriber.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hotline_call_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = CallCenterEngine::start(&HotlineConfig::default())?;
//! let mut notifications = engine.subscribe();
//!
//! println!("{}", engine.execute(Command::Call(CallId(1))).await?);
//!
//! // Ten seconds later, unless operator A answers:
//! if let Ok(notification) = notifications.recv().await {
//!     println!("{}", notification.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod events;

pub use self::core::CallCenterEngine;
pub use events::Notification;
