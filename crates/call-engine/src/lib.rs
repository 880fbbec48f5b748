//! # Hotline Call Engine
//!
//! Call routing for a small call center: incoming calls are offered to a
//! fixed pool of operators (`A`, `B`, ...), queued when everybody is occupied,
//! and recovered when the ringing operator does not respond in time.
//!
//! ## Layers
//!
//! - [`routing`]: the [`RoutingEngine`] state machine (call, answer, reject,
//!   hangup, ring timeout) over the [`operator`] registry, the waiting
//!   [`queue`] and the [`assignment`] table
//! - [`timer`]: ring timers and the tokens that tell a stale expiry apart
//! - [`orchestrator`]: the single task that owns the engine, plus the
//!   [`CallCenterEngine`] handle used to talk to it
//! - [`command`]: verbs and the JSON frames carried over the wire
//! - [`server`] / [`client`]: newline-delimited JSON over TCP, read through
//!   the length-capped [`framing`] reader
//! - [`config`], [`logging`], [`error`]: ambient plumbing
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hotline_call_engine::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let engine = CallCenterEngine::start(&HotlineConfig::default())?;
//!
//!     println!("{}", engine.execute_raw("call", Some("1")).await?);
//!     println!("{}", engine.execute_raw("answer", Some("A")).await?);
//!     println!("{}", engine.execute_raw("hangup", Some("1")).await?);
//!     Ok(())
//! }
//! ```

pub mod assignment;
pub mod call;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod framing;
pub mod logging;
pub mod operator;
pub mod orchestrator;
pub mod queue;
pub mod routing;
pub mod server;
pub mod timer;

pub use call::CallId;
pub use command::{Command, Request, Response};
pub use config::HotlineConfig;
pub use error::{HotlineError, Result};
pub use orchestrator::{CallCenterEngine, Notification};
pub use routing::RoutingEngine;

/// Prelude module for convenient imports
pub mod prelude {
    // Core types
    pub use crate::{CallCenterEngine, HotlineConfig, HotlineError, Result, RoutingEngine};

    // Configuration types
    pub use crate::config::{LoggingConfig, OperatorsConfig, RoutingConfig, ServerConfig};

    // Domain types
    pub use crate::assignment::{Assignment, AssignmentTable};
    pub use crate::call::CallId;
    pub use crate::operator::{Operator, OperatorId, OperatorRegistry, OperatorStatus};
    pub use crate::queue::{WaitingCall, WaitingQueue};
    pub use crate::routing::{EngineSnapshot, RoutingStats};
    pub use crate::timer::{ManualRingScheduler, RingExpiry, RingScheduler, RingToken, TokioRingScheduler};

    // Commands and transport
    pub use crate::client::HotlineClient;
    pub use crate::command::{Command, Request, Response};
    pub use crate::orchestrator::Notification;
    pub use crate::server::{HotlineServer, HotlineServerBuilder};
}
