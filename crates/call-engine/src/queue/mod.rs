//! Waiting queue for calls that found no available operator.

pub mod manager;

pub use manager::{WaitingCall, WaitingQueue};
