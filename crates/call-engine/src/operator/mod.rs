//! Operator pool: ids, status and the registry that owns them.

pub mod registry;
pub mod types;

pub use registry::{OperatorRegistry, OperatorStats, MAX_OPERATORS, OPERATOR_ALPHABET};
pub use types::{Operator, OperatorId, OperatorStatus};
