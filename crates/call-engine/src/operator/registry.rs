use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{HotlineError, Result};

use super::types::{Operator, OperatorId, OperatorStatus};

/// Ids are drawn from this alphabet, one letter per operator
pub const OPERATOR_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest supported operator pool
pub const MAX_OPERATORS: usize = OPERATOR_ALPHABET.len();

/// Fixed set of operators and their status
///
/// Operators are created once and never removed. Iteration follows creation
/// order (`A`, `B`, ...), which is the tie-break for "first available
/// operator".
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: IndexMap<OperatorId, Operator>,
}

/// Operator counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorStats {
    pub total: usize,
    pub available: usize,
    pub ringing: usize,
    pub busy: usize,
}

impl OperatorRegistry {
    /// Create `count` operators named `A`, `B`, ... in that order
    pub fn with_count(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(HotlineError::config("operator count must be at least 1"));
        }
        if count > MAX_OPERATORS {
            return Err(HotlineError::config(format!(
                "operator count {} exceeds the supported maximum of {}",
                count, MAX_OPERATORS
            )));
        }

        let operators = OPERATOR_ALPHABET
            .chars()
            .take(count)
            .map(|letter| {
                let id = OperatorId(letter.to_string());
                (id.clone(), Operator::new(id))
            })
            .collect();

        info!("👥 Loaded {} operators", count);
        Ok(Self { operators })
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn contains(&self, id: &OperatorId) -> bool {
        self.operators.contains_key(id)
    }

    /// Look up an operator by id
    pub fn get(&self, id: &OperatorId) -> Result<&Operator> {
        self.operators
            .get(id)
            .ok_or_else(|| HotlineError::not_found(format!("operator {}", id)))
    }

    pub fn status(&self, id: &OperatorId) -> Result<OperatorStatus> {
        self.get(id).map(|operator| operator.status)
    }

    /// Update operator status
    pub fn set_status(&mut self, id: &OperatorId, status: OperatorStatus) -> Result<()> {
        let operator = self
            .operators
            .get_mut(id)
            .ok_or_else(|| HotlineError::not_found(format!("operator {}", id)))?;

        debug!("🔄 Operator {} status: {} -> {}", id, operator.status, status);
        operator.status = status;
        Ok(())
    }

    /// Operators in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values()
    }

    /// First available operator in creation order, optionally skipping one
    pub fn first_available(&self, skip: Option<&OperatorId>) -> Option<&OperatorId> {
        self.operators
            .values()
            .filter(|operator| Some(&operator.id) != skip)
            .find(|operator| operator.status.is_available())
            .map(|operator| &operator.id)
    }

    /// Mark the first available operator (honouring `skip`) as ringing and
    /// return its id
    pub fn claim_first_available(&mut self, skip: Option<&OperatorId>) -> Option<OperatorId> {
        let operator = self
            .operators
            .values_mut()
            .filter(|operator| Some(&operator.id) != skip)
            .find(|operator| operator.status.is_available())?;

        debug!("🔄 Operator {} status: {} -> {}", operator.id, operator.status, OperatorStatus::Ringing);
        operator.status = OperatorStatus::Ringing;
        Some(operator.id.clone())
    }

    pub fn stats(&self) -> OperatorStats {
        self.iter().fold(
            OperatorStats {
                total: self.len(),
                ..Default::default()
            },
            |mut stats, operator| {
                match operator.status {
                    OperatorStatus::Available => stats.available += 1,
                    OperatorStatus::Ringing => stats.ringing += 1,
                    OperatorStatus::Busy => stats.busy += 1,
                }
                stats
            },
        )
    }
}
