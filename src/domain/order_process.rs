use crate::error::{OrderProcessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an order process.
///
/// `Running` is the only non-terminal status. A process moves from `Running`
/// to exactly one of `Succeeded` or `Failed` and never changes again.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Running,
    Succeeded,
    Failed,
}

impl OrderStatus {
    /// Returns `true` for statuses with no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the simulated work for one order.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl From<Outcome> for OrderStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => Self::Succeeded,
            Outcome::Failed => Self::Failed,
        }
    }
}

/// The processing state of one order.
///
/// The store owns the canonical copy; everything else works on clones and
/// hands them back through `OrderProcessStore::update`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct OrderProcess {
    /// Caller-chosen identifier, unique across the store.
    pub order_id: String,
    /// Current lifecycle status.
    pub status: OrderStatus,
}

impl OrderProcess {
    /// Creates a freshly registered process in the `Running` state.
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            status: OrderStatus::Running,
        }
    }

    /// Moves a running process to the terminal status matching `outcome`.
    ///
    /// Fails with `InvariantViolation` if the process already left `Running`.
    pub fn complete(&mut self, outcome: Outcome) -> Result<()> {
        if self.status != OrderStatus::Running {
            return Err(OrderProcessError::InvariantViolation(format!(
                "order {} cannot move from {} to {}",
                self.order_id,
                self.status,
                OrderStatus::from(outcome)
            )));
        }
        self.status = outcome.into();
        Ok(())
    }
}
