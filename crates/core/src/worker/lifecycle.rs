//! Worker lifecycle states.

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

impl WorkerState {
    fn next(self) -> Option<WorkerState> {
        match self {
            WorkerState::Parsed => Some(WorkerState::Installing),
            WorkerState::Installing => Some(WorkerState::Installed),
            WorkerState::Installed => Some(WorkerState::Activating),
            WorkerState::Activating => Some(WorkerState::Activated),
            WorkerState::Activated => None,
        }
    }

    /// Move to `to`, which must be the immediate successor.
    pub fn advance(&mut self, to: WorkerState) -> Result<(), Error> {
        if self.next() != Some(to) {
            return Err(Error::InvalidInput(format!("cannot move worker from {self:?} to {to:?}")));
        }
        tracing::debug!(from = ?*self, ?to, "worker state change");
        *self = to;
        Ok(())
    }
}
