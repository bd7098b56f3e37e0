use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    InProgress,
    Terminated,
}

/// Durable progress of a conversion run.
///
/// Field names on disk match the state file written by earlier versions of
/// the converter, so existing `logs/.conversion_state.json` files resume.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Number of page elements from the start of the dump already accounted for.
    pub position: u64,
    #[serde(rename = "success")]
    pub success_count: u64,
    #[serde(rename = "failed")]
    pub failure_count: u64,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub status: RunStatus,
}

impl CheckpointState {
    /// Fresh state used when no checkpoint can be loaded.
    pub fn starting_at(position: u64) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Re-opens a loaded checkpoint for a new run.
    pub fn resumed(self) -> Self {
        Self {
            status: RunStatus::InProgress,
            ..self
        }
    }

    /// Folds a finished batch into the counters.
    ///
    /// `observed` is the number of page elements the batch covered, valid or not;
    /// the position only ever moves forward.
    pub fn advance(&mut self, observed: u64, succeeded: u64, failed: u64) {
        self.position = self.position.saturating_add(observed);
        self.success_count = self.success_count.saturating_add(succeeded);
        self.failure_count = self.failure_count.saturating_add(failed);
    }

    /// One-way transition; a terminated checkpoint stays terminated.
    pub fn terminate(&mut self) {
        self.status = RunStatus::Terminated;
    }

    pub fn is_terminated(&self) -> bool {
        self.status == RunStatus::Terminated
    }

    pub fn processed(&self) -> u64 {
        self.success_count + self.failure_count
    }
}
