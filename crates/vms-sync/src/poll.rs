use std::collections::BTreeMap;
use vms_core::{aggregate, InferenceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// No fetch has succeeded or failed yet.
    Pending,
    Ready,
    Failed,
}

/// Aggregated view of one stream's recent results, owned by that stream's
/// poller and published to the UI as a snapshot after every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub status: PollStatus,
    pub window: Vec<InferenceResult>,
    pub latest_by_model: BTreeMap<String, InferenceResult>,
    pub error: Option<String>,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            status: PollStatus::Pending,
            window: Vec::new(),
            latest_by_model: BTreeMap::new(),
            error: None,
        }
    }
}

impl PollState {
    pub fn apply_success(&mut self, results: &[InferenceResult], cap: usize) {
        let view = aggregate(results, cap);
        self.window = view.window;
        self.latest_by_model = view.latest_by_model;
        self.status = PollStatus::Ready;
        self.error = None;
    }

    /// A failed tick keeps the previous window and latest-per-model view:
    /// stale data on screen beats a blanked row.
    pub fn apply_failure(&mut self, error: String) {
        self.status = PollStatus::Failed;
        self.error = Some(error);
    }

    pub fn has_results(&self) -> bool {
        !self.window.is_empty()
    }
}
