use serde::Serialize;

/// Per-epoch training statistics emitted by `train_loop`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Samples trained on during this epoch.
    pub samples: usize,
    /// Mean of the per-sample error metric over this epoch.
    pub epoch_error: f64,
    /// Mean error over every sample seen since the run started.
    pub running_error: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
