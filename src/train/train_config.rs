use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`         — total number of full passes over the training set
/// - `progress_every` — log a debug line every this many samples (0 disables)
/// - `shuffle`        — visit cases in a fresh random order each epoch
///                      instead of archive order
/// - `progress_tx`    — optional channel sender; one `EpochStats` is sent per
///                      completed epoch.  If the receiver is dropped the loop
///                      terminates early.
/// - `stop_flag`      — optional atomic flag, checked between samples; when
///                      set the loop stops before the next sample starts.
pub struct TrainConfig {
    pub epochs: usize,
    pub progress_every: usize,
    pub shuffle: bool,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            progress_every: 10_000,
            shuffle: false,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
