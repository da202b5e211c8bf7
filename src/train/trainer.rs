use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::data::Case;
use crate::network::Network;

/// Result of one pass over the training set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOutcome {
    /// Sum of the per-sample error metric.
    pub total_error: f64,
    /// Samples actually trained on.
    pub samples: usize,
    /// True if the stop flag cut the pass short.
    pub stopped: bool,
}

/// Trains on `cases` one sample at a time, in the order given by `order`.
///
/// The stop flag is only consulted between samples, so a sample is always
/// carried through its forward, backward and update passes.
pub fn train_epoch(
    network: &mut Network,
    cases: &[Case],
    order: &[usize],
    progress_every: usize,
    stop_flag: Option<&AtomicBool>,
) -> EpochOutcome {
    let mut outcome = EpochOutcome { total_error: 0.0, samples: 0, stopped: false };

    for &idx in order {
        if stop_flag.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            outcome.stopped = true;
            break;
        }

        let case = &cases[idx];
        outcome.total_error += network.train_one(&case.input, &case.target) as f64;
        outcome.samples += 1;

        if progress_every > 0 && outcome.samples % progress_every == 0 {
            debug!(
                "sample {} / {}, mean error {:.4}",
                outcome.samples,
                order.len(),
                outcome.total_error / outcome.samples as f64
            );
        }
    }

    outcome
}
