use std::time::Instant;

use log::info;
use rand::seq::SliceRandom;

use crate::data::Case;
use crate::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_epoch;

/// Trains `network` for `config.epochs` epochs of per-sample SGD and returns
/// the running mean error after the last completed epoch.
///
/// The running mean is the sum of every per-sample error so far divided by
/// the number of samples trained on, which is what the epoch log line shows.
///
/// # Early termination
/// The loop stops if:
/// - `config.stop_flag` is raised (checked between samples), **or**
/// - the `progress_tx` receiver has been dropped.
///
/// # Panics
/// Panics if `cases` is empty.
pub fn train_loop(network: &mut Network, cases: &[Case], config: &TrainConfig) -> f64 {
    assert!(!cases.is_empty(), "cases must not be empty");

    let mut order: Vec<usize> = (0..cases.len()).collect();
    let mut rng = rand::thread_rng();
    let mut total_error = 0.0;
    let mut total_samples = 0usize;
    let mut running_error = 0.0;

    for epoch in 1..=config.epochs {
        if config.shuffle {
            order.shuffle(&mut rng);
        }

        let t_start = Instant::now();
        let outcome = train_epoch(
            network,
            cases,
            &order,
            config.progress_every,
            config.stop_flag.as_deref(),
        );
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        if outcome.samples > 0 {
            total_error += outcome.total_error;
            total_samples += outcome.samples;
            running_error = total_error / total_samples as f64;

            let stats = EpochStats {
                epoch,
                total_epochs: config.epochs,
                samples: outcome.samples,
                epoch_error: outcome.total_error / outcome.samples as f64,
                running_error,
                elapsed_ms,
            };
            info!(
                "epoch {}/{}: {} samples, error = {:.4} (epoch {:.4}), {} ms",
                epoch, config.epochs, stats.samples, stats.running_error, stats.epoch_error, elapsed_ms
            );

            if let Some(ref tx) = config.progress_tx {
                // If the receiver has been dropped, stop training.
                if tx.send(stats).is_err() {
                    break;
                }
            }
        }

        if outcome.stopped {
            info!("training stopped during epoch {}", epoch);
            break;
        }
    }

    running_error
}
