use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueHint};

use crate::optim::DEFAULT_LEARNING_RATE;

/// Settings for one run of the binary.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(
    name = "ferrite-cnn",
    version,
    about = "Trains a small CNN on MNIST, then classifies a sample image once per interval"
)]
pub struct AppConfig {
    /// IDX3 training images
    #[arg(long, default_value = "train-images.idx3-ubyte", value_hint = ValueHint::FilePath)]
    pub images: PathBuf,

    /// IDX1 training labels
    #[arg(long, default_value = "train-labels.idx1-ubyte", value_hint = ValueHint::FilePath)]
    pub labels: PathBuf,

    /// Image to classify
    #[arg(long, default_value = "test.ppm", value_hint = ValueHint::FilePath)]
    pub sample: PathBuf,

    /// Passes over the training set
    #[arg(long, default_value_t = 2)]
    pub epochs: usize,

    /// SGD step size
    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE, value_parser = positive_rate)]
    pub learning_rate: f32,

    /// Train on the first N cases only
    #[arg(long, value_parser = at_least_one)]
    pub limit: Option<usize>,

    /// Log progress every N samples
    #[arg(long, default_value_t = 10_000)]
    pub progress_every: usize,

    /// Delay between classification attempts, in milliseconds
    #[arg(long = "interval-ms", default_value_t = 1000)]
    pub interval_ms: u64,

    /// Seed for the initial weights
    #[arg(long)]
    pub seed: Option<u64>,

    /// Shuffle the training order every epoch
    #[arg(long)]
    pub shuffle: bool,

    /// Classify the sample once and exit
    #[arg(long)]
    pub once: bool,

    /// Print predictions as JSON
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn positive_rate(raw: &str) -> Result<f32, String> {
    let rate: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("must be positive, got {rate}"))
    }
}

fn at_least_one(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("{e}")),
    }
}
