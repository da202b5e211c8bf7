// Trains the MNIST CNN on the IDX archives, then classifies the sample image
// on a fixed cadence so it can be swapped out while the program runs:
//   cargo run --release -- --sample digit.ppm
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use log::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;

use ferrite_cnn::config::AppConfig;
use ferrite_cnn::network::MNIST_CLASSES;
use ferrite_cnn::{data, inference, train_loop, Network, TrainConfig};

fn main() -> ExitCode {
    let config = AppConfig::parse();

    let level = if config.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig) -> ferrite_cnn::Result<()> {
    let mut network = match config.seed {
        Some(seed) => Network::mnist_seeded(config.learning_rate, seed)?,
        None => Network::mnist(config.learning_rate)?,
    };
    for stage in network.summary() {
        info!("{:?}: {} -> {}", stage.kind, stage.input, stage.output);
    }

    let input = network.input_shape();
    let cases = data::load_idx_pair(&config.images, &config.labels, input, MNIST_CLASSES, config.limit)?;

    let mut train_config = TrainConfig::new(config.epochs);
    train_config.progress_every = config.progress_every;
    train_config.shuffle = config.shuffle;

    info!("training for {} epochs on {} cases", config.epochs, cases.len());
    let error = train_loop(&mut network, &cases, &train_config);
    info!(
        "training done: error = {:.4}, training accuracy {:.2}%",
        error,
        network.evaluate(&cases) * 100.0
    );

    info!("classifying {} every {:?}", config.sample.display(), config.poll_interval());
    loop {
        match inference::classify_file(&mut network, &config.sample) {
            Ok(predictions) => print!("{}", inference::render(&predictions, config.json)),
            Err(e) if e.is_not_found() => debug!("{e}"),
            Err(e) => warn!("{e}"),
        }
        if config.once {
            return Ok(());
        }
        thread::sleep(config.poll_interval());
    }
}
