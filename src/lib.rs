pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod layers;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use data::Case;
pub use error::{ConfigError, DatasetError, Error, Result};
pub use inference::Prediction;
pub use layers::{ConvLayer, DenseLayer, Layer, LayerKind, PoolLayer, ReluLayer};
pub use math::{Shape, Tensor};
pub use network::{Network, NetworkBuilder};
pub use optim::Sgd;
pub use train::{train_loop, TrainConfig};
