pub mod network;

pub use network::{LayerSummary, Network, NetworkBuilder, MNIST_CLASSES, MNIST_INPUT};
