use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::data::Case;
use crate::error::ConfigError;
use crate::layers::{ConvLayer, DenseLayer, Layer, LayerKind, PoolLayer, ReluLayer};
use crate::math::{Shape, Tensor};
use crate::optim::Sgd;

/// Input shape of the MNIST architecture.
pub const MNIST_INPUT: Shape = Shape::new(28, 28, 1);
/// Number of digit classes.
pub const MNIST_CLASSES: usize = 10;

/// An owned, non-empty chain of layers whose shapes line up end to end.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    optimizer: Sgd,
}

/// Kind and geometry of one stage, for logging and `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub kind: LayerKind,
    pub input: Shape,
    pub output: Shape,
}

impl Network {
    /// Starts a chain that accepts tensors of `input_shape`.
    pub fn builder(input_shape: Shape) -> NetworkBuilder {
        NetworkBuilder::new(input_shape)
    }

    /// Wraps pre-built layers, checking that each one accepts what the
    /// previous one produces.
    pub fn from_layers(layers: Vec<Layer>, optimizer: Sgd) -> Result<Network, ConfigError> {
        if layers.is_empty() {
            return Err(ConfigError::EmptyNetwork);
        }
        for (index, pair) in layers.windows(2).enumerate() {
            let (found, expected) = (pair[0].output_shape(), pair[1].input_shape());
            if found != expected {
                return Err(ConfigError::ShapeMismatch { index: index + 1, expected, found });
            }
        }
        Ok(Network { layers, optimizer })
    }

    /// Conv(stride 1, 5×5, 8 filters) → Relu → Pool(2×2, stride 2) → Dense(10)
    /// over 28×28×1 images.
    pub fn mnist(learning_rate: f32) -> Result<Network, ConfigError> {
        Network::mnist_builder(learning_rate).build()
    }

    /// Same as [`Network::mnist`] with reproducible initial weights.
    pub fn mnist_seeded(learning_rate: f32, seed: u64) -> Result<Network, ConfigError> {
        Network::mnist_builder(learning_rate).seed(seed).build()
    }

    fn mnist_builder(learning_rate: f32) -> NetworkBuilder {
        Network::builder(MNIST_INPUT)
            .learning_rate(learning_rate)
            .conv(1, 5, 8)
            .relu()
            .pool(2, 2)
            .dense(MNIST_CLASSES)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn optimizer(&self) -> Sgd {
        self.optimizer
    }

    pub fn input_shape(&self) -> Shape {
        self.layers[0].input_shape()
    }

    pub fn output_shape(&self) -> Shape {
        self.output().shape()
    }

    /// Output of the last stage as of the most recent forward pass.
    pub fn output(&self) -> &Tensor {
        // from_layers guarantees at least one layer.
        self.layers[self.layers.len() - 1].output()
    }

    pub fn summary(&self) -> Vec<LayerSummary> {
        self.layers
            .iter()
            .map(|l| LayerSummary { kind: l.kind(), input: l.input_shape(), output: l.output_shape() })
            .collect()
    }

    /// Runs the forward chain: layer 0 on `input`, each later layer on its
    /// predecessor's output.
    pub fn forward(&mut self, input: &Tensor) -> &Tensor {
        for i in 0..self.layers.len() {
            let (done, rest) = self.layers.split_at_mut(i);
            let stage_input = match done.last() {
                Some(prev) => prev.output(),
                None => input,
            };
            rest[0].activate(stage_input);
        }
        self.output()
    }

    /// Backward chain from an output-side gradient, last layer first.
    fn backward(&mut self, output_grads: &Tensor) {
        for i in (0..self.layers.len()).rev() {
            let (head, tail) = self.layers.split_at_mut(i + 1);
            let grad = match tail.first() {
                Some(next) => next.input_grads(),
                None => output_grads,
            };
            head[i].backward(grad);
        }
    }

    /// One full forward / backward / update cycle on a single sample.
    ///
    /// Returns `100 · Σ |output[i] − target[i]|` over the classes whose target
    /// exceeds 0.5: a progress indicator, not a loss the gradient descends.
    pub fn train_one(&mut self, input: &Tensor, target: &Tensor) -> f32 {
        self.forward(input);
        let grads = self.output() - target;
        self.backward(&grads);

        let optimizer = self.optimizer;
        for layer in &mut self.layers {
            layer.apply_update(&optimizer);
        }

        let err: f32 = grads
            .as_slice()
            .iter()
            .zip(target.as_slice())
            .filter(|&(_, &t)| t > 0.5)
            .map(|(g, _)| g.abs())
            .sum();
        err * 100.0
    }

    /// Forward chain only; returns a copy of the final output.
    pub fn infer(&mut self, input: &Tensor) -> Tensor {
        self.forward(input).clone()
    }

    /// Fraction of `cases` whose strongest output matches the target class.
    pub fn evaluate(&mut self, cases: &[Case]) -> f64 {
        if cases.is_empty() {
            return 0.0;
        }
        let correct = cases
            .iter()
            .filter(|case| self.forward(&case.input).argmax() == case.target.argmax())
            .count();
        correct as f64 / cases.len() as f64
    }
}

enum Stage {
    Conv { stride: usize, kernel: usize, filters: usize },
    Relu,
    Pool { stride: usize, size: usize },
    Dense { outputs: usize },
}

/// Describes a chain stage by stage; every stage is sized from the output of
/// the one before it, so only window geometry can fail, at [`NetworkBuilder::build`].
pub struct NetworkBuilder {
    input_shape: Shape,
    stages: Vec<Stage>,
    learning_rate: f32,
    seed: Option<u64>,
}

impl NetworkBuilder {
    pub fn new(input_shape: Shape) -> NetworkBuilder {
        NetworkBuilder {
            input_shape,
            stages: Vec::new(),
            learning_rate: crate::optim::DEFAULT_LEARNING_RATE,
            seed: None,
        }
    }

    pub fn conv(mut self, stride: usize, kernel: usize, filters: usize) -> Self {
        self.stages.push(Stage::Conv { stride, kernel, filters });
        self
    }

    pub fn relu(mut self) -> Self {
        self.stages.push(Stage::Relu);
        self
    }

    pub fn pool(mut self, stride: usize, size: usize) -> Self {
        self.stages.push(Stage::Pool { stride, size });
        self
    }

    pub fn dense(mut self, outputs: usize) -> Self {
        self.stages.push(Stage::Dense { outputs });
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Seeds weight initialization; without it weights come from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Network, ConfigError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut shape = self.input_shape;
        let mut layers = Vec::with_capacity(self.stages.len());
        for stage in self.stages {
            let layer: Layer = match stage {
                Stage::Conv { stride, kernel, filters } => {
                    ConvLayer::with_rng(stride, kernel, filters, shape, &mut rng)?.into()
                }
                Stage::Relu => ReluLayer::new(shape).into(),
                Stage::Pool { stride, size } => PoolLayer::new(stride, size, shape)?.into(),
                Stage::Dense { outputs } => DenseLayer::with_rng(shape, outputs, &mut rng)?.into(),
            };
            shape = layer.output_shape();
            layers.push(layer);
        }

        let network = Network::from_layers(layers, Sgd::new(self.learning_rate))?;
        info!(
            "built network {} -> {} with {} layers",
            network.input_shape(),
            network.output_shape(),
            network.layers.len()
        );
        Ok(network)
    }
}
