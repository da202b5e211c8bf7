pub mod conv;
pub mod dense;
pub mod pool;
pub mod relu;

pub use conv::ConvLayer;
pub use dense::DenseLayer;
pub use pool::PoolLayer;
pub use relu::ReluLayer;

use serde::Serialize;

use crate::error::ConfigError;
use crate::math::{Shape, Tensor};
use crate::optim::Sgd;

/// One stage of a [`Network`](crate::network::Network).
///
/// Every variant owns its output tensor, the gradient it hands back to the
/// previous stage, and a copy of its most recent input. Stages only agree on
/// tensor shapes; none of them knows what sits before or after it.
#[derive(Debug, Clone)]
pub enum Layer {
    Conv(ConvLayer),
    Relu(ReluLayer),
    Pool(PoolLayer),
    Dense(DenseLayer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Convolution,
    Rectifier,
    Pooling,
    FullyConnected,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Conv(_) => LayerKind::Convolution,
            Layer::Relu(_) => LayerKind::Rectifier,
            Layer::Pool(_) => LayerKind::Pooling,
            Layer::Dense(_) => LayerKind::FullyConnected,
        }
    }

    /// Forward pass: fills [`Layer::output`] from `input`.
    ///
    /// Panics if `input` does not have [`Layer::input_shape`].
    pub fn activate(&mut self, input: &Tensor) {
        match self {
            Layer::Conv(l) => l.activate(input),
            Layer::Relu(l) => l.activate(input),
            Layer::Pool(l) => l.activate(input),
            Layer::Dense(l) => l.activate(input),
        }
    }

    /// Backward pass: fills [`Layer::input_grads`] and accumulates parameter
    /// gradients against the input cached by the last [`Layer::activate`].
    pub fn backward(&mut self, grad_from_next: &Tensor) {
        match self {
            Layer::Conv(l) => l.backward(grad_from_next),
            Layer::Relu(l) => l.backward(grad_from_next),
            Layer::Pool(l) => l.backward(grad_from_next),
            Layer::Dense(l) => l.backward(grad_from_next),
        }
    }

    /// Applies accumulated gradients and clears them. No-op for parameter-free stages.
    pub fn apply_update(&mut self, optimizer: &Sgd) {
        match self {
            Layer::Conv(l) => l.apply_update(optimizer),
            Layer::Dense(l) => l.apply_update(optimizer),
            Layer::Relu(_) | Layer::Pool(_) => {}
        }
    }

    pub fn output(&self) -> &Tensor {
        match self {
            Layer::Conv(l) => l.output(),
            Layer::Relu(l) => l.output(),
            Layer::Pool(l) => l.output(),
            Layer::Dense(l) => l.output(),
        }
    }

    pub fn input_grads(&self) -> &Tensor {
        match self {
            Layer::Conv(l) => l.input_grads(),
            Layer::Relu(l) => l.input_grads(),
            Layer::Pool(l) => l.input_grads(),
            Layer::Dense(l) => l.input_grads(),
        }
    }

    pub fn input_shape(&self) -> Shape {
        match self {
            Layer::Conv(l) => l.input_shape(),
            Layer::Relu(l) => l.input_shape(),
            Layer::Pool(l) => l.input_shape(),
            Layer::Dense(l) => l.input_shape(),
        }
    }

    pub fn output_shape(&self) -> Shape {
        self.output().shape()
    }
}

impl From<ConvLayer> for Layer {
    fn from(layer: ConvLayer) -> Self {
        Layer::Conv(layer)
    }
}

impl From<ReluLayer> for Layer {
    fn from(layer: ReluLayer) -> Self {
        Layer::Relu(layer)
    }
}

impl From<PoolLayer> for Layer {
    fn from(layer: PoolLayer) -> Self {
        Layer::Pool(layer)
    }
}

impl From<DenseLayer> for Layer {
    fn from(layer: DenseLayer) -> Self {
        Layer::Dense(layer)
    }
}

/// Spatial output size of a square `window` sliding over `input` by `stride`
/// without padding.
pub(crate) fn sliding_output(
    layer: &'static str,
    input: Shape,
    window: usize,
    stride: usize,
) -> Result<(usize, usize), ConfigError> {
    if stride == 0 {
        return Err(ConfigError::Zero { layer, field: "stride" });
    }
    if window == 0 {
        return Err(ConfigError::Zero { layer, field: "window size" });
    }
    if window > input.width || window > input.height {
        return Err(ConfigError::WindowTooLarge { layer, window, input });
    }
    if (input.width - window) % stride != 0 || (input.height - window) % stride != 0 {
        return Err(ConfigError::MisalignedStride { layer, window, stride, input });
    }
    Ok(((input.width - window) / stride + 1, (input.height - window) / stride + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_output_sizes() {
        assert_eq!(sliding_output("t", Shape::new(28, 28, 1), 5, 1), Ok((24, 24)));
        assert_eq!(sliding_output("t", Shape::new(24, 24, 8), 2, 2), Ok((12, 12)));
        assert_eq!(sliding_output("t", Shape::new(3, 3, 1), 3, 1), Ok((1, 1)));
    }

    #[test]
    fn parameter_free_layers_ignore_updates() {
        let shape = Shape::new(2, 2, 1);
        let mut relu = Layer::from(ReluLayer::new(shape));
        let input = Tensor::from_data(shape, vec![1.0, -2.0, 3.0, -4.0]);
        relu.activate(&input);
        let before = relu.output().clone();
        relu.apply_update(&Sgd::new(1.0));
        assert_eq!(relu.output(), &before);
        assert_eq!(relu.kind(), LayerKind::Rectifier);
        assert_eq!(relu.output_shape(), shape);
    }
}
