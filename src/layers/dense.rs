use rand::Rng;

use crate::error::ConfigError;
use crate::math::{init, Shape, Tensor};
use crate::optim::Sgd;

/// Fully connected layer: flattens a `W×H×D` input to `N` values and maps it
/// to `M` outputs, `out[m] = Σ_n w[m, n]·x[n] + b[m]`.
///
/// Weights are stored row-major, `w[m, n] = weights[m * N + n]`.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
    weight_grads: Vec<f32>,
    bias_grads: Vec<f32>,
    input: Tensor,
    output: Tensor,
    input_grads: Tensor,
}

impl DenseLayer {
    /// Builds a layer with Xavier-initialized weights and zero biases.
    pub fn new(input_shape: Shape, outputs: usize) -> Result<DenseLayer, ConfigError> {
        DenseLayer::with_rng(input_shape, outputs, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng>(
        input_shape: Shape,
        outputs: usize,
        rng: &mut R,
    ) -> Result<DenseLayer, ConfigError> {
        let n = input_shape.len();
        let weights = init::xavier_normal(outputs * n, n.max(1), rng);
        DenseLayer::from_weights(input_shape, outputs, weights, vec![0.0; outputs])
    }

    /// Builds a layer from an explicit `outputs × input_shape.len()` matrix.
    pub fn from_weights(
        input_shape: Shape,
        outputs: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<DenseLayer, ConfigError> {
        if input_shape.is_empty() {
            return Err(ConfigError::Zero { layer: "fully connected", field: "input size" });
        }
        if outputs == 0 {
            return Err(ConfigError::Zero { layer: "fully connected", field: "output count" });
        }
        let expected = outputs * input_shape.len();
        if weights.len() != expected {
            return Err(ConfigError::ParameterCount {
                what: "fully connected weights",
                expected,
                found: weights.len(),
            });
        }
        if biases.len() != outputs {
            return Err(ConfigError::ParameterCount {
                what: "fully connected biases",
                expected: outputs,
                found: biases.len(),
            });
        }

        Ok(DenseLayer {
            weight_grads: vec![0.0; weights.len()],
            bias_grads: vec![0.0; outputs],
            weights,
            biases,
            input: Tensor::zeros(input_shape),
            output: Tensor::zeros(Shape::new(outputs, 1, 1)),
            input_grads: Tensor::zeros(input_shape),
        })
    }

    pub fn input_shape(&self) -> Shape {
        self.input.shape()
    }

    pub fn output(&self) -> &Tensor {
        &self.output
    }

    pub fn input_grads(&self) -> &Tensor {
        &self.input_grads
    }

    pub fn weight_grads(&self) -> &[f32] {
        &self.weight_grads
    }

    pub fn activate(&mut self, input: &Tensor) {
        assert_eq!(
            input.shape(),
            self.input.shape(),
            "fully connected layer built for {} input, got {}",
            self.input.shape(),
            input.shape()
        );
        self.input.as_mut_slice().copy_from_slice(input.as_slice());

        let x = input.as_slice();
        for ((out, row), b) in self
            .output
            .as_mut_slice()
            .iter_mut()
            .zip(self.weights.chunks_exact(x.len()))
            .zip(&self.biases)
        {
            *out = row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b;
        }
    }

    pub fn backward(&mut self, grad_from_next: &Tensor) {
        assert_eq!(
            grad_from_next.shape(),
            self.output.shape(),
            "fully connected layer produces {} output, got a {} gradient",
            self.output.shape(),
            grad_from_next.shape()
        );
        let n = self.input.len();
        let x = self.input.as_slice();
        let grads_in = self.input_grads.as_mut_slice();
        grads_in.iter_mut().for_each(|g| *g = 0.0);

        for (m, &g) in grad_from_next.as_slice().iter().enumerate() {
            self.bias_grads[m] += g;
            let row = &self.weights[m * n..(m + 1) * n];
            let row_grads = &mut self.weight_grads[m * n..(m + 1) * n];
            for i in 0..n {
                row_grads[i] += g * x[i];
                grads_in[i] += row[i] * g;
            }
        }
    }

    pub fn apply_update(&mut self, optimizer: &Sgd) {
        optimizer.step(&mut self.weights, &mut self.weight_grads);
        optimizer.step(&mut self.biases, &mut self.bias_grads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(n: usize) -> Vec<f32> {
        (0..n * n).map(|i| if i / n == i % n { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn identity_weights_flatten_the_input() {
        let shape = Shape::new(2, 3, 2);
        let n = shape.len();
        let mut layer = DenseLayer::from_weights(shape, n, identity(n), vec![0.0; n]).unwrap();
        let input = Tensor::from_data(shape, (0..n).map(|i| i as f32 - 4.5).collect());

        layer.activate(&input);
        assert_eq!(layer.output().shape(), Shape::new(n, 1, 1));
        assert_eq!(layer.output().as_slice(), input.as_slice());
    }

    #[test]
    fn backward_is_transpose_product() {
        let shape = Shape::new(3, 1, 1);
        #[rustfmt::skip]
        let weights = vec![
            1.0, 2.0, 3.0,
            -1.0, 0.5, 0.0,
        ];
        let mut layer = DenseLayer::from_weights(shape, 2, weights, vec![0.5, -0.25]).unwrap();
        layer.activate(&Tensor::from_data(shape, vec![1.0, 1.0, 2.0]));
        assert_eq!(layer.output().as_slice(), &[9.5, -0.75]);

        layer.backward(&Tensor::from_data(Shape::new(2, 1, 1), vec![1.0, 2.0]));
        assert_eq!(layer.input_grads().shape(), shape);
        assert_eq!(layer.input_grads().as_slice(), &[-1.0, 3.0, 3.0]);
        assert_eq!(layer.weight_grads(), &[1.0, 1.0, 2.0, 2.0, 2.0, 4.0]);
    }

    #[test]
    fn update_moves_against_gradient_and_resets() {
        let shape = Shape::new(1, 1, 1);
        let mut layer = DenseLayer::from_weights(shape, 1, vec![1.0], vec![0.0]).unwrap();
        layer.activate(&Tensor::from_data(shape, vec![2.0]));
        layer.backward(&Tensor::from_data(shape, vec![0.5]));
        layer.apply_update(&Sgd::new(0.1));

        assert!((layer.weights[0] - 0.9).abs() < 1e-6);
        assert!((layer.biases[0] + 0.05).abs() < 1e-6);
        assert_eq!(layer.weight_grads(), &[0.0]);
    }

    #[test]
    fn wrong_weight_count_is_rejected() {
        let err = DenseLayer::from_weights(Shape::new(2, 2, 1), 3, vec![0.0; 11], vec![0.0; 3])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ParameterCount { what: "fully connected weights", expected: 12, found: 11 }
        );
    }
}
