use rand::Rng;

use crate::error::ConfigError;
use crate::layers::sliding_output;
use crate::math::{init, Shape, Tensor};
use crate::optim::Sgd;

/// Valid (unpadded) convolution with a bank of square filters.
///
/// Input `W×H×D`, `F` filters of `K×K×D` with one bias each,
/// output `((W−K)/s + 1) × ((H−K)/s + 1) × F`.
#[derive(Debug, Clone)]
pub struct ConvLayer {
    stride: usize,
    kernel: usize,
    pub filters: Vec<Tensor>,
    pub biases: Vec<f32>,
    filter_grads: Vec<Tensor>,
    bias_grads: Vec<f32>,
    input: Tensor,
    output: Tensor,
    input_grads: Tensor,
}

impl ConvLayer {
    /// Builds a layer with He-initialized filters and zero biases.
    pub fn new(
        stride: usize,
        kernel: usize,
        filters: usize,
        input_shape: Shape,
    ) -> Result<ConvLayer, ConfigError> {
        ConvLayer::with_rng(stride, kernel, filters, input_shape, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng>(
        stride: usize,
        kernel: usize,
        filters: usize,
        input_shape: Shape,
        rng: &mut R,
    ) -> Result<ConvLayer, ConfigError> {
        if filters == 0 {
            return Err(ConfigError::Zero { layer: "convolution", field: "filter count" });
        }
        if input_shape.depth == 0 {
            return Err(ConfigError::Zero { layer: "convolution", field: "input depth" });
        }
        let filter_shape = Shape::new(kernel, kernel, input_shape.depth);
        let fan_in = filter_shape.len().max(1);
        let bank = (0..filters)
            .map(|_| {
                Tensor::from_data(filter_shape, init::he_normal(filter_shape.len(), fan_in, rng))
            })
            .collect();
        ConvLayer::from_filters(stride, input_shape, bank, vec![0.0; filters])
    }

    /// Builds a layer from explicit filters; all filters must share one
    /// `K×K×D` shape whose depth matches the input.
    pub fn from_filters(
        stride: usize,
        input_shape: Shape,
        filters: Vec<Tensor>,
        biases: Vec<f32>,
    ) -> Result<ConvLayer, ConfigError> {
        let Some(first) = filters.first() else {
            return Err(ConfigError::Zero { layer: "convolution", field: "filter count" });
        };
        let kernel = first.shape().width;
        let filter_shape = Shape::new(kernel, kernel, input_shape.depth);
        if let Some(bad) = filters.iter().find(|f| f.shape() != filter_shape) {
            return Err(ConfigError::ParameterCount {
                what: "convolution filter",
                expected: filter_shape.len(),
                found: bad.len(),
            });
        }
        if biases.len() != filters.len() {
            return Err(ConfigError::ParameterCount {
                what: "convolution biases",
                expected: filters.len(),
                found: biases.len(),
            });
        }

        let (out_w, out_h) = sliding_output("convolution", input_shape, kernel, stride)?;
        let output_shape = Shape::new(out_w, out_h, filters.len());

        Ok(ConvLayer {
            stride,
            kernel,
            filter_grads: vec![Tensor::zeros(filter_shape); filters.len()],
            bias_grads: vec![0.0; filters.len()],
            filters,
            biases,
            input: Tensor::zeros(input_shape),
            output: Tensor::zeros(output_shape),
            input_grads: Tensor::zeros(input_shape),
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn kernel(&self) -> usize {
        self.kernel
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

    /// Accumulated filter gradients since the last update.
    pub fn filter_grads(&self) -> &[Tensor] {
        &self.filter_grads
    }

    pub fn activate(&mut self, input: &Tensor) {
        assert_eq!(
            input.shape(),
            self.input.shape(),
            "convolution built for {} input, got {}",
            self.input.shape(),
            input.shape()
        );
        self.input.as_mut_slice().copy_from_slice(input.as_slice());

        let out_shape = self.output.shape();
        let depth = self.input.shape().depth;
        for (f, filter) in self.filters.iter().enumerate() {
            for oy in 0..out_shape.height {
                for ox in 0..out_shape.width {
                    let (x0, y0) = (ox * self.stride, oy * self.stride);
                    let mut sum = self.biases[f];
                    for z in 0..depth {
                        for j in 0..self.kernel {
                            for i in 0..self.kernel {
                                sum += self.input.get(x0 + i, y0 + j, z) * filter.get(i, j, z);
                            }
                        }
                    }
                    self.output.set(ox, oy, f, sum);
                }
            }
        }
    }

    pub fn backward(&mut self, grad_from_next: &Tensor) {
        let out_shape = self.output.shape();
        assert_eq!(
            grad_from_next.shape(),
            out_shape,
            "convolution produces {} output, got a {} gradient",
            out_shape,
            grad_from_next.shape()
        );
        self.input_grads.fill(0.0);

        let depth = self.input.shape().depth;
        for f in 0..self.filters.len() {
            for oy in 0..out_shape.height {
                for ox in 0..out_shape.width {
                    let g = grad_from_next.get(ox, oy, f);
                    if g == 0.0 {
                        continue;
                    }
                    self.bias_grads[f] += g;
                    let (x0, y0) = (ox * self.stride, oy * self.stride);
                    for z in 0..depth {
                        for j in 0..self.kernel {
                            for i in 0..self.kernel {
                                let (x, y) = (x0 + i, y0 + j);
                                self.filter_grads[f][(i, j, z)] += self.input.get(x, y, z) * g;
                                self.input_grads[(x, y, z)] += self.filters[f].get(i, j, z) * g;
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn apply_update(&mut self, optimizer: &Sgd) {
        for (filter, grad) in self.filters.iter_mut().zip(self.filter_grads.iter_mut()) {
            optimizer.step(filter.as_mut_slice(), grad.as_mut_slice());
        }
        optimizer.step(&mut self.biases, &mut self.bias_grads);
    }
}
