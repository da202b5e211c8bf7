use crate::error::ConfigError;
use crate::layers::sliding_output;
use crate::math::{Shape, Tensor};

/// Max pooling over square windows, channel by channel.
///
/// Every forward pass remembers where each window's maximum came from so the
/// backward pass can route gradients to exactly those input positions.
#[derive(Debug, Clone)]
pub struct PoolLayer {
    stride: usize,
    size: usize,
    input: Tensor,
    output: Tensor,
    input_grads: Tensor,
    /// Flat input index of the max, one per output element.
    max_positions: Vec<usize>,
}

impl PoolLayer {
    pub fn new(stride: usize, size: usize, input_shape: Shape) -> Result<PoolLayer, ConfigError> {
        if input_shape.depth == 0 {
            return Err(ConfigError::Zero { layer: "pooling", field: "input depth" });
        }
        let (out_w, out_h) = sliding_output("pooling", input_shape, size, stride)?;
        let output_shape = Shape::new(out_w, out_h, input_shape.depth);
        Ok(PoolLayer {
            stride,
            size,
            input: Tensor::zeros(input_shape),
            output: Tensor::zeros(output_shape),
            input_grads: Tensor::zeros(input_shape),
            max_positions: vec![0; output_shape.len()],
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn size(&self) -> usize {
        self.size
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

    /// Flat input indices recorded by the last forward pass.
    pub fn max_positions(&self) -> &[usize] {
        &self.max_positions
    }

    pub fn activate(&mut self, input: &Tensor) {
        let in_shape = self.input.shape();
        assert_eq!(
            input.shape(),
            in_shape,
            "pooling built for {} input, got {}",
            in_shape,
            input.shape()
        );
        self.input.as_mut_slice().copy_from_slice(input.as_slice());

        let out_shape = self.output.shape();
        for z in 0..out_shape.depth {
            for oy in 0..out_shape.height {
                for ox in 0..out_shape.width {
                    let (x0, y0) = (ox * self.stride, oy * self.stride);
                    let mut best = in_shape.index(x0, y0, z);
                    for j in 0..self.size {
                        for i in 0..self.size {
                            let idx = in_shape.index(x0 + i, y0 + j, z);
                            if input.as_slice()[idx] > input.as_slice()[best] {
                                best = idx;
                            }
                        }
                    }
                    let out_idx = out_shape.index(ox, oy, z);
                    self.max_positions[out_idx] = best;
                    self.output.as_mut_slice()[out_idx] = input.as_slice()[best];
                }
            }
        }
    }

    pub fn backward(&mut self, grad_from_next: &Tensor) {
        assert_eq!(
            grad_from_next.shape(),
            self.output.shape(),
            "pooling produces {} output, got a {} gradient",
            self.output.shape(),
            grad_from_next.shape()
        );
        self.input_grads.fill(0.0);
        let grads = self.input_grads.as_mut_slice();
        for (&pos, &g) in self.max_positions.iter().zip(grad_from_next.as_slice()) {
            grads[pos] += g;
        }
    }
}
