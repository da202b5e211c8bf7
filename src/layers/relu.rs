use crate::math::{Shape, Tensor};

/// Pointwise rectifier, `max(0, x)`. Holds no parameters.
#[derive(Debug, Clone)]
pub struct ReluLayer {
    input: Tensor,
    output: Tensor,
    input_grads: Tensor,
}

impl ReluLayer {
    pub fn new(shape: Shape) -> ReluLayer {
        ReluLayer {
            input: Tensor::zeros(shape),
            output: Tensor::zeros(shape),
            input_grads: Tensor::zeros(shape),
        }
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

    pub fn activate(&mut self, input: &Tensor) {
        assert_eq!(
            input.shape(),
            self.input.shape(),
            "rectifier built for {} input, got {}",
            self.input.shape(),
            input.shape()
        );
        self.input.as_mut_slice().copy_from_slice(input.as_slice());
        for (out, &x) in self.output.as_mut_slice().iter_mut().zip(input.as_slice()) {
            *out = if x > 0.0 { x } else { 0.0 };
        }
    }

    pub fn backward(&mut self, grad_from_next: &Tensor) {
        assert_eq!(
            grad_from_next.shape(),
            self.output.shape(),
            "rectifier produces {} output, got a {} gradient",
            self.output.shape(),
            grad_from_next.shape()
        );
        let cached = self.input.as_slice();
        for ((g_in, &g), &x) in self
            .input_grads
            .as_mut_slice()
            .iter_mut()
            .zip(grad_from_next.as_slice())
            .zip(cached)
        {
            *g_in = if x > 0.0 { g } else { 0.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_clamps_negatives() {
        let shape = Shape::new(3, 2, 1);
        let mut layer = ReluLayer::new(shape);
        layer.activate(&Tensor::from_data(shape, vec![-1.0, 0.0, 2.5, -0.1, 3.0, 1e-3]));
        assert_eq!(layer.output().as_slice(), &[0.0, 0.0, 2.5, 0.0, 3.0, 1e-3]);
    }

    #[test]
    fn backward_gates_on_cached_input() {
        let shape = Shape::new(2, 2, 1);
        let mut layer = ReluLayer::new(shape);
        layer.activate(&Tensor::from_data(shape, vec![1.0, -1.0, 0.0, 4.0]));
        layer.backward(&Tensor::from_data(shape, vec![0.5, 0.6, 0.7, -0.8]));
        assert_eq!(layer.input_grads().as_slice(), &[0.5, 0.0, 0.0, -0.8]);
    }

    #[test]
    #[should_panic(expected = "rectifier built for")]
    fn wrong_input_shape_panics() {
        let mut layer = ReluLayer::new(Shape::new(2, 2, 1));
        layer.activate(&Tensor::zeros(Shape::new(4, 1, 1)));
    }
}
