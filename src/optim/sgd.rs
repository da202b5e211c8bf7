/// Step size used when none is configured.
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;

/// Plain stochastic gradient descent with a fixed learning rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Sgd {
        Sgd { learning_rate }
    }

    /// Moves every parameter against its gradient, then zeroes the gradient
    /// so the next sample starts from a clean accumulator.
    pub fn step(&self, params: &mut [f32], grads: &mut [f32]) {
        assert_eq!(params.len(), grads.len(), "parameter and gradient buffers differ in length");
        for (p, g) in params.iter_mut().zip(grads.iter_mut()) {
            *p -= self.learning_rate * *g;
            *g = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_descends_and_resets() {
        let sgd = Sgd::new(0.5);
        let mut params = vec![1.0, -2.0, 0.0];
        let mut grads = vec![2.0, -4.0, 0.0];
        sgd.step(&mut params, &mut grads);
        assert_eq!(params, vec![0.0, 0.0, 0.0]);
        assert_eq!(grads, vec![0.0; 3]);
    }
}
