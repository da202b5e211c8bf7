use rand::Rng;
use std::f32::consts::PI;

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng>(rng: &mut R) -> f32 {
    // Both draws lie in (0, 1] so ln() never sees zero.
    let u1: f32 = 1.0 - rng.gen::<f32>();
    let u2: f32 = 1.0 - rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// He initialization: `len` samples from N(0, sqrt(2 / fan_in)).
///
/// Used for the convolution filters, which feed a rectifier.
pub fn he_normal<R: Rng>(len: usize, fan_in: usize, rng: &mut R) -> Vec<f32> {
    let std_dev = (2.0 / fan_in as f32).sqrt();
    (0..len).map(|_| sample_standard_normal(rng) * std_dev).collect()
}

/// Xavier (Glorot) initialization: `len` samples from N(0, sqrt(1 / fan_in)).
///
/// Used for the fully connected output layer, which has no nonlinearity.
pub fn xavier_normal<R: Rng>(len: usize, fan_in: usize, rng: &mut R) -> Vec<f32> {
    let std_dev = (1.0 / fan_in as f32).sqrt();
    (0..len).map(|_| sample_standard_normal(rng) * std_dev).collect()
}
