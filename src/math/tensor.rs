use std::fmt;
use std::ops::{Index, IndexMut, Sub};

use rand::prelude::*;
use serde::Serialize;

/// Dimensions of a [`Tensor`]: `width × height × depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Shape {
    pub const fn new(width: usize, height: usize, depth: usize) -> Shape {
        Shape { width, height, depth }
    }

    /// Total number of elements.
    pub const fn len(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat offset of `(x, y, z)`: `x + y·width + z·width·height`.
    ///
    /// Panics if any coordinate lies outside the shape.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        assert!(
            x < self.width && y < self.height && z < self.depth,
            "coordinate ({}, {}, {}) out of bounds for {}",
            x, y, z, self
        );
        x + y * self.width + z * self.width * self.height
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}×{}", self.width, self.height, self.depth)
    }
}

/// Dense 3-axis buffer of `f32` with a fixed shape and mutable contents.
///
/// The backing vector always holds exactly `shape.len()` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    pub fn zeros(shape: Shape) -> Tensor {
        Tensor { shape, data: vec![0.0; shape.len()] }
    }

    /// Uniform samples in `[-1, 1)`.
    pub fn random(shape: Shape) -> Tensor {
        Tensor::random_with(shape, &mut rand::thread_rng())
    }

    pub fn random_with<R: Rng>(shape: Shape, rng: &mut R) -> Tensor {
        let data = (0..shape.len()).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
        Tensor { shape, data }
    }

    /// Wraps `data`, laid out as `x + y·width + z·width·height`.
    ///
    /// Panics if `data.len()` differs from `shape.len()`.
    pub fn from_data(shape: Shape, data: Vec<f32>) -> Tensor {
        assert_eq!(
            data.len(),
            shape.len(),
            "{} values cannot fill a {} tensor",
            data.len(),
            shape
        );
        Tensor { shape, data }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.shape.index(x, y, z)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> &mut f32 {
        let i = self.shape.index(x, y, z);
        &mut self.data[i]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) {
        *self.get_mut(x, y, z) = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f32) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// Elementwise `self - other`. Both tensors must share a shape.
    pub fn subtract(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.shape, other.shape,
            "cannot subtract a {} tensor from a {} tensor",
            other.shape, self.shape
        );
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect();
        Tensor { shape: self.shape, data }
    }

    /// Flat index of the largest element (first one on ties).
    pub fn argmax(&self) -> usize {
        self.data
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }
}

impl Index<(usize, usize, usize)> for Tensor {
    type Output = f32;

    fn index(&self, (x, y, z): (usize, usize, usize)) -> &f32 {
        &self.data[self.shape.index(x, y, z)]
    }
}

impl IndexMut<(usize, usize, usize)> for Tensor {
    fn index_mut(&mut self, (x, y, z): (usize, usize, usize)) -> &mut f32 {
        self.get_mut(x, y, z)
    }
}

impl Sub for Tensor {
    type Output = Tensor;

    fn sub(self, rhs: Self) -> Self::Output {
        self.subtract(&rhs)
    }
}

impl<'a> Sub<&'a Tensor> for &'a Tensor {
    type Output = Tensor;

    fn sub(self, rhs: &'a Tensor) -> Self::Output {
        self.subtract(rhs)
    }
}
