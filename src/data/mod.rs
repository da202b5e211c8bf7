pub mod idx;
pub mod image;

pub use self::idx::{load_idx_pair, parse_idx_pair};
pub use self::image::{image_bytes_to_tensor, load_sample};

use crate::math::Tensor;

/// One training sample: a normalized image and its one-hot target.
#[derive(Debug, Clone)]
pub struct Case {
    pub input: Tensor,
    pub target: Tensor,
}
