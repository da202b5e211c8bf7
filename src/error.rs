use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::math::tensor::Shape;

/// Invalid layer geometry, detected before any computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{layer}: window {window}×{window} does not fit a {input} input")]
    WindowTooLarge { layer: &'static str, window: usize, input: Shape },

    #[error("{layer}: {field} must be at least 1")]
    Zero { layer: &'static str, field: &'static str },

    #[error(
        "{layer}: a {window}-wide window with stride {stride} does not tile \
         a {input} input exactly"
    )]
    MisalignedStride { layer: &'static str, window: usize, stride: usize, input: Shape },

    #[error("layer {index} expects a {expected} input but the previous stage produces {found}")]
    ShapeMismatch { index: usize, expected: Shape, found: Shape },

    #[error("{what}: expected {expected} values, got {found}")]
    ParameterCount { what: &'static str, expected: usize, found: usize },

    #[error("a network needs at least one layer")]
    EmptyNetwork,
}

/// Malformed IDX archives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("{file} is too short: need {needed} bytes, found {found}")]
    Truncated { file: &'static str, needed: usize, found: usize },

    #[error("{file} has magic number {found:#010x}, expected {expected:#010x}")]
    BadMagic { file: &'static str, expected: u32, found: u32 },

    #[error("image archive holds {images} items but label archive holds {labels}")]
    CountMismatch { images: usize, labels: usize },

    #[error("label {index} is class {class}, out of range for {classes} classes")]
    LabelOutOfRange { index: usize, class: usize, classes: usize },

    #[error("archive holds no samples")]
    Empty,

    #[error("image archive declares {count} images of {rows}×{cols}, more bytes than can be addressed")]
    TooLarge { count: usize, rows: usize, cols: usize },

    #[error("image archive holds {found} images but the network expects {expected}")]
    Dimensions { expected: Shape, found: Shape },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("failed to decode sample image: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// True when the error is an I/O failure because the file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reads a whole file, attaching the path to any failure.
pub(crate) fn read_file(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}
