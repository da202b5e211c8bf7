//! Reader for the IDX archives MNIST ships in.
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-3:   0x00000803  (magic: uint8 data, 3 dimensions)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (big-endian u32)
//! bytes 12-15:  cols        (big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-3:   0x00000801  (magic: uint8 data, 1 dimension)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```

use std::path::Path;

use log::info;

use crate::data::Case;
use crate::error::{read_file, DatasetError, Result};
use crate::math::{Shape, Tensor};

const IMAGE_MAGIC: u32 = 0x0000_0803;
const LABEL_MAGIC: u32 = 0x0000_0801;
const IMAGE_HEADER: usize = 16;
const LABEL_HEADER: usize = 8;

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn require_len(file: &'static str, bytes: &[u8], needed: usize) -> std::result::Result<(), DatasetError> {
    if bytes.len() < needed {
        return Err(DatasetError::Truncated { file, needed, found: bytes.len() });
    }
    Ok(())
}

/// Parses an image/label archive pair into training cases.
///
/// Image `i` becomes a `cols × rows × 1` tensor with pixel `(x, y)` taken
/// from byte `x + y·cols` and divided by 255; that shape must equal `input`.
/// Label `i` becomes a one-hot `n_classes × 1 × 1` tensor. At most `limit`
/// cases are produced.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    input: Shape,
    n_classes: usize,
    limit: Option<usize>,
) -> std::result::Result<Vec<Case>, DatasetError> {
    require_len("image archive", image_bytes, IMAGE_HEADER)?;
    let magic = be_u32(image_bytes, 0);
    if magic != IMAGE_MAGIC {
        return Err(DatasetError::BadMagic { file: "image archive", expected: IMAGE_MAGIC, found: magic });
    }
    let images = be_u32(image_bytes, 4) as usize;
    let rows = be_u32(image_bytes, 8) as usize;
    let cols = be_u32(image_bytes, 12) as usize;

    require_len("label archive", label_bytes, LABEL_HEADER)?;
    let magic = be_u32(label_bytes, 0);
    if magic != LABEL_MAGIC {
        return Err(DatasetError::BadMagic { file: "label archive", expected: LABEL_MAGIC, found: magic });
    }
    let labels = be_u32(label_bytes, 4) as usize;
    if labels != images {
        return Err(DatasetError::CountMismatch { images, labels });
    }

    let count = limit.map_or(images, |l| l.min(images));
    if count == 0 || rows == 0 || cols == 0 {
        return Err(DatasetError::Empty);
    }

    let (pixels, image_end) = rows
        .checked_mul(cols)
        .and_then(|pixels| Some((pixels, count.checked_mul(pixels)?.checked_add(IMAGE_HEADER)?)))
        .ok_or(DatasetError::TooLarge { count, rows, cols })?;

    let input_shape = Shape::new(cols, rows, 1);
    if input_shape != input {
        return Err(DatasetError::Dimensions { expected: input, found: input_shape });
    }

    require_len("image archive", image_bytes, image_end)?;
    require_len("label archive", label_bytes, LABEL_HEADER + count)?;

    let target_shape = Shape::new(n_classes, 1, 1);
    let image_data = &image_bytes[IMAGE_HEADER..image_end];
    let label_data = &label_bytes[LABEL_HEADER..LABEL_HEADER + count];

    image_data
        .chunks_exact(pixels)
        .zip(label_data)
        .enumerate()
        .map(|(index, (img, &label))| {
            let class = label as usize;
            if class >= n_classes {
                return Err(DatasetError::LabelOutOfRange { index, class, classes: n_classes });
            }
            let input = Tensor::from_data(input_shape, img.iter().map(|&p| p as f32 / 255.0).collect());
            let mut target = Tensor::zeros(target_shape);
            target.set(class, 0, 0, 1.0);
            Ok(Case { input, target })
        })
        .collect()
}

/// Reads and parses an image/label archive pair from disk.
pub fn load_idx_pair(
    images: &Path,
    labels: &Path,
    input: Shape,
    n_classes: usize,
    limit: Option<usize>,
) -> Result<Vec<Case>> {
    let image_bytes = read_file(images)?;
    let label_bytes = read_file(labels)?;
    let cases = parse_idx_pair(&image_bytes, &label_bytes, input, n_classes, limit)?;
    info!("loaded {} cases from {}", cases.len(), images.display());
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: Shape = Shape::new(1, 1, 1);

    /// Builds an IDX pair of `labels.len()` images, each filled with its index.
    fn archives(rows: u32, cols: u32, labels: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let n = labels.len() as u32;
        let mut images = Vec::new();
        for v in [IMAGE_MAGIC, n, rows, cols] {
            images.extend_from_slice(&v.to_be_bytes());
        }
        for i in 0..labels.len() {
            images.extend(std::iter::repeat(i as u8).take((rows * cols) as usize));
        }
        let mut label_file = Vec::new();
        for v in [LABEL_MAGIC, n] {
            label_file.extend_from_slice(&v.to_be_bytes());
        }
        label_file.extend_from_slice(labels);
        (images, label_file)
    }

    #[test]
    fn parses_images_and_one_hot_labels() {
        let (mut images, labels) = archives(2, 3, &[3, 0]);
        // Second image: a gradient so the row-major layout is observable.
        let second = IMAGE_HEADER + 6;
        images[second..second + 6].copy_from_slice(&[0, 51, 102, 153, 204, 255]);

        let cases = parse_idx_pair(&images, &labels, Shape::new(3, 2, 1), 10, None).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].input.shape(), Shape::new(3, 2, 1));
        assert_eq!(cases[0].target.argmax(), 3);
        assert_eq!(cases[0].target.as_slice().iter().sum::<f32>(), 1.0);

        let img = &cases[1].input;
        assert_eq!(img.get(0, 0, 0), 0.0);
        assert_eq!(img.get(1, 0, 0), 0.2);
        assert_eq!(img.get(0, 1, 0), 0.6);
        assert_eq!(img.get(2, 1, 0), 1.0);
    }

    #[test]
    fn limit_truncates() {
        let (images, labels) = archives(1, 1, &[1, 2, 3, 4]);
        let cases = parse_idx_pair(&images, &labels, PIXEL, 10, Some(2)).unwrap();
        assert_eq!(cases.len(), 2);
    }

    #[test]
    fn rejects_wrong_magic() {
        let (mut images, labels) = archives(1, 1, &[1]);
        images[3] = 0x01;
        assert_eq!(
            parse_idx_pair(&images, &labels, PIXEL, 10, None).unwrap_err(),
            DatasetError::BadMagic { file: "image archive", expected: IMAGE_MAGIC, found: 0x0801 }
        );
    }

    #[test]
    fn rejects_truncated_pixels() {
        let (images, labels) = archives(2, 2, &[1, 2]);
        let truncated = &images[..images.len() - 1];
        let err = parse_idx_pair(truncated, &labels, Shape::new(2, 2, 1), 10, None).unwrap_err();
        assert!(matches!(err, DatasetError::Truncated { file: "image archive", .. }));
    }

    #[test]
    fn rejects_count_mismatch() {
        let (images, _) = archives(1, 1, &[1, 2]);
        let (_, labels) = archives(1, 1, &[1]);
        assert_eq!(
            parse_idx_pair(&images, &labels, PIXEL, 10, None).unwrap_err(),
            DatasetError::CountMismatch { images: 2, labels: 1 }
        );
    }

    #[test]
    fn rejects_label_out_of_range() {
        let (images, labels) = archives(1, 1, &[1, 12]);
        assert_eq!(
            parse_idx_pair(&images, &labels, PIXEL, 10, None).unwrap_err(),
            DatasetError::LabelOutOfRange { index: 1, class: 12, classes: 10 }
        );
    }

    #[test]
    fn rejects_header_sizes_that_overflow() {
        let (mut images, labels) = archives(1, 1, &[1, 2]);
        images[8..12].copy_from_slice(&u32::MAX.to_be_bytes());
        images[12..16].copy_from_slice(&u32::MAX.to_be_bytes());
        let max = u32::MAX as usize;
        assert_eq!(
            parse_idx_pair(&images, &labels, Shape::new(28, 28, 1), 10, None).unwrap_err(),
            DatasetError::TooLarge { count: 2, rows: max, cols: max }
        );
    }

    #[test]
    fn rejects_images_of_another_size() {
        let (images, labels) = archives(14, 14, &[3]);
        assert_eq!(
            parse_idx_pair(&images, &labels, Shape::new(28, 28, 1), 10, None).unwrap_err(),
            DatasetError::Dimensions { expected: Shape::new(28, 28, 1), found: Shape::new(14, 14, 1) }
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_idx_pair(
            Path::new("/nonexistent/train-images.idx3-ubyte"),
            Path::new("/nonexistent/train-labels.idx1-ubyte"),
            Shape::new(28, 28, 1),
            10,
            None,
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
