use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::data;
use crate::error::Result;
use crate::math::Tensor;
use crate::network::Network;

/// Network response for one class: raw output scaled by 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub class: usize,
    pub confidence: f32,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:.6}", self.class, self.confidence)
    }
}

/// One prediction per output element, in class order.
pub fn predictions(output: &Tensor) -> Vec<Prediction> {
    output
        .as_slice()
        .iter()
        .enumerate()
        .map(|(class, &v)| Prediction { class, confidence: v * 100.0 })
        .collect()
}

/// Loads the sample at `path`, sized to the network's input, and classifies it.
pub fn classify_file(network: &mut Network, path: &Path) -> Result<Vec<Prediction>> {
    let shape = network.input_shape();
    let sample = data::load_sample(path, shape.width as u32, shape.height as u32)?;
    Ok(predictions(&network.infer(&sample)))
}

/// Renders predictions the way the driver prints them: one `[i] value` line
/// each, or a single JSON array.
pub fn render(predictions: &[Prediction], json: bool) -> String {
    if json {
        return match serde_json::to_string(predictions) {
            Ok(line) => line + "\n",
            Err(e) => format!("{{\"error\":\"{e}\"}}\n"),
        };
    }
    predictions.iter().map(|p| format!("{p}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Shape;

    #[test]
    fn predictions_scale_outputs() {
        let out = Tensor::from_data(Shape::new(3, 1, 1), vec![0.5, -0.25, 1.0]);
        let preds = predictions(&out);
        assert_eq!(preds.len(), 3);
        assert_eq!(preds[0], Prediction { class: 0, confidence: 50.0 });
        assert_eq!(preds[1].confidence, -25.0);
    }

    #[test]
    fn render_text_and_json() {
        let preds = [Prediction { class: 0, confidence: 12.5 }, Prediction { class: 1, confidence: 0.0 }];
        assert_eq!(render(&preds, false), "[0] 12.500000\n[1] 0.000000\n");

        let json: serde_json::Value = serde_json::from_str(&render(&preds, true)).unwrap();
        assert_eq!(json[0]["class"], 0);
        assert_eq!(json[0]["confidence"], 12.5);
    }
}
