/// Binary spoof classifier using ONNX Runtime via `ort`.
///
/// The model takes one NHWC float tensor `[1, S, S, 3]` with RGB values
/// scaled to `[0, 1]` and emits a single spoof score (`[1, 1]`).
use std::path::Path;

use ndarray::{Array4, Axis};

use crate::liveness::domain::liveness_error::ClassifierError;
use crate::liveness::domain::spoof_classifier::SpoofClassifier;
use crate::shared::frame::Frame;

use super::execution_provider::classifier_execution_providers;

pub struct OnnxSpoofClassifier {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxSpoofClassifier {
    /// Load the model and read its square input size (NHWC: `[1, S, S, 3]`).
    ///
    /// Falls back to `fallback_input_size` when the shape is dynamic.
    pub fn new(model_path: &Path, fallback_input_size: u32) -> Result<Self, ClassifierError> {
        let session = build_session(model_path).map_err(|e| ClassifierError::ModelLoad {
            path: model_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() == 4 && shape[1] > 0 => {
                    Some(shape[1] as u32)
                }
                _ => None,
            })
            .unwrap_or(fallback_input_size);

        log::info!(
            "Loaded spoof classifier {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            input_size,
        })
    }
}

impl SpoofClassifier for OnnxSpoofClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn spoof_score(&mut self, crop: &Frame) -> Result<f32, ClassifierError> {
        let tensor = to_input_tensor(crop);
        let input = ort::value::Tensor::from_array(tensor)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(ClassifierError::UnexpectedOutput(vec![]));
        }

        let scores = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        scores
            .iter()
            .next()
            .copied()
            .ok_or_else(|| ClassifierError::UnexpectedOutput(scores.shape().to_vec()))
    }
}

fn build_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let session = ort::session::Session::builder()?
        .with_execution_providers(classifier_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// HWC `u8` crop → `[1, H, W, 3]` `f32` in `[0, 1]`.
fn to_input_tensor(crop: &Frame) -> Array4<f32> {
    crop.as_ndarray()
        .mapv(|v| v as f32 / 255.0)
        .insert_axis(Axis(0))
}
