use std::path::PathBuf;

use thiserror::Error;

/// Failures of the spoof classifier. All of them end the camera session:
/// the engine never guesses a verdict when the model cannot run.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("failed to load classifier model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    #[error("classifier inference failed: {0}")]
    Inference(String),
    #[error("crop must be {expected}x{expected} RGB, got {width}x{height} with {channels} channels")]
    InvalidCropSize {
        expected: u32,
        width: u32,
        height: u32,
        channels: u8,
    },
    #[error("classifier produced no score (output shape {0:?})")]
    UnexpectedOutput(Vec<usize>),
}

/// Errors surfaced by a liveness session on its error channel,
/// separate from per-frame verdicts.
#[derive(Error, Debug)]
pub enum LivenessError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("face detection failed: {0}")]
    Detector(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_crop_message_names_dimensions() {
        let err = ClassifierError::InvalidCropSize {
            expected: 224,
            width: 160,
            height: 160,
            channels: 3,
        };
        assert_eq!(
            err.to_string(),
            "crop must be 224x224 RGB, got 160x160 with 3 channels"
        );
    }

    #[test]
    fn test_classifier_error_converts_transparently() {
        let err: LivenessError = ClassifierError::Inference("backend unavailable".into()).into();
        assert!(matches!(err, LivenessError::Classifier(_)));
        assert_eq!(
            err.to_string(),
            "classifier inference failed: backend unavailable"
        );
    }
}
