use crate::shared::frame::Frame;

use super::liveness_error::ClassifierError;

/// Domain interface for the neural spoof classifier.
///
/// Image in, spoof score out. Higher scores mean "more likely a
/// presentation attack". Inference needs `&mut self` (sessions hold
/// scratch buffers).
pub trait SpoofClassifier: Send {
    /// Square side length of the RGB crop the model accepts.
    fn input_size(&self) -> u32;

    fn spoof_score(&mut self, crop: &Frame) -> Result<f32, ClassifierError>;
}

/// Maps the classifier's score onto an advisory live/spoof vote.
///
/// Crops must already be `input_size × input_size` RGB; resizing is the
/// caller's job, so a mismatched crop is rejected rather than rescaled.
pub struct ClassifierAdapter {
    classifier: Box<dyn SpoofClassifier>,
    threshold: f32,
}

impl ClassifierAdapter {
    pub fn new(classifier: Box<dyn SpoofClassifier>, threshold: f32) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    pub fn input_size(&self) -> u32 {
        self.classifier.input_size()
    }

    /// `true` when the classifier believes the crop shows a live face.
    pub fn classify(&mut self, crop: &Frame) -> Result<bool, ClassifierError> {
        let expected = self.classifier.input_size();
        if crop.width() != expected || crop.height() != expected || crop.channels() != 3 {
            return Err(ClassifierError::InvalidCropSize {
                expected,
                width: crop.width(),
                height: crop.height(),
                channels: crop.channels(),
            });
        }

        let score = self.classifier.spoof_score(crop)?;
        let live = score < self.threshold;
        log::debug!("Spoof score {score:.4} (threshold {}) -> live: {live}", self.threshold);
        Ok(live)
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::fakes::FakeClassifier;
    use super::*;
    use rstest::rstest;

    fn crop(size: u32) -> Frame {
        Frame::new(
            vec![128u8; (size * size * 3) as usize],
            size,
            size,
            3,
            0,
            Duration::ZERO,
        )
    }

    #[rstest]
    #[case::clearly_live(0.05, true)]
    #[case::just_below(0.299, true)]
    #[case::at_threshold(0.3, false)]
    #[case::spoof(0.9, false)]
    fn test_score_maps_to_vote(#[case] score: f32, #[case] live: bool) {
        let mut adapter = ClassifierAdapter::new(Box::new(FakeClassifier::constant(8, score)), 0.3);
        assert_eq!(adapter.classify(&crop(8)).unwrap(), live);
    }

    #[test]
    fn test_wrong_size_is_rejected_not_resized() {
        let mut adapter = ClassifierAdapter::new(Box::new(FakeClassifier::constant(8, 0.0)), 0.3);
        let err = adapter.classify(&crop(4)).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::InvalidCropSize {
                expected: 8,
                width: 4,
                height: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_non_rgb_crop_is_rejected() {
        let mut adapter = ClassifierAdapter::new(Box::new(FakeClassifier::constant(2, 0.0)), 0.3);
        let gray = Frame::new(vec![0u8; 4], 2, 2, 1, 0, Duration::ZERO);
        assert!(adapter.classify(&gray).is_err());
    }

    #[test]
    fn test_inference_failure_propagates() {
        let fake = FakeClassifier::scripted(
            8,
            vec![Err(ClassifierError::Inference("backend unavailable".into()))],
        );
        let mut adapter = ClassifierAdapter::new(Box::new(fake), 0.3);
        assert!(matches!(
            adapter.classify(&crop(8)),
            Err(ClassifierError::Inference(_))
        ));
    }
}
