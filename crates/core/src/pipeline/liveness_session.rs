use std::time::Instant;

use crate::detection::domain::face_detector::{select_largest, DetectedFace};
use crate::liveness::domain::arbitration::{arbitrate, LivenessVerdict};
use crate::liveness::domain::candidate_gate::{CandidateGate, CaptureEvent};
use crate::liveness::domain::face_observation::FaceObservation;
use crate::liveness::domain::history_buffer::HistoryBuffer;
use crate::liveness::domain::liveness_config::LivenessConfig;
use crate::liveness::domain::liveness_error::LivenessError;
use crate::liveness::domain::spoof_classifier::{ClassifierAdapter, SpoofClassifier};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

use super::face_crop::{self, CropSkip};
use super::session_logger::SessionLogger;

/// Verdict for one face of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceVerdict {
    pub track_id: Option<u32>,
    pub bbox: FaceBox,
    pub verdict: LivenessVerdict,
}

/// Everything the engine has to say about one frame.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    /// Empty when no face was found. Only the largest face is evaluated.
    pub verdicts: Vec<FaceVerdict>,
    pub capture: Option<CaptureEvent>,
}

/// One camera session's liveness engine.
///
/// Owns the classifier, the history of the tracked face and the capture
/// gate. Not shareable: frames must arrive as one serialized stream.
pub struct LivenessSession {
    config: LivenessConfig,
    classifier: ClassifierAdapter,
    history: HistoryBuffer,
    gate: CandidateGate,
    logger: Box<dyn SessionLogger>,
    last_verdict: Option<(Option<u32>, LivenessVerdict)>,
}

impl LivenessSession {
    pub fn new(
        config: LivenessConfig,
        classifier: Box<dyn SpoofClassifier>,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        if classifier.input_size() != config.classifier_input_size {
            log::warn!(
                "Classifier expects {0}x{0} crops, config says {1}x{1}; using the classifier's size",
                classifier.input_size(),
                config.classifier_input_size
            );
        }
        let classifier = ClassifierAdapter::new(classifier, config.threshold);
        let history = HistoryBuffer::new(config.capacity);
        Self {
            config,
            classifier,
            history,
            gate: CandidateGate::new(),
            logger,
            last_verdict: None,
        }
    }

    /// Run the engine on one frame and the faces detected in it.
    ///
    /// Only classifier failures are errors. Missing faces, unusable boxes
    /// and track loss reset state and yield a quiet outcome.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        faces: &[DetectedFace],
    ) -> Result<FrameOutcome, LivenessError> {
        let frame_start = Instant::now();
        self.logger.metric("faces", faces.len() as f64);

        let Some(face) = select_largest(faces) else {
            self.gate.reset();
            self.last_verdict = None;
            self.logger.frame_processed(frame.index());
            return Ok(FrameOutcome::default());
        };

        let observation = FaceObservation::from_detection(face, frame.timestamp());
        if let Err(reason) = observation.validate() {
            debug_assert!(false, "malformed face observation: {reason}");
            log::error!("Malformed face observation in frame {}: {reason}", frame.index());
            return Ok(self.not_evaluated(frame, face));
        }

        let crop_start = Instant::now();
        let crop = match face_crop::normalize(frame, &face.bbox, self.classifier.input_size()) {
            Ok(crop) => crop,
            Err(CropSkip::DegenerateBox) => {
                log::warn!("Degenerate face box {:?} in frame {}", face.bbox, frame.index());
                return Ok(self.not_evaluated(frame, face));
            }
            // Already reported by the crop step.
            Err(CropSkip::InvalidInput) => return Ok(self.not_evaluated(frame, face)),
        };
        self.logger
            .timing("crop", crop_start.elapsed().as_secs_f64() * 1000.0);

        let classify_start = Instant::now();
        let classifier_live = self.classifier.classify(&crop)?;
        self.logger
            .timing("classify", classify_start.elapsed().as_secs_f64() * 1000.0);

        let history = self.history.update(observation.track_id, observation.snapshot);
        let verdict = arbitrate(classifier_live, history, &self.config);
        self.logger.metric("history_len", self.history.len() as f64);
        self.logger
            .metric("live", if verdict.is_live_frame { 1.0 } else { 0.0 });

        self.gate.observe_frame(observation.track_id, verdict.is_live_frame);
        let capture = observation.track_id.and_then(|tid| {
            self.gate
                .maybe_report(tid, verdict.is_capture_ready(), frame.timestamp(), crop)
        });

        self.last_verdict = Some((observation.track_id, verdict));
        self.logger
            .timing("frame", frame_start.elapsed().as_secs_f64() * 1000.0);
        self.logger.frame_processed(frame.index());

        Ok(FrameOutcome {
            verdicts: vec![FaceVerdict {
                track_id: observation.track_id,
                bbox: face.bbox,
                verdict,
            }],
            capture,
        })
    }

    /// Re-check before committing a capture: is `track_id` live right now?
    pub fn confirm_capture(&self, track_id: u32) -> bool {
        matches!(
            self.last_verdict,
            Some((Some(tid), verdict)) if tid == track_id && verdict.is_live_frame
        )
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// End the session, releasing the classifier model and all state.
    pub fn stop(self) {
        self.logger.summary();
        log::info!(
            "Liveness session stopped ({} history entries discarded)",
            self.history.len()
        );
    }

    fn not_evaluated(&mut self, frame: &Frame, face: &DetectedFace) -> FrameOutcome {
        let verdict = LivenessVerdict::not_evaluated();
        self.gate.reset();
        self.last_verdict = Some((face.track_id, verdict));
        self.logger.frame_processed(frame.index());
        FrameOutcome {
            verdicts: vec![FaceVerdict {
                track_id: face.track_id,
                bbox: face.bbox,
                verdict,
            }],
            capture: None,
        }
    }
}
