use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::face_detector::{DetectedFace, FaceDetector};
use crate::shared::frame::Frame;

/// Replays recorded detector output by frame index.
///
/// Lets a session be driven from a capture recorded on-device, with the
/// same track IDs and eye probabilities the live detector produced.
pub struct ReplayFaceDetector {
    recording: Arc<HashMap<usize, Vec<DetectedFace>>>,
}

impl ReplayFaceDetector {
    pub fn new(recording: Arc<HashMap<usize, Vec<DetectedFace>>>) -> Self {
        Self { recording }
    }

    /// Load a recording stored as a JSON object keyed by frame index:
    /// `{"0": [face, ...], "1": [...]}`.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        let recording: HashMap<usize, Vec<DetectedFace>> = serde_json::from_str(&json)?;
        log::info!(
            "Loaded detections for {} frames from {}",
            recording.len(),
            path.display()
        );
        Ok(Self::new(Arc::new(recording)))
    }
}

impl FaceDetector for ReplayFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        Ok(self
            .recording
            .get(&frame.index())
            .cloned()
            .unwrap_or_default())
    }
}
