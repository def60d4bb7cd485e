use serde::{Deserialize, Serialize};

use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// One face as reported by the upstream face detector.
///
/// Landmark and contour data the detector may also produce are not carried;
/// the liveness engine only consumes geometry, head pose and eye openness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub bbox: FaceBox,
    /// Stable identity across frames, or `None` when the detector lost track.
    pub track_id: Option<u32>,
    /// Head yaw in degrees.
    pub head_yaw: f32,
    /// Head roll in degrees.
    pub head_roll: f32,
    pub left_eye_open_prob: Option<f32>,
    pub right_eye_open_prob: Option<f32>,
}

/// Domain interface for face detection.
///
/// Implementations may be stateful (e.g., tracking across frames),
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}

/// Picks the face with the largest bounding-box area.
///
/// Ties keep the earliest face in detector order.
pub fn select_largest(faces: &[DetectedFace]) -> Option<&DetectedFace> {
    faces.iter().fold(None, |best: Option<&DetectedFace>, face| match best {
        Some(b) if b.bbox.area() >= face.bbox.area() => Some(b),
        _ => Some(face),
    })
}
