use std::time::Duration;

use crate::detection::domain::face_detector::DetectedFace;

/// Pose and eye state of one face in one frame, as kept in the history buffer.
///
/// Holds no pixel data: crops go to the classifier and are never retained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceSnapshot {
    pub timestamp: Duration,
    pub center_x: f64,
    pub center_y: f64,
    pub head_yaw: f32,
    pub head_roll: f32,
    pub left_eye_open_prob: Option<f32>,
    pub right_eye_open_prob: Option<f32>,
}

/// Normalised per-frame record of the selected face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceObservation {
    pub track_id: Option<u32>,
    pub snapshot: FaceSnapshot,
}

impl FaceObservation {
    pub fn from_detection(face: &DetectedFace, timestamp: Duration) -> Self {
        let (center_x, center_y) = face.bbox.center();
        Self {
            track_id: face.track_id,
            snapshot: FaceSnapshot {
                timestamp,
                center_x,
                center_y,
                head_yaw: face.head_yaw,
                head_roll: face.head_roll,
                left_eye_open_prob: face.left_eye_open_prob,
                right_eye_open_prob: face.right_eye_open_prob,
            },
        }
    }

    /// Checks the fields the heuristics rely on.
    ///
    /// A failure indicates a detector integration bug, not a spoof.
    pub fn validate(&self) -> Result<(), String> {
        let s = &self.snapshot;
        if !s.center_x.is_finite() || !s.center_y.is_finite() {
            return Err(format!("non-finite center ({}, {})", s.center_x, s.center_y));
        }
        if !s.head_yaw.is_finite() || !s.head_roll.is_finite() {
            return Err(format!(
                "non-finite head pose (yaw {}, roll {})",
                s.head_yaw, s.head_roll
            ));
        }
        for (eye, prob) in [
            ("left", s.left_eye_open_prob),
            ("right", s.right_eye_open_prob),
        ] {
            if let Some(p) = prob {
                if !(0.0..=1.0).contains(&p) {
                    return Err(format!("{eye} eye open probability {p} outside [0, 1]"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_box::FaceBox;
    use approx::assert_relative_eq;

    fn detected(yaw: f32, left: Option<f32>) -> DetectedFace {
        DetectedFace {
            bbox: FaceBox::new(197, 237, 107, 107),
            track_id: Some(11),
            head_yaw: yaw,
            head_roll: 3.16,
            left_eye_open_prob: left,
            right_eye_open_prob: Some(0.999),
        }
    }

    #[test]
    fn test_extracts_center_pose_and_eyes() {
        let obs = FaceObservation::from_detection(
            &detected(3.5, Some(1.0)),
            Duration::from_millis(1200),
        );
        assert_eq!(obs.track_id, Some(11));
        assert_eq!(obs.snapshot.timestamp, Duration::from_millis(1200));
        assert_relative_eq!(obs.snapshot.center_x, 250.5);
        assert_relative_eq!(obs.snapshot.center_y, 290.5);
        assert_relative_eq!(obs.snapshot.head_yaw, 3.5);
        assert_relative_eq!(obs.snapshot.head_roll, 3.16);
        assert_eq!(obs.snapshot.left_eye_open_prob, Some(1.0));
    }

    #[test]
    fn test_missing_eye_probabilities_are_valid() {
        let obs = FaceObservation::from_detection(&detected(0.0, None), Duration::ZERO);
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_eye_probability_is_invalid() {
        let obs = FaceObservation::from_detection(&detected(0.0, Some(1.2)), Duration::ZERO);
        let err = obs.validate().unwrap_err();
        assert!(err.contains("left eye"));
    }

    #[test]
    fn test_nan_pose_is_invalid() {
        let obs = FaceObservation::from_detection(&detected(f32::NAN, None), Duration::ZERO);
        assert!(obs.validate().is_err());
    }
}
