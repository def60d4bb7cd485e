//! Blink heuristic: an involuntary closed → open eye transition.

use super::face_observation::FaceSnapshot;
use super::liveness_config::LivenessConfig;

/// Whether the window contains both eyes closed followed later by both
/// eyes open.
///
/// A missing eye probability is read as fully open, so absent data can
/// never fabricate a blink. Returns `false` with fewer than `min_frames`
/// entries.
pub fn has_blinked_recently(history: &[FaceSnapshot], config: &LivenessConfig) -> bool {
    if history.len() < config.min_frames {
        return false;
    }

    let mut found_closed = false;
    let mut found_open_after_closed = false;

    for s in history {
        let left = s.left_eye_open_prob.unwrap_or(1.0);
        let right = s.right_eye_open_prob.unwrap_or(1.0);

        if left < config.blink_closed && right < config.blink_closed {
            found_closed = true;
        }
        if found_closed && left > config.blink_open && right > config.blink_open {
            found_open_after_closed = true;
        }
    }

    log::debug!(
        "Blink check: closed {found_closed}, open after closed {found_open_after_closed}"
    );
    found_closed && found_open_after_closed
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use rstest::rstest;

    fn history(eyes: &[(Option<f32>, Option<f32>)]) -> Vec<FaceSnapshot> {
        eyes.iter()
            .enumerate()
            .map(|(i, &(l, r))| FaceSnapshot {
                timestamp: Duration::from_millis(i as u64 * 33),
                center_x: 100.0,
                center_y: 100.0,
                head_yaw: 0.0,
                head_roll: 0.0,
                left_eye_open_prob: l,
                right_eye_open_prob: r,
            })
            .collect()
    }

    fn both(probs: &[f32]) -> Vec<FaceSnapshot> {
        let eyes: Vec<_> = probs.iter().map(|&p| (Some(p), Some(p))).collect();
        history(&eyes)
    }

    #[test]
    fn test_closed_then_open_is_blink() {
        let cfg = LivenessConfig::default();
        let h = both(&[1.0, 1.0, 1.0, 0.3, 0.3, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(has_blinked_recently(&h, &cfg));
    }

    #[test]
    fn test_always_open_is_not_blink() {
        let cfg = LivenessConfig::default();
        assert!(!has_blinked_recently(&both(&[1.0; 12]), &cfg));
    }

    #[test]
    fn test_closed_at_end_without_reopen_is_not_blink() {
        let cfg = LivenessConfig::default();
        let h = both(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.1, 0.1]);
        assert!(!has_blinked_recently(&h, &cfg));
    }

    #[test]
    fn test_open_before_closed_does_not_count() {
        let cfg = LivenessConfig::default();
        // Opens only before the closure; after it the eyes stay half-open.
        let h = both(&[1.0, 1.0, 1.0, 1.0, 1.0, 0.2, 0.6, 0.6, 0.6, 0.6, 0.6, 0.6]);
        assert!(!has_blinked_recently(&h, &cfg));
    }

    #[test]
    fn test_one_eye_closed_is_not_blink() {
        let cfg = LivenessConfig::default();
        let mut eyes = vec![(Some(1.0), Some(1.0)); 12];
        eyes[4] = (Some(0.1), Some(0.9));
        assert!(!has_blinked_recently(&history(&eyes), &cfg));
    }

    #[test]
    fn test_missing_probabilities_never_blink() {
        let cfg = LivenessConfig::default();
        assert!(!has_blinked_recently(&history(&[(None, None); 12]), &cfg));
    }

    #[test]
    fn test_missing_probability_reads_as_open_after_closure() {
        let cfg = LivenessConfig::default();
        let mut eyes = vec![(Some(1.0), Some(1.0)); 12];
        eyes[3] = (Some(0.1), Some(0.1));
        eyes[4] = (None, None);
        for e in eyes.iter_mut().skip(5) {
            *e = (Some(0.6), Some(0.6));
        }
        assert!(has_blinked_recently(&history(&eyes), &cfg));
    }

    #[rstest]
    #[case::at_closed_threshold(0.5, false)]
    #[case::just_below_closed(0.49, true)]
    fn test_closed_threshold_is_strict(#[case] closed: f32, #[case] expected: bool) {
        let cfg = LivenessConfig::default();
        let mut probs = [1.0f32; 12];
        probs[5] = closed;
        assert_eq!(has_blinked_recently(&both(&probs), &cfg), expected);
    }

    #[rstest]
    #[case::at_open_threshold(0.7, false)]
    #[case::just_above_open(0.71, true)]
    fn test_open_threshold_is_strict(#[case] open: f32, #[case] expected: bool) {
        let cfg = LivenessConfig::default();
        let mut probs = [open; 12];
        probs[2] = 0.1;
        assert_eq!(has_blinked_recently(&both(&probs), &cfg), expected);
    }

    #[test]
    fn test_short_history_is_never_blink() {
        let cfg = LivenessConfig::default();
        let h = both(&[1.0, 0.1, 1.0, 1.0, 1.0]);
        assert!(!has_blinked_recently(&h, &cfg));
    }
}
