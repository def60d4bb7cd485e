//! Stillness heuristic: a printed photo or a paused screen barely moves.
//!
//! The face is "too still" when, across the whole window, both the
//! bounding-box center and the head pose stay within their thresholds.
//! Motion on either axis alone disqualifies.

use super::face_observation::FaceSnapshot;
use super::liveness_config::LivenessConfig;

/// Whether the tracked face has been implausibly motionless.
///
/// Returns `false` while evidence is insufficient: fewer than
/// `min_frames` entries, or a window spanning less than
/// `min_elapsed_ms` that is not yet full.
pub fn is_too_still(history: &[FaceSnapshot], config: &LivenessConfig) -> bool {
    if history.len() < config.min_frames {
        return false;
    }
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return false;
    };

    let span = last.timestamp.saturating_sub(first.timestamp);
    if span.as_millis() < config.min_elapsed_ms as u128 && history.len() < config.capacity {
        log::debug!(
            "History span {}ms too short for stillness check",
            span.as_millis()
        );
        return false;
    }

    let dx = range(history.iter().map(|s| s.center_x));
    let dy = range(history.iter().map(|s| s.center_y));
    let dyaw = range(history.iter().map(|s| s.head_yaw as f64));
    let droll = range(history.iter().map(|s| s.head_roll as f64));

    let still_position = dx < config.still_px && dy < config.still_px;
    let still_angle = dyaw < config.still_deg as f64 && droll < config.still_deg as f64;

    if still_position && still_angle {
        log::debug!(
            "Face too still: position delta ({dx:.1}, {dy:.1}), angle delta (yaw {dyaw:.2}, roll {droll:.2})"
        );
    }
    still_position && still_angle
}

/// `max - min` over the values; 0.0 for an empty iterator.
fn range(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        0.0
    } else {
        max - min
    }
}
