//! Fuses the classifier vote with the temporal heuristics.
//!
//! Override policy, applied only when the classifier says live and the
//! history holds at least `min_frames` entries:
//!
//! | blinked | too still | verdict |
//! |---------|-----------|---------|
//! | yes     | any       | live    |
//! | no      | yes       | spoof (override) |
//! | no      | no        | live    |
//!
//! A spoof vote from the classifier is final.

use super::blink::has_blinked_recently;
use super::face_observation::FaceSnapshot;
use super::liveness_config::LivenessConfig;
use super::stillness::is_too_still;

/// Per-frame liveness decision. Recomputed every frame, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LivenessVerdict {
    /// Final fused decision for this frame.
    pub is_live_frame: bool,
    /// Raw classifier vote.
    pub classifier_live: bool,
    /// Heuristic votes; only evaluated with sufficient history.
    pub too_still: bool,
    pub has_blinked: bool,
    pub sufficient_history: bool,
}

impl LivenessVerdict {
    /// Verdict for a face that could not be evaluated (no usable crop or
    /// malformed detector output).
    pub fn not_evaluated() -> Self {
        Self::default()
    }

    /// Live with enough history behind it to trigger a capture.
    pub fn is_capture_ready(&self) -> bool {
        self.is_live_frame && self.sufficient_history
    }
}

pub fn arbitrate(
    classifier_live: bool,
    history: &[FaceSnapshot],
    config: &LivenessConfig,
) -> LivenessVerdict {
    let sufficient_history = history.len() >= config.min_frames;

    if !classifier_live {
        return LivenessVerdict {
            is_live_frame: false,
            classifier_live,
            too_still: false,
            has_blinked: false,
            sufficient_history,
        };
    }

    if !sufficient_history {
        log::debug!(
            "Not enough history for dynamic checks ({}/{}), trusting classifier",
            history.len(),
            config.min_frames
        );
        return LivenessVerdict {
            is_live_frame: true,
            classifier_live,
            too_still: false,
            has_blinked: false,
            sufficient_history,
        };
    }

    let too_still = is_too_still(history, config);
    let has_blinked = has_blinked_recently(history, config);
    let is_live_frame = has_blinked || !too_still;

    if !is_live_frame {
        log::warn!("Spoof override: classifier said live but face is too still and never blinked");
    }

    LivenessVerdict {
        is_live_frame,
        classifier_live,
        too_still,
        has_blinked,
        sufficient_history,
    }
}
