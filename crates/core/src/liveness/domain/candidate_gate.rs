//! Debounced "capture now" notifier.
//!
//! At most one [`CaptureEvent`] fires per continuously live, continuously
//! tracked identity. The debounce state is a plain value with pure
//! transitions; [`CandidateGate`] just owns one per session.

use std::time::Duration;

use crate::shared::frame::Frame;

/// Face crop handed to the capture collaborator.
#[derive(Debug)]
pub struct CaptureEvent {
    pub track_id: u32,
    pub timestamp: Duration,
    /// Normalized RGB crop that was classified on the reporting frame.
    pub crop: Frame,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CandidateReportState {
    pub reported: bool,
    pub last_reported_track_id: Option<u32>,
}

impl CandidateReportState {
    /// Whether a live-and-ready face with `track_id` should fire.
    pub fn should_report(self, track_id: u32) -> bool {
        !(self.reported && self.last_reported_track_id == Some(track_id))
    }

    pub fn reported_for(track_id: u32) -> Self {
        Self {
            reported: true,
            last_reported_track_id: Some(track_id),
        }
    }

    /// Transition after a frame in which `track_id` had the given final
    /// verdict. Losing liveness on the reported identity re-arms the gate.
    pub fn after_frame(self, track_id: Option<u32>, live: bool) -> Self {
        match (self.last_reported_track_id, track_id) {
            (Some(reported), Some(current)) if reported == current && !live => Self::default(),
            (Some(reported), Some(current)) if reported != current => Self::default(),
            (Some(_), None) => Self::default(),
            _ => self,
        }
    }
}

#[derive(Default)]
pub struct CandidateGate {
    state: CandidateReportState,
}

impl CandidateGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget any prior report (face lost or unusable).
    pub fn reset(&mut self) {
        if self.state.reported {
            log::debug!(
                "Candidate report state reset (was track {:?})",
                self.state.last_reported_track_id
            );
        }
        self.state = CandidateReportState::default();
    }

    /// Feed the final verdict for the tracked face of this frame.
    pub fn observe_frame(&mut self, track_id: Option<u32>, live: bool) {
        let next = self.state.after_frame(track_id, live);
        if next != self.state {
            log::debug!(
                "Tracked face {:?} no longer live-reported, gate re-armed",
                self.state.last_reported_track_id
            );
        }
        self.state = next;
    }

    /// Emit a capture event unless this identity already fired.
    ///
    /// `crop` is consumed either way; on a suppressed report it is dropped.
    pub fn maybe_report(
        &mut self,
        track_id: u32,
        live_and_ready: bool,
        timestamp: Duration,
        crop: Frame,
    ) -> Option<CaptureEvent> {
        if !live_and_ready || !self.state.should_report(track_id) {
            return None;
        }
        log::info!("Live face confirmed for track {track_id}, requesting capture");
        self.state = CandidateReportState::reported_for(track_id);
        Some(CaptureEvent {
            track_id,
            timestamp,
            crop,
        })
    }
}
