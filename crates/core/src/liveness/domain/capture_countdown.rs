use std::time::Duration;

use super::liveness_config::LivenessConfig;

/// What one [`CaptureCountdown::advance`] call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// No countdown is running.
    Idle,
    /// Running, still on the last announced tick.
    Waiting,
    /// A new tick began. `remaining` counts down from the configured ticks to 1.
    Tick { remaining: u32 },
    /// The tracked face was lost or is no longer live. The countdown is over.
    Cancelled { track_id: u32 },
    /// Every tick passed with the tracked face still live: capture now.
    Elapsed { track_id: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Running {
    track_id: u32,
    started_at: Duration,
    last_announced: Option<u32>,
}

/// Delay between a capture request and the capture itself.
///
/// Driven by frame timestamps, not wall time, so replays behave like live
/// cameras. The face that requested the capture must stay present and live
/// on every frame until the last tick, or the countdown is cancelled.
#[derive(Debug, Clone)]
pub struct CaptureCountdown {
    ticks: u32,
    tick_interval: Duration,
    running: Option<Running>,
}

impl CaptureCountdown {
    pub fn new(ticks: u32, tick_interval: Duration) -> Self {
        Self {
            ticks,
            tick_interval,
            running: None,
        }
    }

    pub fn from_config(config: &LivenessConfig) -> Self {
        Self::new(
            config.countdown_ticks,
            Duration::from_millis(config.countdown_tick_ms),
        )
    }

    /// Start counting down for `track_id`. Ignored while a countdown runs.
    pub fn start(&mut self, track_id: u32, now: Duration) -> bool {
        if let Some(running) = self.running {
            log::debug!(
                "Capture countdown for track {} already running, ignoring track {track_id}",
                running.track_id
            );
            return false;
        }
        log::debug!("Capture countdown started for track {track_id}");
        self.running = Some(Running {
            track_id,
            started_at: now,
            last_announced: None,
        });
        true
    }

    pub fn tracked_id(&self) -> Option<u32> {
        self.running.map(|r| r.track_id)
    }

    /// Move the countdown to `now`.
    ///
    /// `is_tracked_live` is asked about the tracked id on every call,
    /// including the final one, so `Elapsed` means the face was live at
    /// the moment of capture.
    pub fn advance(
        &mut self,
        now: Duration,
        is_tracked_live: impl FnOnce(u32) -> bool,
    ) -> CountdownStep {
        let Some(mut running) = self.running else {
            return CountdownStep::Idle;
        };
        let track_id = running.track_id;

        if !is_tracked_live(track_id) {
            log::info!("Capture countdown cancelled: track {track_id} lost or not live");
            self.running = None;
            return CountdownStep::Cancelled { track_id };
        }

        let elapsed = now.saturating_sub(running.started_at);
        let total = self
            .tick_interval
            .checked_mul(self.ticks)
            .unwrap_or(Duration::MAX);
        if elapsed >= total {
            self.running = None;
            return CountdownStep::Elapsed { track_id };
        }

        // elapsed < ticks * interval, so the interval is non-zero here.
        let passed = (elapsed.as_nanos() / self.tick_interval.as_nanos()) as u32;
        let remaining = self.ticks - passed;
        if running.last_announced == Some(remaining) {
            return CountdownStep::Waiting;
        }
        running.last_announced = Some(remaining);
        self.running = Some(running);
        CountdownStep::Tick { remaining }
    }
}
