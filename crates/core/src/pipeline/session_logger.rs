use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting observer for liveness-session events.
///
/// Keeps the session free of any particular output mechanism: the CLI
/// prints a summary, embedders and tests pass [`NullSessionLogger`].
pub trait SessionLogger: Send {
    /// One frame went through the engine.
    fn frame_processed(&mut self, frame_index: usize);

    /// How long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time metric (face count, history length, ...).
    fn metric(&mut self, name: &str, value: f64);

    /// End-of-session summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame_processed(&mut self, _frame_index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
}

/// Running count, sum and max of one timing or metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RunningStat {
    count: usize,
    sum: f64,
    max: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.max = if self.count == 0 { value } else { self.max.max(value) };
        self.count += 1;
        self.sum += value;
    }

    fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Aggregates per-stage timings and metrics and logs progress every
/// `throttle_frames` frames. Memory stays bounded by the number of names.
pub struct StdoutSessionLogger {
    throttle_frames: usize,
    timings: HashMap<String, RunningStat>,
    metrics: HashMap<String, RunningStat>,
    start_time: Instant,
    frames: usize,
}

impl StdoutSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Formatted report, or `None` before any frame was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Liveness session summary ({} frames, {elapsed_s:.1}s):",
            self.frames
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stat) in stages {
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  max {:6.1}ms",
                stat.avg(),
                stat.max
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, stat) in metrics {
            lines.push(format!("  {name}: avg {:.1}  max {:.1}", stat.avg(), stat.max));
        }

        if elapsed_s > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames as f64 / elapsed_s
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame_processed(&mut self, frame_index: usize) {
        self.frames += 1;
        if self.frames % self.throttle_frames == 0 {
            log::info!("Processed {} frames (last index {frame_index})", self.frames);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        record(&mut self.timings, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        record(&mut self.metrics, name, value);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn record(stats: &mut HashMap<String, RunningStat>, name: &str, value: f64) {
    match stats.get_mut(name) {
        Some(stat) => stat.record(value),
        None => {
            let mut stat = RunningStat::default();
            stat.record(value);
            stats.insert(name.to_string(), stat);
        }
    }
}
