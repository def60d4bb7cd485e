use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::detection::domain::face_detector::DetectedFace;
use crate::liveness::domain::candidate_gate::CaptureEvent;
use crate::pipeline::liveness_session::{FaceVerdict, LivenessSession};
use crate::shared::frame::Frame;

/// Results published by the worker, in frame order.
#[derive(Debug)]
pub enum SessionEvent {
    Verdicts {
        frame_index: usize,
        verdicts: Vec<FaceVerdict>,
    },
    Capture(CaptureEvent),
    /// Classifier failure. The worker stops processing after sending it.
    Error(String),
}

type Job = (Frame, Vec<DetectedFace>);

/// Runs a [`LivenessSession`] on a dedicated thread behind a one-slot
/// mailbox.
///
/// Layout: `camera → [slot] → worker [session] → events`
///
/// The camera thread never blocks: if the previous frame is still waiting
/// when a new one arrives, the waiting frame is discarded and replaced.
pub struct LatestFrameWorker {
    job_tx: Sender<Job>,
    // Second handle on the slot so the producer can evict a stale frame.
    job_drain: Receiver<Job>,
    handle: JoinHandle<LivenessSession>,
    dropped: usize,
}

impl LatestFrameWorker {
    pub fn spawn(session: LivenessSession) -> (Self, Receiver<SessionEvent>) {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(1);
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<SessionEvent>();
        let job_drain = job_rx.clone();
        let handle = spawn_session(session, job_rx, event_tx);
        (
            Self {
                job_tx,
                job_drain,
                handle,
                dropped: 0,
            },
            event_rx,
        )
    }

    /// Hand a frame to the worker without blocking.
    ///
    /// Returns `false` once the worker has stopped (after a fatal error).
    /// A frame accepted just before the worker fails goes down with it.
    pub fn submit(&mut self, frame: Frame, faces: Vec<DetectedFace>) -> bool {
        let accepted = match self.job_tx.try_send((frame, faces)) {
            Ok(()) => true,
            Err(TrySendError::Disconnected(_)) => false,
            Err(TrySendError::Full(job)) => {
                if let Ok((stale, _)) = self.job_drain.try_recv() {
                    self.dropped += 1;
                    log::debug!("Dropped pending frame {} for a newer one", stale.index());
                }
                // Only this producer fills the slot, so it is empty now.
                self.job_tx.try_send(job).is_ok()
            }
        };

        // `job_drain` keeps the slot connected after the worker exits,
        // so a stopped worker is only visible through its handle.
        if accepted && self.handle.is_finished() {
            let _ = self.job_drain.try_recv();
            return false;
        }
        accepted
    }

    /// Frames replaced before the worker got to them.
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }

    /// Finish the pending frame, join the worker and release the session.
    pub fn stop(self) {
        let Self {
            job_tx,
            job_drain,
            handle,
            dropped,
        } = self;
        drop(job_tx);
        drop(job_drain);

        match handle.join() {
            Ok(session) => {
                log::info!("Liveness worker stopped ({dropped} frames dropped)");
                session.stop();
            }
            Err(_) => log::error!("Liveness worker thread panicked"),
        }
    }
}

fn spawn_session(
    mut session: LivenessSession,
    job_rx: Receiver<Job>,
    event_tx: Sender<SessionEvent>,
) -> JoinHandle<LivenessSession> {
    std::thread::spawn(move || {
        for (frame, faces) in job_rx {
            match session.process_frame(&frame, &faces) {
                Ok(outcome) => {
                    let verdicts = SessionEvent::Verdicts {
                        frame_index: frame.index(),
                        verdicts: outcome.verdicts,
                    };
                    if event_tx.send(verdicts).is_err() {
                        break;
                    }
                    if let Some(capture) = outcome.capture {
                        if event_tx.send(SessionEvent::Capture(capture)).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    log::error!("Liveness session failed on frame {}: {e}", frame.index());
                    let _ = event_tx.send(SessionEvent::Error(e.to_string()));
                    break;
                }
            }
        }
        session
    })
}
