use std::collections::VecDeque;

use super::face_observation::FaceSnapshot;

/// Fixed-capacity sliding window of snapshots for a single tracked face.
///
/// Invariant: every entry belongs to `current_track_id`. An observation
/// for a different (or absent) track clears the window first.
pub struct HistoryBuffer {
    capacity: usize,
    entries: VecDeque<FaceSnapshot>,
    current_track_id: Option<u32>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "history capacity must be positive");
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            current_track_id: None,
        }
    }

    /// Record one observation and return the window, oldest first.
    ///
    /// Without a track ID nothing is trusted: the window is emptied and
    /// the snapshot is not stored.
    pub fn update(&mut self, track_id: Option<u32>, snapshot: FaceSnapshot) -> &[FaceSnapshot] {
        let Some(tid) = track_id else {
            if !self.entries.is_empty() {
                log::debug!("No track ID for current face, history cleared");
            }
            self.clear();
            return self.entries.make_contiguous();
        };

        if self.current_track_id != Some(tid) {
            if !self.entries.is_empty() {
                log::debug!(
                    "New face tracked (ID {tid}), history cleared for {:?}",
                    self.current_track_id
                );
            }
            self.entries.clear();
            self.current_track_id = Some(tid);
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
        self.entries.make_contiguous()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.current_track_id = None;
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
