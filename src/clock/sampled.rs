use crate::foundation::core::{Fps, FrameIndex};

/// Deterministic frame times `t_k = k / fps` for `k = 0 .. total_frames`.
///
/// Never reads the wall clock, so two passes over the same clock yield identical times.
#[derive(Clone, Debug)]
pub struct SampledClock {
    fps: Fps,
    total_frames: u64,
    next: u64,
}

impl SampledClock {
    /// Sample `total_frames` instants at `fps`.
    pub fn new(fps: Fps, total_frames: u64) -> Self {
        Self {
            fps,
            total_frames,
            next: 0,
        }
    }

    /// Number of instants this clock yields in total.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Time of frame `idx` in seconds.
    pub fn time_of(&self, idx: FrameIndex) -> f64 {
        self.fps.frame_time_secs(idx)
    }
}

impl Iterator for SampledClock {
    type Item = (FrameIndex, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total_frames {
            return None;
        }
        let idx = FrameIndex(self.next);
        self.next += 1;
        Some((idx, self.time_of(idx)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.total_frames - self.next).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}
