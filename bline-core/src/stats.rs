//! Frame statistics.
//!
//! [`ThroughputMeter`] tracks datagram bytes over a rolling window and
//! derives bytes/second and frames/second. [`LedStrip`](crate::LedStrip)
//! feeds it on every flush.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

// ── FrameStats ───────────────────────────────────────────────────

/// Outcome of one successful flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Segments that received a datagram this frame.
    pub segments_sent: usize,
    /// Payload bytes handed to the transports.
    pub bytes_sent: usize,
    /// The frame buffer ended before the last segment's range.
    pub truncated: bool,
}

// ── ThroughputMeter ──────────────────────────────────────────────

/// Rolling-window throughput estimator.
#[derive(Debug)]
pub struct ThroughputMeter {
    /// Samples: `(when, bytes)`, one per frame.
    samples: VecDeque<(Instant, u64)>,
    window: Duration,
    /// Running total of bytes in the window.
    total_bytes: u64,
    /// Frames recorded since construction.
    frames: u64,
}

impl ThroughputMeter {
    /// Create a meter with a 1-second rolling window.
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            samples: VecDeque::with_capacity(128),
            window,
            total_bytes: 0,
            frames: 0,
        }
    }

    /// Record a frame of `bytes` sent now.
    pub fn record(&mut self, bytes: u64) {
        self.record_at(Instant::now(), bytes);
    }

    /// Record with an explicit timestamp (useful for testing).
    pub fn record_at(&mut self, when: Instant, bytes: u64) {
        self.samples.push_back((when, bytes));
        self.total_bytes += bytes;
        self.frames += 1;
        self.evict(when);
    }

    /// Bytes/second over the window.
    pub fn bytes_per_sec(&self) -> u64 {
        match self.span() {
            Some(secs) => (self.total_bytes as f64 / secs) as u64,
            None => 0,
        }
    }

    /// Frames/second over the window.
    pub fn frames_per_sec(&self) -> f64 {
        match self.span() {
            Some(secs) if self.samples.len() > 1 => (self.samples.len() - 1) as f64 / secs,
            _ => 0.0,
        }
    }

    /// Frames recorded since construction.
    pub fn total_frames(&self) -> u64 {
        self.frames
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Seconds between first and last sample, at least 1 ms.
    fn span(&self) -> Option<f64> {
        let (first, _) = self.samples.front()?;
        let (last, _) = self.samples.back()?;
        let d = last.duration_since(*first).max(Duration::from_millis(1));
        Some(d.as_secs_f64())
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&(ts, bytes)) = self.samples.front() {
            if now.duration_since(ts) > self.window {
                self.samples.pop_front();
                self.total_bytes = self.total_bytes.saturating_sub(bytes);
            } else {
                break;
            }
        }
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_meter_returns_zero() {
        let meter = ThroughputMeter::new();
        assert_eq!(meter.bytes_per_sec(), 0);
        assert_eq!(meter.frames_per_sec(), 0.0);
    }

    #[test]
    fn steady_frames() {
        let mut meter = ThroughputMeter::with_window(Duration::from_secs(5));
        let t0 = Instant::now();
        for i in 0..=60 {
            meter.record_at(t0 + Duration::from_millis(i * 1000 / 60), 900);
        }
        let fps = meter.frames_per_sec();
        assert!((59.0..=61.0).contains(&fps), "fps = {fps}");
        let bps = meter.bytes_per_sec();
        // 61 frames of 900 bytes over one second.
        assert!((54_000..=56_000).contains(&bps), "bps = {bps}");
        assert_eq!(meter.total_frames(), 61);
    }

    #[test]
    fn evicts_old_samples() {
        let mut meter = ThroughputMeter::with_window(Duration::from_millis(500));
        let t0 = Instant::now();
        meter.record_at(t0, 1000);
        meter.record_at(t0 + Duration::from_secs(1), 500);
        assert_eq!(meter.sample_count(), 1);
        assert_eq!(meter.total_frames(), 2);
    }
}
