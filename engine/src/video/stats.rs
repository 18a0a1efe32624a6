//! Video playback statistics tracking
//!
//! Counts frames uploaded to the texture and completed loops, and combines
//! them with the delivery counters kept in the frame slot for periodic logs.

/// Tracks playback statistics for one engine instance
#[derive(Debug, Default)]
pub struct VideoStats {
    /// Frames copied into the texture
    pub(super) frames_uploaded: u64,

    /// End-of-stream events seen since the last reset
    pub(super) loops_completed: u64,

    /// Seconds accumulated since stats were last logged
    since_last_log: f32,
}

impl VideoStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_upload(&mut self) {
        self.frames_uploaded += 1;
    }

    pub fn record_loop(&mut self) {
        self.loops_completed += 1;
    }

    /// Percentage of decoded frames that were dropped
    pub fn drop_rate(delivered: u64, dropped: u64) -> f64 {
        let total = delivered + dropped;
        if total == 0 {
            0.0
        } else {
            (dropped as f64 / total as f64) * 100.0
        }
    }

    /// Log statistics once `interval` seconds of ticks have accumulated
    pub fn maybe_log_stats(&mut self, dt: f32, interval: f32, delivered: u64, dropped: u64) -> bool {
        self.since_last_log += dt.max(0.0);
        if self.since_last_log < interval {
            return false;
        }

        log::debug!(
            "Video stats: {} delivered, {} dropped ({:.1}% drop rate), {} uploaded, {} loops",
            delivered,
            dropped,
            Self::drop_rate(delivered, dropped),
            self.frames_uploaded,
            self.loops_completed
        );

        self.since_last_log = 0.0;
        true
    }

    /// Reset per-session counters
    pub fn reset(&mut self) {
        self.frames_uploaded = 0;
        self.loops_completed = 0;
        self.since_last_log = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_rate() {
        assert_eq!(VideoStats::drop_rate(0, 0), 0.0);
        assert_eq!(VideoStats::drop_rate(3, 1), 25.0);
    }

    #[test]
    fn test_logs_after_interval() {
        let mut stats = VideoStats::new();
        assert!(!stats.maybe_log_stats(1.0, 3.0, 0, 0));
        assert!(!stats.maybe_log_stats(1.5, 3.0, 0, 0));
        assert!(stats.maybe_log_stats(0.5, 3.0, 0, 0));
        assert!(!stats.maybe_log_stats(0.5, 3.0, 0, 0));
    }

    #[test]
    fn test_reset() {
        let mut stats = VideoStats::new();
        stats.record_upload();
        stats.record_loop();
        stats.reset();
        assert_eq!(stats.frames_uploaded, 0);
        assert_eq!(stats.loops_completed, 0);
    }
}
