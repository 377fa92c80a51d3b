use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared per-session counters for cross-task pipeline monitoring.
///
/// All counters only ever increase. The drop/processed split never exceeds
/// the received count at any observation point; consumers that need a
/// consistent view take a [`MetricsSnapshot`].
#[derive(Clone)]
pub struct PipelineMetrics {
    // Video path
    pub video_frames_received: Arc<AtomicU64>,
    pub video_frames_processed: Arc<AtomicU64>,
    pub video_frames_dropped: Arc<AtomicU64>,
    pub detections_emitted: Arc<AtomicU64>,
    pub detector_errors: Arc<AtomicU64>,

    // Audio path
    pub audio_frames_received: Arc<AtomicU64>,
    pub stt_frames_dropped: Arc<AtomicU64>,
    pub emotion_frames_dropped: Arc<AtomicU64>,
    pub stt_chunks_fed: Arc<AtomicU64>,
    pub stt_finals_emitted: Arc<AtomicU64>,
    pub stt_stream_errors: Arc<AtomicU64>,
    pub stt_rotations: Arc<AtomicU64>,
    pub emotion_windows_processed: Arc<AtomicU64>,
    pub emotion_errors: Arc<AtomicU64>,

    // Emission path
    pub http_post_failures: Arc<AtomicU64>,
    pub channel_send_failures: Arc<AtomicU64>,

    pub last_activity: Arc<RwLock<Option<Instant>>>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            video_frames_received: Arc::new(AtomicU64::new(0)),
            video_frames_processed: Arc::new(AtomicU64::new(0)),
            video_frames_dropped: Arc::new(AtomicU64::new(0)),
            detections_emitted: Arc::new(AtomicU64::new(0)),
            detector_errors: Arc::new(AtomicU64::new(0)),

            audio_frames_received: Arc::new(AtomicU64::new(0)),
            stt_frames_dropped: Arc::new(AtomicU64::new(0)),
            emotion_frames_dropped: Arc::new(AtomicU64::new(0)),
            stt_chunks_fed: Arc::new(AtomicU64::new(0)),
            stt_finals_emitted: Arc::new(AtomicU64::new(0)),
            stt_stream_errors: Arc::new(AtomicU64::new(0)),
            stt_rotations: Arc::new(AtomicU64::new(0)),
            emotion_windows_processed: Arc::new(AtomicU64::new(0)),
            emotion_errors: Arc::new(AtomicU64::new(0)),

            http_post_failures: Arc::new(AtomicU64::new(0)),
            channel_send_failures: Arc::new(AtomicU64::new(0)),

            last_activity: Arc::new(RwLock::new(None)),
        }
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_video_received(&self) {
        self.video_frames_received.fetch_add(1, Ordering::Relaxed);
        self.mark_activity();
    }

    pub fn record_video_processed(&self) {
        self.video_frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_video_dropped(&self) {
        self.video_frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detections(&self, count: u64) {
        self.detections_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_detector_error(&self) {
        self.detector_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_audio_received(&self) {
        self.audio_frames_received.fetch_add(1, Ordering::Relaxed);
        self.mark_activity();
    }

    pub fn record_stt_frame_dropped(&self) {
        self.stt_frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emotion_frame_dropped(&self) {
        self.emotion_frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stt_chunk(&self) {
        self.stt_chunks_fed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stt_final(&self) {
        self.stt_finals_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stt_stream_error(&self) {
        self.stt_stream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stt_rotation(&self) {
        self.stt_rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emotion_window(&self) {
        self.emotion_windows_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emotion_error(&self) {
        self.emotion_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_failure(&self) {
        self.http_post_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_channel_failure(&self) {
        self.channel_send_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn mark_activity(&self) {
        *self.last_activity.write() = Some(Instant::now());
    }

    pub fn last_activity(&self) -> Option<Instant> {
        *self.last_activity.read()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            video_frames_received: self.video_frames_received.load(Ordering::Relaxed),
            video_frames_processed: self.video_frames_processed.load(Ordering::Relaxed),
            video_frames_dropped: self.video_frames_dropped.load(Ordering::Relaxed),
            detections_emitted: self.detections_emitted.load(Ordering::Relaxed),
            detector_errors: self.detector_errors.load(Ordering::Relaxed),
            audio_frames_received: self.audio_frames_received.load(Ordering::Relaxed),
            stt_frames_dropped: self.stt_frames_dropped.load(Ordering::Relaxed),
            emotion_frames_dropped: self.emotion_frames_dropped.load(Ordering::Relaxed),
            stt_chunks_fed: self.stt_chunks_fed.load(Ordering::Relaxed),
            stt_finals_emitted: self.stt_finals_emitted.load(Ordering::Relaxed),
            stt_stream_errors: self.stt_stream_errors.load(Ordering::Relaxed),
            stt_rotations: self.stt_rotations.load(Ordering::Relaxed),
            emotion_windows_processed: self.emotion_windows_processed.load(Ordering::Relaxed),
            emotion_errors: self.emotion_errors.load(Ordering::Relaxed),
            http_post_failures: self.http_post_failures.load(Ordering::Relaxed),
            channel_send_failures: self.channel_send_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub video_frames_received: u64,
    pub video_frames_processed: u64,
    pub video_frames_dropped: u64,
    pub detections_emitted: u64,
    pub detector_errors: u64,
    pub audio_frames_received: u64,
    pub stt_frames_dropped: u64,
    pub emotion_frames_dropped: u64,
    pub stt_chunks_fed: u64,
    pub stt_finals_emitted: u64,
    pub stt_stream_errors: u64,
    pub stt_rotations: u64,
    pub emotion_windows_processed: u64,
    pub emotion_errors: u64,
    pub http_post_failures: u64,
    pub channel_send_failures: u64,
}

/// Tracks the throughput of one stage, reporting events/sec roughly once
/// per second of elapsed time.
pub struct RateTracker {
    last_update: Instant,
    event_count: u64,
}

impl RateTracker {
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            event_count: 0,
        }
    }

    pub fn tick(&mut self) -> Option<f64> {
        self.event_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed >= Duration::from_secs(1) {
            let rate = self.event_count as f64 / elapsed.as_secs_f64();
            self.last_update = Instant::now();
            self.event_count = 0;
            Some(rate)
        } else {
            None
        }
    }
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = PipelineMetrics::new();
        metrics.record_video_received();
        metrics.record_video_received();
        metrics.record_video_dropped();
        metrics.record_video_processed();
        metrics.record_detections(3);

        let snap = metrics.snapshot();
        assert_eq!(snap.video_frames_received, 2);
        assert_eq!(snap.video_frames_dropped, 1);
        assert_eq!(snap.video_frames_processed, 1);
        assert_eq!(snap.detections_emitted, 3);
    }

    #[test]
    fn processed_plus_dropped_never_exceeds_received() {
        let metrics = PipelineMetrics::new();
        for i in 0..100u64 {
            metrics.record_video_received();
            if i % 3 == 0 {
                metrics.record_video_dropped();
            } else {
                metrics.record_video_processed();
            }
            let snap = metrics.snapshot();
            assert!(
                snap.video_frames_processed + snap.video_frames_dropped
                    <= snap.video_frames_received
            );
        }
    }

    #[test]
    fn clones_share_state() {
        let metrics = PipelineMetrics::new();
        let clone = metrics.clone();
        clone.record_audio_received();
        assert_eq!(metrics.snapshot().audio_frames_received, 1);
    }
}
