use crate::channel::DataChannel;
use crate::events::SessionSummary;
use argus_foundation::clock::monotonic_to_epoch;
use argus_telemetry::PipelineMetrics;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One client's live stream: identity, monotonic/wall-clock anchors,
/// counters, and the optionally attached data channel.
///
/// Mutated only by the pipeline owning it; destroyed exactly once when the
/// transport signals termination.
pub struct Session {
    correlation_id: String,
    started: Instant,
    started_epoch: DateTime<Utc>,
    ended: Mutex<Option<Instant>>,
    channel: Mutex<Option<Arc<dyn DataChannel>>>,
    metrics: Arc<PipelineMetrics>,
}

impl Session {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        let correlation_id = correlation_id.into();
        info!("Session created: {}", correlation_id);
        Self {
            correlation_id,
            started: Instant::now(),
            started_epoch: Utc::now(),
            ended: Mutex::new(None),
            channel: Mutex::new(None),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn started_epoch(&self) -> DateTime<Utc> {
        self.started_epoch
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Convert a monotonic instant within this session to wall-clock time.
    pub fn to_epoch(&self, at: Instant) -> DateTime<Utc> {
        monotonic_to_epoch(self.started_epoch, self.started, at)
    }

    /// Attach the bidirectional channel. Called at most once by contract;
    /// a second attachment replaces the first with a warning.
    pub fn attach_channel(&self, channel: Arc<dyn DataChannel>) {
        let mut slot = self.channel.lock();
        if slot.is_some() {
            warn!(
                "[{}] Data channel re-attached, replacing previous",
                self.correlation_id
            );
        }
        *slot = Some(channel);
    }

    /// Capture the channel reference. Callers test `is_open()` before
    /// sending.
    pub fn channel(&self) -> Option<Arc<dyn DataChannel>> {
        self.channel.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.ended.lock().is_some()
    }

    /// Idle when no frame has arrived within `timeout`. A session that
    /// never received a frame ages from its start.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        let last = self.metrics.last_activity().unwrap_or(self.started);
        last.elapsed() > timeout
    }

    pub fn duration(&self) -> Duration {
        let end = self.ended.lock().unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.started)
    }

    /// Mark the session ended (first call wins) and close the attached
    /// channel. Returns the track-end summary either way.
    pub fn close(&self) -> SessionSummary {
        let mut ended = self.ended.lock();
        if ended.is_none() {
            *ended = Some(Instant::now());
            if let Some(channel) = self.channel.lock().as_ref() {
                channel.close();
            }
            info!("Session closed: {}", self.correlation_id);
        }
        drop(ended);
        self.summary()
    }

    /// Track-end accounting over the video path, matching the
    /// `stream_closed` contract.
    pub fn summary(&self) -> SessionSummary {
        let snap = self.metrics.snapshot();
        SessionSummary {
            total_frames_received: snap.video_frames_received,
            total_frames_processed: snap.video_frames_processed,
            total_frames_dropped: snap.video_frames_dropped,
            total_detections: snap.detections_emitted,
            duration_sec: (self.duration().as_secs_f64() * 100.0).round() / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_foundation::error::EmitError;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlagChannel {
        closed: AtomicBool,
    }

    impl DataChannel for FlagChannel {
        fn label(&self) -> &str {
            "detections"
        }
        fn is_open(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }
        fn send(&self, _text: &str) -> Result<(), EmitError> {
            Ok(())
        }
        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn close_is_idempotent_and_closes_channel() {
        let session = Session::new("abc-123");
        let channel = Arc::new(FlagChannel {
            closed: AtomicBool::new(false),
        });
        session.attach_channel(channel.clone());

        let first = session.close();
        assert!(session.is_closed());
        assert!(!channel.is_open());

        let second = session.close();
        assert_eq!(first.total_frames_received, second.total_frames_received);
    }

    #[test]
    fn summary_reflects_counters() {
        let session = Session::new("abc-123");
        let metrics = session.metrics();
        metrics.record_video_received();
        metrics.record_video_received();
        metrics.record_video_processed();
        metrics.record_video_dropped();
        metrics.record_detections(5);

        let summary = session.summary();
        assert_eq!(summary.total_frames_received, 2);
        assert_eq!(summary.total_frames_processed, 1);
        assert_eq!(summary.total_frames_dropped, 1);
        assert_eq!(summary.total_detections, 5);
    }

    #[test]
    fn idle_tracks_last_activity() {
        let session = Session::new("abc-123");
        assert!(!session.is_idle(Duration::from_secs(30)));
        assert!(session.is_idle(Duration::ZERO));
        session.metrics().record_audio_received();
        assert!(!session.is_idle(Duration::from_secs(30)));
    }
}
