//! Video processor: freshest-frame consumption, FPS gating, off-loop
//! detection, one event per detected object.

use crate::detector::VideoDetector;
use crate::frame::VideoFrame;
use crate::sampler::FrameSampler;
use crate::slot::VideoFrameSlot;
use crate::types::DetectionEvent;
use argus_foundation::stop::StopToken;
use argus_telemetry::{PipelineMetrics, RateTracker};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct VideoProcessor {
    slot: Arc<VideoFrameSlot>,
    sampler: FrameSampler,
    detector: Arc<dyn VideoDetector>,
    event_tx: mpsc::Sender<DetectionEvent>,
    stop: StopToken,
    metrics: Option<Arc<PipelineMetrics>>,
    rate: RateTracker,
}

impl VideoProcessor {
    pub fn new(
        slot: Arc<VideoFrameSlot>,
        sampler: FrameSampler,
        detector: Arc<dyn VideoDetector>,
        event_tx: mpsc::Sender<DetectionEvent>,
        stop: StopToken,
    ) -> Self {
        Self {
            slot,
            sampler,
            detector,
            event_tx,
            stop,
            metrics: None,
            rate: RateTracker::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(mut self) {
        info!(target: "video", "Video processor started");

        loop {
            let frame = tokio::select! {
                _ = self.stop.stopped() => break,
                frame = self.slot.get() => match frame {
                    Some(frame) => frame,
                    None => {
                        debug!(target: "video", "Frame slot closed");
                        break;
                    }
                },
            };

            if !self.sampler.should_process() {
                debug!(target: "video", "Skipping frame {} (sampling rate)", frame.index);
                continue;
            }

            self.process_frame(frame).await;
        }

        info!(target: "video", "Video processor stopped");
    }

    async fn process_frame(&mut self, frame: VideoFrame) {
        let index = frame.index;
        if let Some(m) = &self.metrics {
            m.record_video_processed();
        }
        if let Some(rate) = self.rate.tick() {
            debug!(target: "video", "Processing rate: {:.1} fps", rate);
        }

        let detector = Arc::clone(&self.detector);
        let image = Arc::clone(&frame.image);
        let result = tokio::task::spawn_blocking(move || detector.detect(&image)).await;

        let detections = match result {
            Ok(Ok(detections)) => detections,
            Ok(Err(e)) => {
                warn!(target: "video", "Detector failed on frame {}: {}", index, e);
                if let Some(m) = &self.metrics {
                    m.record_detector_error();
                }
                return;
            }
            Err(e) => {
                warn!(target: "video", "Detector task join failed on frame {}: {}", index, e);
                if let Some(m) = &self.metrics {
                    m.record_detector_error();
                }
                return;
            }
        };

        let mut emitted = 0u64;
        for raw in detections {
            match raw.into_event(index) {
                Some(event) => {
                    if self.event_tx.send(event).await.is_err() {
                        debug!(target: "video", "Detection event channel closed");
                        return;
                    }
                    emitted += 1;
                }
                None => {
                    warn!(target: "video", "Skipping malformed detection on frame {}", index);
                }
            }
        }
        if emitted > 0 {
            if let Some(m) = &self.metrics {
                m.record_detections(emitted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::RawDetection;
    use crate::frame::BgrImage;
    use argus_foundation::clock::{Clock, TestClock};
    use argus_foundation::error::VideoError;
    use argus_foundation::stop::StopController;
    use std::time::Duration;

    struct OnePersonDetector;

    impl VideoDetector for OnePersonDetector {
        fn detect(&self, _image: &BgrImage) -> Result<Vec<RawDetection>, VideoError> {
            Ok(vec![RawDetection {
                label: "person".into(),
                confidence: 0.761,
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 40.0,
            }])
        }
    }

    struct FlakyDetector;

    impl VideoDetector for FlakyDetector {
        fn detect(&self, _image: &BgrImage) -> Result<Vec<RawDetection>, VideoError> {
            Err(VideoError::DetectorFailed("inference backend offline".into()))
        }
    }

    fn frame(index: u64) -> VideoFrame {
        VideoFrame::new(index, BgrImage::filled(4, 4, [9, 9, 9]))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sampled_frame_yields_rounded_event() {
        let slot = Arc::new(VideoFrameSlot::new());
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let stop = StopController::new();

        let processor = VideoProcessor::new(
            Arc::clone(&slot),
            FrameSampler::with_clock(3, Arc::new(TestClock::new())),
            Arc::new(OnePersonDetector),
            event_tx,
            stop.token(),
        );
        let handle = tokio::spawn(processor.run());

        slot.put(frame(1));
        let event = tokio::time::timeout(Duration::from_secs(2), event_rx.recv())
            .await
            .expect("detection event expected")
            .unwrap();
        assert_eq!(event.label, "person");
        assert_eq!(event.confidence, 0.76);
        assert_eq!(event.frame_index, 1);
        assert_eq!((event.x, event.y, event.width, event.height), (10.0, 20.0, 30.0, 40.0));

        slot.close();
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sampler_gates_throughput() {
        let slot = Arc::new(VideoFrameSlot::new());
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let stop = StopController::new();
        let clock = Arc::new(TestClock::new());

        let processor = VideoProcessor::new(
            Arc::clone(&slot),
            FrameSampler::with_clock(3, Arc::clone(&clock) as Arc<dyn Clock>),
            Arc::new(OnePersonDetector),
            event_tx,
            stop.token(),
        );
        let handle = tokio::spawn(processor.run());

        // 30 frames over a simulated second; the consumer keeps pace so
        // every frame reaches the sampler gate.
        for i in 1..=30u64 {
            slot.put(frame(i));
            clock.advance(Duration::from_millis(33));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        slot.close();
        handle.await.unwrap();

        let mut indices = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            indices.push(event.frame_index);
        }
        assert!(
            (3..=4).contains(&indices.len()),
            "expected 3..=4 sampled frames, got {:?}",
            indices
        );
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(indices.iter().all(|&i| (1..=30).contains(&i)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn detector_failure_does_not_stop_the_loop() {
        let slot = Arc::new(VideoFrameSlot::new());
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let stop = StopController::new();
        let clock = Arc::new(TestClock::new());

        let processor = VideoProcessor::new(
            Arc::clone(&slot),
            FrameSampler::with_clock(100, Arc::clone(&clock) as Arc<dyn Clock>),
            Arc::new(FlakyDetector),
            event_tx,
            stop.token(),
        );
        let handle = tokio::spawn(processor.run());

        for i in 1..=3u64 {
            slot.put(frame(i));
            clock.advance(Duration::from_millis(20));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(event_rx.try_recv().is_err());

        slot.close();
        // Loop survives failures and exits only on close.
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("processor should exit on close")
            .unwrap();
    }
}
