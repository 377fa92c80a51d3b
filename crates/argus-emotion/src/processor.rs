//! Windowed speech-emotion processor.
//!
//! Collects roughly one window's worth of audio at a time, renders it to a
//! temporary WAV on the blocking pool, classifies it, and emits one
//! [`EmotionEvent`] per window. Windows never overlap; a sparse stream
//! simply yields fewer events.

use crate::classifier::{EmotionClassifier, EmotionPrediction};
use crate::labels::normalize_label;
use crate::types::EmotionEvent;
use crate::wav::write_window_wav;
use argus_audio::{AudioFrameAdapter, AudioFrameQueue};
use argus_foundation::clock::epoch_to_iso_utc;
use argus_foundation::error::EmotionError;
use argus_foundation::stop::StopToken;
use argus_telemetry::PipelineMetrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct EmotionProcessor {
    queue: Arc<AudioFrameQueue>,
    adapter: Box<dyn AudioFrameAdapter>,
    classifier: Arc<dyn EmotionClassifier>,
    window: Duration,
    sample_rate: u32,
    event_tx: mpsc::Sender<EmotionEvent>,
    stop: StopToken,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl EmotionProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<AudioFrameQueue>,
        adapter: Box<dyn AudioFrameAdapter>,
        classifier: Arc<dyn EmotionClassifier>,
        window: Duration,
        sample_rate: u32,
        event_tx: mpsc::Sender<EmotionEvent>,
        stop: StopToken,
    ) -> Self {
        Self {
            queue,
            adapter,
            classifier,
            window,
            sample_rate,
            event_tx,
            stop,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(mut self) {
        info!(
            target: "emotion",
            "Emotion processor started (window: {:?})", self.window
        );

        loop {
            let frames = tokio::select! {
                _ = self.stop.stopped() => break,
                frames = self.queue.get_many(self.window, self.window * 2) => frames,
            };

            if frames.is_empty() {
                if self.queue.is_closed() {
                    debug!(target: "emotion", "Audio queue closed");
                    break;
                }
                continue;
            }

            self.process_window(frames).await;
        }

        info!(target: "emotion", "Emotion processor stopped");
    }

    async fn process_window(&mut self, frames: Vec<argus_audio::AudioFrame>) {
        let mut pcm = Vec::new();
        for frame in &frames {
            pcm.extend(self.adapter.to_pcm16(frame));
        }
        if pcm.is_empty() {
            return;
        }

        let classifier = Arc::clone(&self.classifier);
        let sample_rate = self.sample_rate;
        let result = tokio::task::spawn_blocking(move || -> Result<EmotionPrediction, EmotionError> {
            // The temp file drops (and is removed) whether or not the
            // prediction succeeds.
            let wav = write_window_wav(&pcm, sample_rate)?;
            classifier.predict(wav.path())
        })
        .await;

        let event = match result {
            Ok(Ok(prediction)) => {
                let emotion = normalize_label(&prediction.label).map(str::to_string);
                EmotionEvent {
                    emotion,
                    confidence: prediction.score,
                    timestamp: epoch_to_iso_utc(Utc::now()),
                }
            }
            Ok(Err(e)) => {
                warn!(target: "emotion", "Emotion prediction failed: {}", e);
                if let Some(m) = &self.metrics {
                    m.record_emotion_error();
                }
                EmotionEvent {
                    emotion: None,
                    confidence: 0.0,
                    timestamp: epoch_to_iso_utc(Utc::now()),
                }
            }
            Err(e) => {
                warn!(target: "emotion", "Emotion task join failed: {}", e);
                if let Some(m) = &self.metrics {
                    m.record_emotion_error();
                }
                return;
            }
        };

        if let Some(m) = &self.metrics {
            m.record_emotion_window();
        }
        if self.event_tx.send(event).await.is_err() {
            debug!(target: "emotion", "Emotion event channel closed");
        }
    }
}
