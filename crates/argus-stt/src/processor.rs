//! Speech-to-text processor fed from the session's audio fan-out.
//!
//! Consumes raw audio frames, converts them to canonical PCM, chunks them,
//! gates stream opening on VAD, and forwards every chunk into the rotating
//! recognizer stream. Final transcripts surface on the processor's event
//! channel in production order.

use crate::rotator::StreamRotator;
use argus_audio::{AudioFrameAdapter, AudioFrameQueue, PcmChunker};
use argus_foundation::stop::StopToken;
use argus_telemetry::PipelineMetrics;
use argus_vad::VadDetector;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SpeechToTextProcessor {
    queue: Arc<AudioFrameQueue>,
    adapter: Box<dyn AudioFrameAdapter>,
    chunker: PcmChunker,
    vad: Arc<dyn VadDetector>,
    rotator: StreamRotator,
    stop: StopToken,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl SpeechToTextProcessor {
    pub fn new(
        queue: Arc<AudioFrameQueue>,
        adapter: Box<dyn AudioFrameAdapter>,
        chunker: PcmChunker,
        vad: Arc<dyn VadDetector>,
        rotator: StreamRotator,
        stop: StopToken,
    ) -> Self {
        Self {
            queue,
            adapter,
            chunker,
            vad,
            rotator,
            stop,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(mut self) {
        info!(target: "stt", "Speech-to-text processor started");

        loop {
            tokio::select! {
                _ = self.stop.stopped() => {
                    debug!(target: "stt", "Stop requested");
                    break;
                }
                frame = self.queue.get() => {
                    match frame {
                        Some(frame) => self.handle_frame(frame),
                        None => {
                            debug!(target: "stt", "Audio queue closed");
                            break;
                        }
                    }
                }
            }
        }

        self.rotator.close();
        info!(target: "stt", "Speech-to-text processor stopped");
    }

    fn handle_frame(&mut self, frame: argus_audio::AudioFrame) {
        let pcm = self.adapter.to_pcm16(&frame);
        for chunk in self.chunker.push(&pcm) {
            let is_speech = self.vad.is_speech(&chunk);
            if let Some(m) = &self.metrics {
                m.record_stt_chunk();
            }
            self.rotator.push_chunk(chunk, is_speech);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{ChunkReceiver, FinalSender, SpeechRecognizer};
    use crate::types::{FinalTranscript, RecognizerConfig};
    use argus_audio::{AudioFrame, PcmFrameAdapter};
    use argus_foundation::clock::RealClock;
    use argus_foundation::error::SttError;
    use argus_foundation::stop::StopController;
    use argus_vad::{EnergyVad, VadConfig};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Emits one canned final per stream once speech chunks arrive.
    struct OneShotRecognizer;

    impl SpeechRecognizer for OneShotRecognizer {
        fn run_stream(
            &self,
            _config: &RecognizerConfig,
            chunks: ChunkReceiver,
            finals: FinalSender,
        ) -> Result<(), SttError> {
            let mut saw_audio = false;
            while let Ok(Some(_)) = chunks.recv() {
                saw_audio = true;
            }
            if saw_audio {
                let _ = finals.blocking_send(FinalTranscript {
                    text: "olá mundo".into(),
                    confidence: 0.9,
                    start_offset: None,
                    end_offset: None,
                });
            }
            Ok(())
        }
    }

    fn loud_frame() -> AudioFrame {
        AudioFrame::new(vec![20_000i16; 320], 16_000, 1)
    }

    fn silent_frame() -> AudioFrame {
        AudioFrame::new(vec![0i16; 320], 16_000, 1)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn speech_produces_one_final_transcript() {
        let queue = Arc::new(AudioFrameQueue::new(1024));
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let stop = StopController::new();

        let rotator = StreamRotator::new(
            Arc::new(OneShotRecognizer),
            RecognizerConfig::default(),
            Duration::from_secs(240),
            50,
            event_tx,
            Arc::new(RealClock::new()),
        );
        let processor = SpeechToTextProcessor::new(
            Arc::clone(&queue),
            Box::new(PcmFrameAdapter::new(16_000)),
            PcmChunker::new(16_000, 20),
            Arc::new(EnergyVad::new(VadConfig::default())),
            rotator,
            stop.token(),
        );
        let handle = tokio::spawn(processor.run());

        for _ in 0..20 {
            queue.put(silent_frame());
        }
        for _ in 0..50 {
            queue.put(loud_frame());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        queue.close();
        handle.await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), event_rx.recv())
            .await
            .expect("final transcript expected")
            .unwrap();
        assert_eq!(event.text, "olá mundo");
        assert!((event.confidence - 0.9).abs() < f32::EPSILON);
        assert!(event_rx.try_recv().is_err(), "exactly one final expected");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn silence_never_opens_a_stream() {
        let queue = Arc::new(AudioFrameQueue::new(1024));
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let stop = StopController::new();

        let rotator = StreamRotator::new(
            Arc::new(OneShotRecognizer),
            RecognizerConfig::default(),
            Duration::from_secs(240),
            50,
            event_tx,
            Arc::new(RealClock::new()),
        );
        let processor = SpeechToTextProcessor::new(
            Arc::clone(&queue),
            Box::new(PcmFrameAdapter::new(16_000)),
            PcmChunker::new(16_000, 20),
            Arc::new(EnergyVad::new(VadConfig::default())),
            rotator,
            stop.token(),
        );
        let handle = tokio::spawn(processor.run());

        for _ in 0..100 {
            queue.put(silent_frame());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        queue.close();
        handle.await.unwrap();

        assert!(event_rx.try_recv().is_err());
    }
}
