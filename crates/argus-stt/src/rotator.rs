use crate::overlap::OverlapBuffer;
use crate::recognizer::SpeechRecognizer;
use crate::session::RecognizerSession;
use crate::types::{RecognizerConfig, TranscriptionEvent};
use argus_foundation::clock::Clock;
use argus_telemetry::PipelineMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Owns at most one live recognizer stream and keeps the audio carrier
/// continuous across stream boundaries.
///
/// A stream opens lazily on the first speech chunk, preloaded with the
/// overlap ring so words straddling the onset are captured. Once open,
/// every chunk is forwarded regardless of VAD (recognizers need a
/// continuous carrier) until the stream ages past the rotation limit, at
/// which point it is closed with its sentinel and a successor opens
/// preloaded with the snapshot taken at rotation time.
pub struct StreamRotator {
    recognizer: Arc<dyn SpeechRecognizer>,
    config: RecognizerConfig,
    max_stream_duration: Duration,
    overlap: OverlapBuffer,
    current: Option<RecognizerSession>,
    event_tx: mpsc::Sender<TranscriptionEvent>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl StreamRotator {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        config: RecognizerConfig,
        max_stream_duration: Duration,
        overlap_chunks: usize,
        event_tx: mpsc::Sender<TranscriptionEvent>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            recognizer,
            config,
            max_stream_duration,
            overlap: OverlapBuffer::new(overlap_chunks),
            current: None,
            event_tx,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Feed one PCM chunk through the rotation logic.
    pub fn push_chunk(&mut self, chunk: Vec<u8>, is_speech: bool) {
        self.overlap.push(chunk.clone());

        // A stream whose worker died is gone; the next speech chunk
        // replaces it, overlap intact.
        if self.current.as_ref().is_some_and(|s| !s.is_alive()) {
            debug!(target: "stt", "Discarding dead recognizer stream");
            self.current = None;
        }

        if self.current.is_none() {
            if !is_speech {
                return;
            }
            info!(target: "stt", "Speech detected, opening recognizer stream");
            self.open_stream();
        } else if self.current_age() >= self.max_stream_duration {
            info!(target: "stt", "Rotating recognizer stream (duration limit)");
            if let Some(old) = self.current.take() {
                old.close();
            }
            if let Some(m) = &self.metrics {
                m.record_stt_rotation();
            }
            self.open_stream();
        }

        if let Some(session) = &self.current {
            session.push(chunk);
        }
    }

    fn open_stream(&mut self) {
        let preload = self.overlap.snapshot();
        self.current = Some(RecognizerSession::open(
            Arc::clone(&self.recognizer),
            self.config.clone(),
            preload,
            self.event_tx.clone(),
            self.clock.now(),
            self.metrics.clone(),
        ));
    }

    fn current_age(&self) -> Duration {
        self.current
            .as_ref()
            .map(|s| s.age(self.clock.now()))
            .unwrap_or(Duration::ZERO)
    }

    pub fn has_active_stream(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.is_alive())
    }

    /// Close any live stream by sending its sentinel.
    pub fn close(&mut self) {
        if let Some(session) = self.current.take() {
            session.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{ChunkReceiver, FinalSender};
    use argus_foundation::clock::TestClock;
    use argus_foundation::error::SttError;
    use parking_lot::Mutex;

    /// Records, per opened stream, every chunk fed into it.
    struct StreamLog {
        streams: Arc<Mutex<Vec<Vec<Vec<u8>>>>>,
    }

    impl SpeechRecognizer for StreamLog {
        fn run_stream(
            &self,
            _config: &RecognizerConfig,
            chunks: ChunkReceiver,
            _finals: FinalSender,
        ) -> Result<(), SttError> {
            let index = {
                let mut streams = self.streams.lock();
                streams.push(Vec::new());
                streams.len() - 1
            };
            while let Ok(Some(chunk)) = chunks.recv() {
                self.streams.lock()[index].push(chunk);
            }
            Ok(())
        }
    }

    fn chunk(tag: u8) -> Vec<u8> {
        vec![tag; 4]
    }

    fn wait_for_streams(streams: &Arc<Mutex<Vec<Vec<Vec<u8>>>>>, n: usize) {
        for _ in 0..200 {
            if streams.lock().len() >= n {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("expected {} streams", n);
    }

    fn wait_for_chunks(streams: &Arc<Mutex<Vec<Vec<Vec<u8>>>>>, stream: usize, n: usize) {
        for _ in 0..200 {
            if streams.lock().get(stream).is_some_and(|s| s.len() >= n) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("expected {} chunks in stream {}", n, stream);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn no_stream_until_speech() {
        let streams = Arc::new(Mutex::new(Vec::new()));
        let (tx, _rx) = mpsc::channel(8);
        let mut rotator = StreamRotator::new(
            Arc::new(StreamLog {
                streams: Arc::clone(&streams),
            }),
            RecognizerConfig::default(),
            Duration::from_secs(240),
            4,
            tx,
            Arc::new(TestClock::new()),
        );

        for i in 0..10u8 {
            rotator.push_chunk(chunk(i), false);
        }
        assert!(!rotator.has_active_stream());
        assert!(streams.lock().is_empty());

        rotator.push_chunk(chunk(10), true);
        assert!(rotator.has_active_stream());
        rotator.close();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn onset_stream_preloads_overlap() {
        let streams = Arc::new(Mutex::new(Vec::new()));
        let (tx, _rx) = mpsc::channel(8);
        let mut rotator = StreamRotator::new(
            Arc::new(StreamLog {
                streams: Arc::clone(&streams),
            }),
            RecognizerConfig::default(),
            Duration::from_secs(240),
            3,
            tx,
            Arc::new(TestClock::new()),
        );

        rotator.push_chunk(chunk(1), false);
        rotator.push_chunk(chunk(2), false);
        rotator.push_chunk(chunk(3), true);
        rotator.close();

        wait_for_streams(&streams, 1);
        wait_for_chunks(&streams, 0, 4);
        let fed = streams.lock()[0].clone();
        // Preload = overlap snapshot (ending with the onset chunk), then
        // the onset chunk forwarded live.
        assert_eq!(fed, vec![chunk(1), chunk(2), chunk(3), chunk(3)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rotation_preserves_boundary_continuity() {
        let streams = Arc::new(Mutex::new(Vec::new()));
        let (tx, _rx) = mpsc::channel(8);
        let clock = Arc::new(TestClock::new());
        let mut rotator = StreamRotator::new(
            Arc::new(StreamLog {
                streams: Arc::clone(&streams),
            }),
            RecognizerConfig::default(),
            Duration::from_secs(1),
            2,
            tx,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        rotator.push_chunk(chunk(1), true);
        rotator.push_chunk(chunk(2), true);

        // Age the stream past the rotation limit.
        clock.advance(Duration::from_secs(2));
        rotator.push_chunk(chunk(3), true);
        rotator.close();

        wait_for_streams(&streams, 2);
        wait_for_chunks(&streams, 1, 3);
        let second = streams.lock()[1].clone();
        // Preload is the snapshot at rotation time (last two chunks), then
        // the live chunk that triggered rotation.
        assert_eq!(second, vec![chunk(2), chunk(3), chunk(3)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dead_stream_is_replaced_on_next_speech() {
        struct FailingRecognizer {
            opens: Arc<std::sync::atomic::AtomicU64>,
        }
        impl SpeechRecognizer for FailingRecognizer {
            fn run_stream(
                &self,
                _config: &RecognizerConfig,
                _chunks: ChunkReceiver,
                _finals: FinalSender,
            ) -> Result<(), SttError> {
                self.opens.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Err(SttError::StreamFailed("transport reset".into()))
            }
        }

        let opens = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let (tx, _rx) = mpsc::channel(8);
        let mut rotator = StreamRotator::new(
            Arc::new(FailingRecognizer {
                opens: Arc::clone(&opens),
            }),
            RecognizerConfig::default(),
            Duration::from_secs(240),
            4,
            tx,
            Arc::new(TestClock::new()),
        );

        rotator.push_chunk(chunk(1), true);
        // Give the failing worker time to die.
        tokio::time::sleep(Duration::from_millis(100)).await;
        rotator.push_chunk(chunk(2), false);
        assert!(!rotator.has_active_stream());

        // Next speech chunk opens a replacement stream.
        rotator.push_chunk(chunk(3), true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(opens.load(std::sync::atomic::Ordering::SeqCst), 2);
        rotator.close();
    }
}
