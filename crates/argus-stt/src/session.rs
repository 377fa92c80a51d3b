use crate::recognizer::SpeechRecognizer;
use crate::types::{FinalTranscript, RecognizerConfig, TranscriptionEvent};
use argus_foundation::clock::{epoch_to_iso_utc, offset_to_epoch};
use argus_foundation::error::SttError;
use argus_telemetry::PipelineMetrics;
use chrono::{DateTime, Utc};
use crossbeam_channel::TrySendError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Upper bound on queued-but-unsent chunks per stream. At 20ms per chunk
/// this is ~5s of audio, far beyond the preload plus scheduling jitter a
/// healthy recognizer ever accumulates.
const CHUNK_QUEUE_CAPACITY: usize = 256;

/// One live recognizer stream.
///
/// Owns the bounded chunk queue feeding the stream, the dedicated worker
/// thread performing the blocking duplex call, and a converter task that
/// stamps raw finals onto the session wall-clock timeline before handing
/// them to the processor's event channel. `push` never blocks the audio
/// ingest path: a full queue sheds its oldest chunk.
pub struct RecognizerSession {
    chunk_tx: crossbeam_channel::Sender<Option<Vec<u8>>>,
    chunk_rx: crossbeam_channel::Receiver<Option<Vec<u8>>>,
    closed: Arc<AtomicBool>,
    opened_at: Instant,
    started_epoch: DateTime<Utc>,
    dropped_chunks: Arc<AtomicU64>,
}

impl RecognizerSession {
    /// Open a stream, enqueue the overlap preload, and start the worker.
    /// `opened_at` comes from the caller's clock so rotation age stays
    /// testable.
    pub fn open(
        recognizer: Arc<dyn SpeechRecognizer>,
        config: RecognizerConfig,
        preload: Vec<Vec<u8>>,
        event_tx: mpsc::Sender<TranscriptionEvent>,
        opened_at: Instant,
        metrics: Option<Arc<PipelineMetrics>>,
    ) -> Self {
        let (chunk_tx, chunk_rx) = crossbeam_channel::bounded(CHUNK_QUEUE_CAPACITY);
        let (final_tx, mut final_rx) = mpsc::channel::<FinalTranscript>(32);
        let closed = Arc::new(AtomicBool::new(false));
        let started_epoch = Utc::now();

        debug!(target: "stt", "Opening recognizer stream with {} preload chunks", preload.len());
        for chunk in preload {
            if chunk_tx.try_send(Some(chunk)).is_err() {
                warn!(target: "stt", "Preload exceeded chunk queue capacity, truncating");
                break;
            }
        }

        let worker_closed = Arc::clone(&closed);
        let worker_metrics = metrics.clone();
        let worker_rx = chunk_rx.clone();
        std::thread::spawn(move || {
            if let Err(e) = recognizer.run_stream(&config, worker_rx, final_tx) {
                warn!(target: "stt", "Recognizer stream failed: {}", e);
                if let Some(m) = &worker_metrics {
                    m.record_stt_stream_error();
                }
            }
            worker_closed.store(true, Ordering::SeqCst);
        });

        let converter_metrics = metrics;
        tokio::spawn(async move {
            while let Some(transcript) = final_rx.recv().await {
                info!(
                    target: "stt",
                    "Final: {} (confidence: {:.2})",
                    transcript.text, transcript.confidence
                );
                if let Some(m) = &converter_metrics {
                    m.record_stt_final();
                }
                let event = stamp_transcript(transcript, started_epoch);
                if event_tx.send(event).await.is_err() {
                    debug!(target: "stt", "Transcription event channel closed");
                    break;
                }
            }
        });

        Self {
            chunk_tx,
            chunk_rx,
            closed,
            opened_at,
            started_epoch,
            dropped_chunks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue one chunk without blocking. A full queue sheds its oldest
    /// entry to make room.
    pub fn push(&self, chunk: Vec<u8>) {
        if self.is_closed() {
            return;
        }
        match self.chunk_tx.try_send(Some(chunk)) {
            Ok(()) => {}
            Err(TrySendError::Full(rejected)) => match self.chunk_rx.try_recv() {
                Ok(Some(_)) => {
                    let dropped = self.dropped_chunks.fetch_add(1, Ordering::Relaxed) + 1;
                    if dropped % 64 == 1 {
                        warn!(target: "stt", "{}", SttError::QueueOverflow { dropped });
                    }
                    let _ = self.chunk_tx.try_send(rejected);
                }
                // The displaced entry was the close sentinel: keep it, not the data.
                Ok(None) => {
                    let _ = self.chunk_tx.try_send(None);
                }
                Err(_) => {}
            },
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Close the stream by enqueueing the sentinel. Idempotent; the worker
    /// exits once it reads the sentinel.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.chunk_tx.try_send(None).is_err() {
            let _ = self.chunk_rx.try_recv();
            let _ = self.chunk_tx.try_send(None);
        }
        debug!(target: "stt", "Recognizer stream closed");
    }

    /// False once the stream was closed locally or its worker exited.
    pub fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.opened_at)
    }

    pub fn started_epoch(&self) -> DateTime<Utc> {
        self.started_epoch
    }

    pub fn dropped_chunks(&self) -> u64 {
        self.dropped_chunks.load(Ordering::Relaxed)
    }
}

/// Place a raw final on the wall-clock timeline. Streams that report
/// offsets are anchored at the stream start; otherwise both bounds fall at
/// emission time.
fn stamp_transcript(transcript: FinalTranscript, started_epoch: DateTime<Utc>) -> TranscriptionEvent {
    let (start, end) = match (transcript.start_offset, transcript.end_offset) {
        (Some(s), Some(e)) => (
            offset_to_epoch(started_epoch, s),
            offset_to_epoch(started_epoch, e),
        ),
        _ => {
            let now = Utc::now();
            (now, now)
        }
    };
    TranscriptionEvent {
        text: transcript.text,
        confidence: transcript.confidence,
        start_time: epoch_to_iso_utc(start),
        end_time: epoch_to_iso_utc(end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{ChunkReceiver, FinalSender, NoopRecognizer};
    use argus_foundation::error::SttError;
    use parking_lot::Mutex;

    /// Records every data chunk it receives, then emits one final.
    struct RecordingRecognizer {
        seen: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl SpeechRecognizer for RecordingRecognizer {
        fn run_stream(
            &self,
            _config: &RecognizerConfig,
            chunks: ChunkReceiver,
            finals: FinalSender,
        ) -> Result<(), SttError> {
            while let Ok(Some(chunk)) = chunks.recv() {
                self.seen.lock().push(chunk);
            }
            let _ = finals.blocking_send(FinalTranscript {
                text: "done".into(),
                confidence: 0.5,
                start_offset: Some(Duration::from_secs(1)),
                end_offset: Some(Duration::from_secs(2)),
            });
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn preload_is_fed_before_live_chunks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recognizer = Arc::new(RecordingRecognizer {
            seen: Arc::clone(&seen),
        });
        let (event_tx, mut event_rx) = mpsc::channel(8);

        let session = RecognizerSession::open(
            recognizer,
            RecognizerConfig::default(),
            vec![vec![1u8; 4], vec![2u8; 4]],
            event_tx,
            Instant::now(),
            None,
        );
        session.push(vec![3u8; 4]);
        session.close();

        let event = tokio::time::timeout(Duration::from_secs(2), event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.text, "done");
        assert_eq!(
            *seen.lock(),
            vec![vec![1u8; 4], vec![2u8; 4], vec![3u8; 4]]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offset_finals_are_anchored_to_stream_start() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recognizer = Arc::new(RecordingRecognizer { seen });
        let (event_tx, mut event_rx) = mpsc::channel(8);

        let session = RecognizerSession::open(
            recognizer,
            RecognizerConfig::default(),
            Vec::new(),
            event_tx,
            Instant::now(),
            None,
        );
        let anchor = session.started_epoch();
        session.close();

        let event = tokio::time::timeout(Duration::from_secs(2), event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event.start_time,
            epoch_to_iso_utc(anchor + chrono::Duration::seconds(1))
        );
        assert_eq!(
            event.end_time,
            epoch_to_iso_utc(anchor + chrono::Duration::seconds(2))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_after_close_is_discarded() {
        let (event_tx, _event_rx) = mpsc::channel(8);
        let session = RecognizerSession::open(
            Arc::new(NoopRecognizer),
            RecognizerConfig::default(),
            Vec::new(),
            event_tx,
            Instant::now(),
            None,
        );
        session.close();
        session.push(vec![0u8; 640]);
        assert!(!session.is_alive());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn full_queue_sheds_oldest() {
        // A recognizer that never reads keeps the queue at capacity.
        struct StuckRecognizer;
        impl SpeechRecognizer for StuckRecognizer {
            fn run_stream(
                &self,
                _config: &RecognizerConfig,
                chunks: ChunkReceiver,
                _finals: FinalSender,
            ) -> Result<(), SttError> {
                // Hold the receiver open without consuming until the sender drops.
                while let Ok(item) = chunks.recv() {
                    if item.is_none() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Ok(())
            }
        }

        let (event_tx, _event_rx) = mpsc::channel(8);
        let session = RecognizerSession::open(
            Arc::new(StuckRecognizer),
            RecognizerConfig::default(),
            Vec::new(),
            event_tx,
            Instant::now(),
            None,
        );

        for i in 0..600u32 {
            session.push(vec![(i % 251) as u8; 4]);
        }
        assert!(session.dropped_chunks() > 0);
        session.close();
    }
}
