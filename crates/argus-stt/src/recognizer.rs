use crate::types::{FinalTranscript, RecognizerConfig};
use argus_foundation::error::SttError;

/// Chunk feed for one recognizer stream. `None` is the close sentinel.
pub type ChunkReceiver = crossbeam_channel::Receiver<Option<Vec<u8>>>;

/// Final-result handoff back toward the event loop. Worker threads use
/// `blocking_send`.
pub type FinalSender = tokio::sync::mpsc::Sender<FinalTranscript>;

/// Contract for an external streaming recognizer.
///
/// `run_stream` is the blocking duplex call: it consumes PCM chunks from
/// `chunks` until it reads the `None` sentinel (or the channel disconnects)
/// and pushes final results into `finals` as they become available. It runs
/// on a dedicated worker thread owned by [`crate::RecognizerSession`]; it
/// must never be called on the async runtime.
pub trait SpeechRecognizer: Send + Sync {
    fn run_stream(
        &self,
        config: &RecognizerConfig,
        chunks: ChunkReceiver,
        finals: FinalSender,
    ) -> Result<(), SttError>;
}

/// Recognizer that consumes its stream and produces nothing. Stands in
/// where transcription is disabled and in tests exercising stream
/// plumbing.
pub struct NoopRecognizer;

impl SpeechRecognizer for NoopRecognizer {
    fn run_stream(
        &self,
        _config: &RecognizerConfig,
        chunks: ChunkReceiver,
        _finals: FinalSender,
    ) -> Result<(), SttError> {
        while let Ok(item) = chunks.recv() {
            if item.is_none() {
                break;
            }
        }
        Ok(())
    }
}
