pub mod overlap;
pub mod processor;
pub mod recognizer;
pub mod rotator;
pub mod session;
pub mod types;

pub use overlap::OverlapBuffer;
pub use processor::SpeechToTextProcessor;
pub use recognizer::{ChunkReceiver, FinalSender, NoopRecognizer, SpeechRecognizer};
pub use rotator::StreamRotator;
pub use session::RecognizerSession;
pub use types::{FinalTranscript, RecognizerConfig, TranscriptionEvent};
