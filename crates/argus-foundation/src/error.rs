use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Vad(#[from] VadError),

    #[error(transparent)]
    Stt(#[from] SttError),

    #[error(transparent)]
    Video(#[from] VideoError),

    #[error(transparent)]
    Emotion(#[from] EmotionError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Shutdown requested")]
    ShutdownRequested,

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Fatal(format!("Task join failed: {}", err))
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Unsupported frame layout: {channels} ch @ {sample_rate} Hz")]
    UnsupportedLayout { channels: u16, sample_rate: u32 },

    #[error("Resampling failed: {0}")]
    ResampleFailed(String),

    #[error("Buffer overflow, dropped {count} frames")]
    BufferOverflow { count: usize },

    #[error("Buffer closed")]
    BufferClosed,
}

#[derive(Debug, Error)]
pub enum VadError {
    #[error("Invalid chunk size: expected {expected} bytes, got {actual}")]
    InvalidChunkSize { expected: usize, actual: usize },

    #[error("Invalid aggressiveness level: {0} (must be 0..=3)")]
    InvalidAggressiveness(u8),
}

#[derive(Debug, Error)]
pub enum SttError {
    #[error("Recognizer stream failed: {0}")]
    StreamFailed(String),

    #[error("Recognizer chunk queue full, dropped {dropped} chunks")]
    QueueOverflow { dropped: u64 },

    #[error("Recognizer worker exited unexpectedly")]
    WorkerExited,
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Detector failed: {0}")]
    DetectorFailed(String),

    #[error("Malformed detection record: {0}")]
    InvalidDetection(String),
}

#[derive(Debug, Error)]
pub enum EmotionError {
    #[error("Classifier not available")]
    ClassifierUnavailable,

    #[error("Prediction failed: {0}")]
    PredictFailed(String),

    #[error("WAV encoding failed: {0}")]
    WavEncode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Data channel closed")]
    ChannelClosed,

    #[error("Event serialization failed: {0}")]
    SerializeFailed(String),

    #[error("HTTP forward failed: {0}")]
    HttpFailed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration parsing error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },
}

#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    /// Skip the failed item, keep the loop running.
    Ignore,
    /// Tear down the failing sub-stream and let the next trigger reopen it.
    Restart,
    Retry { max_attempts: u32, delay: Duration },
    Fatal,
}

impl PipelineError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            PipelineError::Audio(AudioError::BufferClosed) => RecoveryStrategy::Fatal,
            PipelineError::Audio(_) => RecoveryStrategy::Ignore,
            PipelineError::Stt(SttError::StreamFailed(_)) => RecoveryStrategy::Restart,
            PipelineError::Stt(SttError::WorkerExited) => RecoveryStrategy::Restart,
            PipelineError::Stt(SttError::QueueOverflow { .. }) => RecoveryStrategy::Ignore,
            PipelineError::Video(_) | PipelineError::Emotion(_) | PipelineError::Vad(_) => {
                RecoveryStrategy::Ignore
            }
            PipelineError::Emit(EmitError::HttpFailed(_)) => RecoveryStrategy::Retry {
                max_attempts: 1,
                delay: Duration::from_secs(0),
            },
            PipelineError::Emit(_) => RecoveryStrategy::Ignore,
            PipelineError::Fatal(_) | PipelineError::ShutdownRequested => RecoveryStrategy::Fatal,
            PipelineError::Config(_) => RecoveryStrategy::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_item_errors_are_ignored() {
        let err = PipelineError::from(VideoError::DetectorFailed("boom".into()));
        assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Ignore));
    }

    #[test]
    fn recognizer_stream_errors_restart() {
        let err = PipelineError::from(SttError::StreamFailed("deadline exceeded".into()));
        assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Restart));
    }

    #[test]
    fn fatal_stays_fatal() {
        let err = PipelineError::Fatal("invariant violated".into());
        assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Fatal));
    }
}
