//! Core types for the speech-to-text path

use serde::Serialize;
use std::time::Duration;

/// Final transcription result, timestamped on the session wall-clock
/// timeline, as published to the emitter.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranscriptionEvent {
    pub text: String,
    pub confidence: f32,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
}

/// Raw final result as reported by a recognizer stream. Offsets are
/// relative to the stream start; recognizers that do not report timing
/// leave them unset.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalTranscript {
    pub text: String,
    pub confidence: f32,
    pub start_offset: Option<Duration>,
    pub end_offset: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    pub language: String,
    pub sample_rate: u32,
    pub interim_results: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            language: "pt-BR".to_string(),
            sample_rate: 16_000,
            interim_results: true,
        }
    }
}
