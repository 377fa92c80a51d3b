//! Outbound event envelope.
//!
//! Every message leaving the pipeline is one of these variants, serialized
//! as a single newline-free JSON object tagged by `event_type`. Analysis
//! events go to both sinks; framing events go to the data channel only.

use argus_emotion::EmotionEvent;
use argus_stt::TranscriptionEvent;
use argus_video::DetectionEvent;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event_type")]
pub enum AnalysisEvent {
    #[serde(rename = "object")]
    Object(DetectionEvent),
    #[serde(rename = "transcript")]
    Transcript(TranscriptionEvent),
    #[serde(rename = "emotion")]
    Emotion(EmotionEvent),
    #[serde(rename = "session_started")]
    SessionStarted {
        session_id: String,
        timestamp_ms: i64,
        config: SessionConfigPayload,
    },
    #[serde(rename = "stream_closed")]
    StreamClosed {
        session_id: String,
        summary: SessionSummary,
    },
}

impl AnalysisEvent {
    /// Path under the forwarding base URL, or `None` for framing events
    /// that never leave the data channel.
    pub fn forward_path(&self) -> Option<&'static str> {
        match self {
            AnalysisEvent::Object(_) => Some("events/object"),
            AnalysisEvent::Transcript(_) => Some("events/transcript"),
            AnalysisEvent::Emotion(_) => Some("events/emotion"),
            AnalysisEvent::SessionStarted { .. } | AnalysisEvent::StreamClosed { .. } => None,
        }
    }
}

/// Session parameters echoed to the client on channel open.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionConfigPayload {
    pub max_resolution: String,
    pub confidence_threshold: f32,
    pub idle_timeout_sec: u64,
}

/// Track-end accounting, reported in `stream_closed`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSummary {
    pub total_frames_received: u64,
    pub total_frames_processed: u64,
    pub total_frames_dropped: u64,
    pub total_detections: u64,
    pub duration_sec: f64,
}
