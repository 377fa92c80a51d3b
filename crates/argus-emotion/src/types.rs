use serde::Serialize;

/// Emotion classification result for one audio window, as published to the
/// emitter. `emotion` is null when the classifier is unavailable or the
/// label falls outside the canonical set.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmotionEvent {
    pub emotion: Option<String>,
    pub confidence: f32,
    pub timestamp: String,
}
