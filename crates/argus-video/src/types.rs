use serde::Serialize;

/// One detected object on one sampled frame, as published to the emitter.
/// Geometry follows the detector's convention: center coordinates plus box
/// extent, in source-frame pixels.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetectionEvent {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "frameIndex")]
    pub frame_index: u64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}
