use crate::frame::BgrImage;
use crate::types::DetectionEvent;
use argus_foundation::error::VideoError;

/// Raw detection record as returned by the inference backend.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Contract for the object detector.
///
/// `detect` is blocking and CPU/IO-bound; the processor always dispatches
/// it through the blocking pool, never on the async runtime.
pub trait VideoDetector: Send + Sync {
    fn detect(&self, image: &BgrImage) -> Result<Vec<RawDetection>, VideoError>;
}

impl RawDetection {
    /// Validate and convert into an emitted event, rounding confidence to
    /// two decimals. Malformed records yield `None` and are skipped
    /// individually upstream.
    pub fn into_event(self, frame_index: u64) -> Option<DetectionEvent> {
        if self.label.trim().is_empty() {
            return None;
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return None;
        }
        let geometry = [self.x, self.y, self.width, self.height];
        if geometry.iter().any(|v| !v.is_finite()) || self.width < 0.0 || self.height < 0.0 {
            return None;
        }

        Some(DetectionEvent {
            label: self.label,
            confidence: (self.confidence * 100.0).round() / 100.0,
            frame_index,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        })
    }
}
