use argus_foundation::error::EmotionError;
use std::collections::HashMap;
use std::path::Path;

/// Raw classifier output before label normalization.
#[derive(Debug, Clone)]
pub struct EmotionPrediction {
    pub label: String,
    pub score: f32,
    pub probabilities: Option<HashMap<String, f32>>,
}

/// Contract for the speech-emotion model.
///
/// `predict` is blocking and CPU-bound; the processor always dispatches it
/// through the blocking pool, never on the async runtime. Implementations
/// read the window from a 16 kHz mono WAV file.
pub trait EmotionClassifier: Send + Sync {
    fn predict(&self, wav: &Path) -> Result<EmotionPrediction, EmotionError>;
}
