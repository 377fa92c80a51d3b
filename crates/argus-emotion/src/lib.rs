pub mod classifier;
pub mod labels;
pub mod processor;
pub mod types;
pub mod wav;

pub use classifier::{EmotionClassifier, EmotionPrediction};
pub use labels::{map_probabilities, normalize_label, CANONICAL_LABELS};
pub use processor::EmotionProcessor;
pub use types::EmotionEvent;
pub use wav::write_window_wav;
