//! Canonical emotion labels and normalization rules.
//!
//! Classifier backends disagree on label spelling: some report numeric
//! class ids, some capitalized names, some near-synonyms. Everything is
//! folded onto one closed lowercase set here; unknown labels map to `None`.

use std::collections::HashMap;

pub const CANONICAL_LABELS: [&str; 8] = [
    "neutral",
    "calm",
    "happy",
    "sad",
    "angry",
    "fearful",
    "disgusted",
    "surprised",
];

/// Numeric class id order of the deployed wav2vec2 checkpoint.
const ID_MAP: [(&str, &str); 8] = [
    ("0", "neutral"),
    ("1", "calm"),
    ("2", "happy"),
    ("3", "sad"),
    ("4", "angry"),
    ("5", "fearful"),
    ("6", "disgusted"),
    ("7", "surprised"),
];

const SYNONYMS: [(&str, &str); 1] = [("disgust", "disgusted")];

/// Map a raw label (id, any-case name, synonym) to its canonical form.
pub fn normalize_label(raw: &str) -> Option<&'static str> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    if let Some((_, canonical)) = ID_MAP.iter().find(|(id, _)| *id == s) {
        return Some(canonical);
    }
    if let Some(canonical) = CANONICAL_LABELS.iter().find(|&&l| l == s) {
        return Some(canonical);
    }
    if let Some((_, canonical)) = SYNONYMS.iter().find(|(syn, _)| *syn == s) {
        return Some(canonical);
    }

    tracing::info!("Unrecognized emotion label: {}", raw);
    None
}

/// Remap an arbitrary probability table onto the canonical set. Labels that
/// fail normalization are dropped; missing canonical labels appear with 0.0.
pub fn map_probabilities(probs: &HashMap<String, f32>) -> HashMap<&'static str, f32> {
    let mut out: HashMap<&'static str, f32> =
        CANONICAL_LABELS.iter().map(|&l| (l, 0.0)).collect();
    for (raw, &value) in probs {
        if let Some(canonical) = normalize_label(raw) {
            out.insert(canonical, value);
        }
    }
    out
}
