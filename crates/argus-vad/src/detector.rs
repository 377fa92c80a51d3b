use crate::config::VadConfig;
use crate::energy::EnergyMeter;

/// Binary speech/non-speech decision per PCM chunk.
///
/// Implementations are stateless across calls and must reject chunks whose
/// size differs from the configured chunk length.
pub trait VadDetector: Send + Sync {
    fn is_speech(&self, chunk: &[u8]) -> bool;
}

/// Energy-based detector: a chunk counts as speech when its RMS level in
/// dBFS clears the threshold for the configured aggressiveness.
pub struct EnergyVad {
    chunk_bytes: usize,
    threshold_db: f32,
    meter: EnergyMeter,
}

impl EnergyVad {
    pub fn new(config: VadConfig) -> Self {
        Self {
            chunk_bytes: config.chunk_bytes(),
            threshold_db: Self::threshold_for(config.aggressiveness),
            meter: EnergyMeter::new(),
        }
    }

    /// Higher aggressiveness raises the bar for calling a chunk speech.
    fn threshold_for(aggressiveness: u8) -> f32 {
        match aggressiveness {
            0 => -60.0,
            1 => -50.0,
            2 => -40.0,
            _ => -30.0,
        }
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }
}

impl VadDetector for EnergyVad {
    fn is_speech(&self, chunk: &[u8]) -> bool {
        if chunk.len() != self.chunk_bytes {
            tracing::trace!(
                "VAD rejecting chunk: {} bytes, expected {}",
                chunk.len(),
                self.chunk_bytes
            );
            return false;
        }

        self.meter.chunk_dbfs(chunk) >= self.threshold_db
    }
}
