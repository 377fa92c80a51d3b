use argus_foundation::error::VadError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VadConfig {
    pub sample_rate: u32,
    pub frame_ms: u32,
    /// 0 (lenient) ..= 3 (strict), mirroring the usual VAD aggressiveness scale.
    pub aggressiveness: u8,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_ms: 20,
            aggressiveness: 1,
        }
    }
}

impl VadConfig {
    pub fn validate(&self) -> Result<(), VadError> {
        if self.aggressiveness > 3 {
            return Err(VadError::InvalidAggressiveness(self.aggressiveness));
        }
        Ok(())
    }

    /// Expected byte length of one 16-bit mono chunk.
    pub fn chunk_bytes(&self) -> usize {
        (self.sample_rate as usize * self.frame_ms as usize / 1000) * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chunk_is_640_bytes() {
        assert_eq!(VadConfig::default().chunk_bytes(), 640);
    }

    #[test]
    fn rejects_aggressiveness_above_three() {
        let cfg = VadConfig {
            aggressiveness: 4,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
