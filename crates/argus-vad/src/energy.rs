/// Signal level below which a chunk is reported as silence. Well under any
/// level a real capture path produces, but finite so thresholds compare
/// cleanly.
const SILENCE_FLOOR_DB: f32 = -100.0;

/// RMS level meter over raw PCM chunks.
///
/// Operates on the wire format the gate receives: little-endian signed
/// 16-bit mono bytes. Levels are reported in dBFS relative to i16 full
/// scale, so thresholds can be expressed on the same scale the capture
/// path is calibrated against.
pub struct EnergyMeter {
    floor_db: f32,
}

impl EnergyMeter {
    pub fn new() -> Self {
        Self {
            floor_db: SILENCE_FLOOR_DB,
        }
    }

    /// RMS level of one PCM chunk in dBFS. Empty or all-zero chunks report
    /// the silence floor. A trailing odd byte is ignored.
    pub fn chunk_dbfs(&self, chunk: &[u8]) -> f32 {
        let mut sum_squares = 0.0f64;
        let mut samples = 0usize;
        for bytes in chunk.chunks_exact(2) {
            let normalized = i16::from_le_bytes([bytes[0], bytes[1]]) as f64 / 32768.0;
            sum_squares += normalized * normalized;
            samples += 1;
        }
        if samples == 0 {
            return self.floor_db;
        }

        let rms = (sum_squares / samples as f64).sqrt() as f32;
        if rms <= 0.0 {
            return self.floor_db;
        }
        (20.0 * rms.log10()).max(self.floor_db)
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }
}

impl Default for EnergyMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_of(sample: i16, samples: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(samples * 2);
        for _ in 0..samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    #[test]
    fn silence_reports_the_floor() {
        let meter = EnergyMeter::new();
        assert_eq!(meter.chunk_dbfs(&chunk_of(0, 320)), meter.floor_db());
        assert_eq!(meter.chunk_dbfs(&[]), meter.floor_db());
    }

    #[test]
    fn full_scale_is_zero_dbfs() {
        let meter = EnergyMeter::new();
        let db = meter.chunk_dbfs(&chunk_of(i16::MAX, 320));
        assert!(db.abs() < 0.1, "got {} dBFS", db);
    }

    #[test]
    fn half_scale_sine_lands_near_minus_nine_dbfs() {
        let meter = EnergyMeter::new();
        let mut chunk = Vec::with_capacity(640);
        for i in 0..320 {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / 320.0;
            let sample = (phase.sin() * 16384.0) as i16;
            chunk.extend_from_slice(&sample.to_le_bytes());
        }
        // Half-scale sine: 20*log10(0.5 / sqrt(2)) ~= -9.03 dBFS
        let db = meter.chunk_dbfs(&chunk);
        assert!((db + 9.03).abs() < 0.2, "got {} dBFS", db);
    }

    #[test]
    fn trailing_odd_byte_is_ignored() {
        let meter = EnergyMeter::new();
        let mut chunk = chunk_of(8000, 320);
        let even = meter.chunk_dbfs(&chunk);
        chunk.push(0xFF);
        assert_eq!(meter.chunk_dbfs(&chunk), even);
    }
}
