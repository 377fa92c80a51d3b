use std::sync::Arc;
use std::time::{Duration, Instant};

/// One decoded audio frame as handed over by the transport.
///
/// Samples are interleaved i16 PCM behind an `Arc` so the fan-out can hand
/// the same frame to both analyzer queues without copying sample data.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    samples: Arc<[i16]>,
    sample_rate: u32,
    channels: u16,
    timestamp: Instant,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels: channels.max(1),
            timestamp: Instant::now(),
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Arrival time at the pipeline boundary.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Samples per channel.
    pub fn sample_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.sample_count() as f64 / self.sample_rate as f64)
    }

    /// Raw little-endian bytes of the interleaved samples.
    pub fn pcm_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for &s in self.samples.iter() {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }
}
