use crate::frame::AudioFrame;
use crate::resampler::StreamResampler;

/// Converts transport frames into the pipeline's canonical PCM form:
/// 16 kHz mono signed 16-bit little-endian.
///
/// Adapters are stateful (resampler history, layout tracking) and must not
/// be shared between consumers; each processor owns its own instance so
/// buffer state never couples across analyzers.
pub trait AudioFrameAdapter: Send {
    fn to_pcm16(&mut self, frame: &AudioFrame) -> Vec<u8>;
}

/// Default adapter: channel-averaging downmix followed by streaming
/// resampling to the target rate. Reconfigures itself when the incoming
/// frame layout changes mid-stream.
pub struct PcmFrameAdapter {
    target_rate: u32,
    resampler: Option<StreamResampler>,
    current_input_rate: Option<u32>,
    current_input_channels: Option<u16>,
}

impl PcmFrameAdapter {
    pub fn new(target_rate: u32) -> Self {
        Self {
            target_rate,
            resampler: None,
            current_input_rate: None,
            current_input_channels: None,
        }
    }

    fn reconfigure(&mut self, frame: &AudioFrame) {
        if frame.sample_rate() != self.target_rate {
            tracing::debug!(
                "Configuring resampler: {}Hz {} ch -> {}Hz mono",
                frame.sample_rate(),
                frame.channels(),
                self.target_rate
            );
            self.resampler = Some(StreamResampler::new(frame.sample_rate(), self.target_rate));
        } else {
            self.resampler = None;
        }
        self.current_input_rate = Some(frame.sample_rate());
        self.current_input_channels = Some(frame.channels());
    }

    fn downmix(frame: &AudioFrame) -> Vec<i16> {
        let channels = frame.channels() as usize;
        if channels == 1 {
            return frame.samples().to_vec();
        }
        frame
            .samples()
            .chunks_exact(channels)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }
}

impl AudioFrameAdapter for PcmFrameAdapter {
    fn to_pcm16(&mut self, frame: &AudioFrame) -> Vec<u8> {
        if self.current_input_rate != Some(frame.sample_rate())
            || self.current_input_channels != Some(frame.channels())
        {
            self.reconfigure(frame);
        }

        let mono = Self::downmix(frame);
        let resampled = match self.resampler.as_mut() {
            Some(rs) => rs.process(&mono),
            None => mono,
        };

        let mut out = Vec::with_capacity(resampled.len() * 2);
        for s in resampled {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }
}
