use argus_foundation::error::AudioError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Streaming mono i16 resampler on Rubato's sinc interpolation.
///
/// Accepts arbitrary-sized input chunks and buffers internally to satisfy
/// Rubato's fixed input chunk requirement. Parameters are tuned for speech:
/// a medium-length filter is enough ahead of VAD and recognition.
pub struct StreamResampler {
    in_rate: u32,
    out_rate: u32,
    resampler: Option<SincFixedIn<f32>>,
    input_buffer: Vec<f32>,
    chunk_size: usize,
}

impl StreamResampler {
    pub fn new(in_rate: u32, out_rate: u32) -> Self {
        // 512 input samples keeps latency ~32ms at 16kHz, aligned with the
        // 20ms chunk cadence downstream.
        let chunk_size = 512;

        let resampler = if in_rate == out_rate {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 64,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Cubic,
                oversampling_factor: 128,
                window: WindowFunction::Blackman2,
            };
            Some(
                SincFixedIn::<f32>::new(
                    out_rate as f64 / in_rate as f64,
                    2.0,
                    params,
                    chunk_size,
                    1,
                )
                .expect("valid fixed resampler parameters"),
            )
        };

        Self {
            in_rate,
            out_rate,
            resampler,
            input_buffer: Vec::with_capacity(chunk_size * 2),
            chunk_size,
        }
    }

    pub fn in_rate(&self) -> u32 {
        self.in_rate
    }

    pub fn out_rate(&self) -> u32 {
        self.out_rate
    }

    /// Process an arbitrary chunk of mono i16 samples, returning whatever
    /// resampled output is ready. Input shorter than the internal chunk
    /// size is buffered until enough accumulates.
    pub fn process(&mut self, input: &[i16]) -> Vec<i16> {
        let resampler = match self.resampler.as_mut() {
            Some(r) => r,
            None => return input.to_vec(),
        };

        self.input_buffer
            .extend(input.iter().map(|&s| s as f32 / 32768.0));

        let mut output = Vec::new();
        while self.input_buffer.len() >= self.chunk_size {
            let chunk: Vec<f32> = self.input_buffer.drain(..self.chunk_size).collect();
            match resampler.process(&[chunk], None) {
                Ok(frames) => {
                    output.extend(frames[0].iter().map(|&s| {
                        (s.clamp(-1.0, 1.0) * 32767.0).round() as i16
                    }));
                }
                Err(e) => {
                    let err = AudioError::ResampleFailed(e.to_string());
                    tracing::warn!("Dropping chunk: {}", err);
                }
            }
        }
        output
    }
}
