use argus_foundation::error::EmotionError;
use tempfile::NamedTempFile;

/// Write one analysis window of 16 kHz mono PCM to a temporary WAV file.
///
/// The file is deleted when the returned handle drops, whether or not the
/// prediction that reads it succeeds.
pub fn write_window_wav(pcm: &[u8], sample_rate: u32) -> Result<NamedTempFile, EmotionError> {
    let temp_file = NamedTempFile::new()?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::new(temp_file.reopen()?, spec)
        .map_err(|e| EmotionError::WavEncode(e.to_string()))?;

    for bytes in pcm.chunks_exact(2) {
        let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
        writer
            .write_sample(sample)
            .map_err(|e| EmotionError::WavEncode(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| EmotionError::WavEncode(e.to_string()))?;

    Ok(temp_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_readable_mono_wav() {
        let pcm: Vec<u8> = (0..320i16).flat_map(|s| s.to_le_bytes()).collect();
        let wav = write_window_wav(&pcm, 16_000).unwrap();

        let mut reader = hound::WavReader::open(wav.path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 320);
        assert_eq!(samples[10], 10);
    }

    #[test]
    fn file_removed_on_drop() {
        let pcm = vec![0u8; 640];
        let wav = write_window_wav(&pcm, 16_000).unwrap();
        let path = wav.path().to_path_buf();
        assert!(path.exists());
        drop(wav);
        assert!(!path.exists());
    }
}
