//! Pipeline configuration, overridable via environment variables.
//!
//! Every key maps 1:1 to an environment variable of the same name in upper
//! case (`VIDEO_FPS`, `STT_LANGUAGE`, ...). Defaults match the production
//! deployment; `from_env()` is the single entry point used at bootstrap.

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub server_host: String,
    pub server_port: u16,
    pub log_level: String,

    /// Video sampling rate for the frame sampler.
    pub video_fps: u32,

    /// PCM rate fed to the audio analyzers.
    pub audio_sample_rate: u32,
    /// Chunk duration produced by the PCM chunker.
    pub audio_frame_ms: u32,
    /// Depth of the transcription overlap ring.
    pub audio_overlap_ms: u32,
    /// 0 (lenient) ..= 3 (strict).
    pub vad_aggressiveness: u8,

    pub stt_language: String,
    /// Recognizer stream rotation trigger.
    pub stt_max_duration_sec: u64,

    pub emotion_window_sec: u64,

    pub event_forward_base_url: String,
    pub api_key: String,
    pub http_request_timeout_sec: u64,

    pub idle_timeout_sec: u64,
    pub confidence_threshold: f32,
    pub max_resolution: String,
    pub data_channel_init_delay_ms: u64,
    pub detections_channel_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            log_level: "INFO".to_string(),
            video_fps: 3,
            audio_sample_rate: 16_000,
            audio_frame_ms: 20,
            audio_overlap_ms: 1000,
            vad_aggressiveness: 1,
            stt_language: "pt-BR".to_string(),
            stt_max_duration_sec: 240,
            emotion_window_sec: 10,
            event_forward_base_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            http_request_timeout_sec: 10,
            idle_timeout_sec: 30,
            confidence_threshold: 0.5,
            max_resolution: "1280x720".to_string(),
            data_channel_init_delay_ms: 100,
            detections_channel_label: "detections".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from the process environment, falling back to defaults for
    /// unset keys. Fails on unparsable values or out-of-range settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = config::Config::builder()
            .set_default("server_host", defaults.server_host)?
            .set_default("server_port", defaults.server_port as i64)?
            .set_default("log_level", defaults.log_level)?
            .set_default("video_fps", defaults.video_fps as i64)?
            .set_default("audio_sample_rate", defaults.audio_sample_rate as i64)?
            .set_default("audio_frame_ms", defaults.audio_frame_ms as i64)?
            .set_default("audio_overlap_ms", defaults.audio_overlap_ms as i64)?
            .set_default("vad_aggressiveness", defaults.vad_aggressiveness as i64)?
            .set_default("stt_language", defaults.stt_language)?
            .set_default("stt_max_duration_sec", defaults.stt_max_duration_sec as i64)?
            .set_default("emotion_window_sec", defaults.emotion_window_sec as i64)?
            .set_default("event_forward_base_url", defaults.event_forward_base_url)?
            .set_default("api_key", defaults.api_key)?
            .set_default(
                "http_request_timeout_sec",
                defaults.http_request_timeout_sec as i64,
            )?
            .set_default("idle_timeout_sec", defaults.idle_timeout_sec as i64)?
            .set_default(
                "confidence_threshold",
                defaults.confidence_threshold as f64,
            )?
            .set_default("max_resolution", defaults.max_resolution)?
            .set_default(
                "data_channel_init_delay_ms",
                defaults.data_channel_init_delay_ms as i64,
            )?
            .set_default(
                "detections_channel_label",
                defaults.detections_channel_label,
            )?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let parsed: PipelineConfig = cfg.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vad_aggressiveness > 3 {
            return Err(ConfigError::Validation {
                field: "vad_aggressiveness".into(),
                reason: format!("{} is outside 0..=3", self.vad_aggressiveness),
            });
        }
        if self.audio_sample_rate == 0 {
            return Err(ConfigError::Validation {
                field: "audio_sample_rate".into(),
                reason: "must be non-zero".into(),
            });
        }
        if self.audio_frame_ms == 0 {
            return Err(ConfigError::Validation {
                field: "audio_frame_ms".into(),
                reason: "must be non-zero".into(),
            });
        }
        if self.audio_overlap_ms < self.audio_frame_ms {
            return Err(ConfigError::Validation {
                field: "audio_overlap_ms".into(),
                reason: "must cover at least one chunk".into(),
            });
        }
        if self.video_fps == 0 {
            return Err(ConfigError::Validation {
                field: "video_fps".into(),
                reason: "must be non-zero".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Validation {
                field: "confidence_threshold".into(),
                reason: format!("{} is outside [0, 1]", self.confidence_threshold),
            });
        }
        Ok(())
    }

    /// Exact byte length of one PCM chunk (16-bit mono).
    pub fn chunk_bytes(&self) -> usize {
        (self.audio_sample_rate as usize * self.audio_frame_ms as usize / 1000) * 2
    }

    /// Overlap ring depth in chunks.
    pub fn overlap_chunks(&self) -> usize {
        (self.audio_overlap_ms / self.audio_frame_ms) as usize
    }

    pub fn stt_max_duration(&self) -> Duration {
        Duration::from_secs(self.stt_max_duration_sec)
    }

    pub fn emotion_window(&self) -> Duration {
        Duration::from_secs(self.emotion_window_sec)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_request_timeout_sec)
    }

    pub fn data_channel_init_delay(&self) -> Duration {
        Duration::from_millis(self.data_channel_init_delay_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_sec)
    }
}
