//! Per-session pipeline wiring and lifecycle.
//!
//! One `SessionPipeline` owns everything between the transport's frame
//! callbacks and the emitter: the video slot, the audio fan-out, the three
//! processor tasks, and one emit pump per processor so events reach the
//! sinks in production order. Shutdown is cooperative with a hard budget;
//! tasks that overrun it are aborted.

use crate::emitter::Emitter;
use crate::events::{AnalysisEvent, SessionConfigPayload};
use crate::http_sink::SinkClient;
use crate::session::Session;
use argus_audio::{AudioFanOut, AudioFrame, AudioFrameQueue, PcmChunker, PcmFrameAdapter};
use argus_emotion::{EmotionClassifier, EmotionEvent, EmotionProcessor};
use argus_foundation::clock::{Clock, RealClock};
use argus_foundation::config::PipelineConfig;
use argus_foundation::state::{SessionState, StateManager};
use argus_foundation::stop::StopController;
use argus_stt::{
    RecognizerConfig, SpeechRecognizer, SpeechToTextProcessor, StreamRotator, TranscriptionEvent,
};
use argus_vad::{EnergyVad, VadConfig, VadDetector};
use argus_video::{
    BgrImage, DetectionEvent, FrameSampler, VideoDetector, VideoFrame, VideoFrameSlot,
    VideoProcessor,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const AUDIO_QUEUE_CAPACITY: usize = 1024;
const EVENT_CHANNEL_CAPACITY: usize = 64;
const SHUTDOWN_BUDGET: Duration = Duration::from_secs(2);

/// External collaborators injected into a pipeline. The inference engines
/// and the forwarding transport are always explicit; VAD and clock default
/// to the production implementations and are overridable for tests.
pub struct PipelineDependencies {
    pub detector: Arc<dyn VideoDetector>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub classifier: Arc<dyn EmotionClassifier>,
    pub sink: Arc<dyn SinkClient>,
    vad: Option<Arc<dyn VadDetector>>,
    clock: Option<Arc<dyn Clock>>,
}

impl PipelineDependencies {
    pub fn new(
        detector: Arc<dyn VideoDetector>,
        recognizer: Arc<dyn SpeechRecognizer>,
        classifier: Arc<dyn EmotionClassifier>,
        sink: Arc<dyn SinkClient>,
    ) -> Self {
        Self {
            detector,
            recognizer,
            classifier,
            sink,
            vad: None,
            clock: None,
        }
    }

    pub fn with_vad(mut self, vad: Arc<dyn VadDetector>) -> Self {
        self.vad = Some(vad);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

pub struct SessionPipeline {
    session: Arc<Session>,
    config: PipelineConfig,
    metrics: Arc<argus_telemetry::PipelineMetrics>,
    state: StateManager,
    stop: StopController,
    video_slot: Arc<VideoFrameSlot>,
    fanout: AudioFanOut,
    frame_index: AtomicU64,
    emitter: Arc<Emitter>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionPipeline {
    /// Wire the buffers and spawn every processor task. Must run on the
    /// runtime; returns once the pipeline is accepting frames.
    pub fn start(
        session: Arc<Session>,
        config: PipelineConfig,
        deps: PipelineDependencies,
    ) -> Arc<Self> {
        let metrics = session.metrics();
        let emitter = Arc::new(Emitter::new(Arc::clone(&session), Arc::clone(&deps.sink)));
        let stop = StopController::new();
        let state = StateManager::new();
        let clock = deps
            .clock
            .unwrap_or_else(|| Arc::new(RealClock::new()) as Arc<dyn Clock>);
        let vad = deps.vad.unwrap_or_else(|| {
            Arc::new(EnergyVad::new(VadConfig {
                sample_rate: config.audio_sample_rate,
                frame_ms: config.audio_frame_ms,
                aggressiveness: config.vad_aggressiveness,
            })) as Arc<dyn VadDetector>
        });

        let video_slot = Arc::new(VideoFrameSlot::new());
        let stt_queue = Arc::new(AudioFrameQueue::new(AUDIO_QUEUE_CAPACITY));
        let emotion_queue = Arc::new(AudioFrameQueue::new(AUDIO_QUEUE_CAPACITY));
        let fanout = AudioFanOut::new(Arc::clone(&stt_queue), Arc::clone(&emotion_queue));

        let mut tasks = Vec::new();

        // Video path: slot -> sampler -> detector -> object events.
        let (detection_tx, mut detection_rx) =
            mpsc::channel::<DetectionEvent>(EVENT_CHANNEL_CAPACITY);
        let video = VideoProcessor::new(
            Arc::clone(&video_slot),
            FrameSampler::with_clock(config.video_fps, Arc::clone(&clock)),
            Arc::clone(&deps.detector),
            detection_tx,
            stop.token(),
        )
        .with_metrics(Arc::clone(&metrics));
        tasks.push(tokio::spawn(video.run()));

        let video_pump = Arc::clone(&emitter);
        tasks.push(tokio::spawn(async move {
            while let Some(event) = detection_rx.recv().await {
                video_pump.emit(&AnalysisEvent::Object(event)).await;
            }
        }));

        // Transcription path: queue -> chunker -> VAD gate -> rotating stream.
        let (transcript_tx, mut transcript_rx) =
            mpsc::channel::<TranscriptionEvent>(EVENT_CHANNEL_CAPACITY);
        let rotator = StreamRotator::new(
            Arc::clone(&deps.recognizer),
            RecognizerConfig {
                language: config.stt_language.clone(),
                sample_rate: config.audio_sample_rate,
                interim_results: true,
            },
            config.stt_max_duration(),
            config.overlap_chunks(),
            transcript_tx,
            Arc::clone(&clock),
        )
        .with_metrics(Arc::clone(&metrics));
        let stt = SpeechToTextProcessor::new(
            Arc::clone(&stt_queue),
            Box::new(PcmFrameAdapter::new(config.audio_sample_rate)),
            PcmChunker::new(config.audio_sample_rate, config.audio_frame_ms),
            vad,
            rotator,
            stop.token(),
        )
        .with_metrics(Arc::clone(&metrics));
        tasks.push(tokio::spawn(stt.run()));

        let transcript_pump = Arc::clone(&emitter);
        tasks.push(tokio::spawn(async move {
            while let Some(event) = transcript_rx.recv().await {
                transcript_pump.emit(&AnalysisEvent::Transcript(event)).await;
            }
        }));

        // Emotion path: queue -> window -> WAV -> classifier.
        let (emotion_tx, mut emotion_rx) = mpsc::channel::<EmotionEvent>(EVENT_CHANNEL_CAPACITY);
        let emotion = EmotionProcessor::new(
            Arc::clone(&emotion_queue),
            Box::new(PcmFrameAdapter::new(config.audio_sample_rate)),
            Arc::clone(&deps.classifier),
            config.emotion_window(),
            config.audio_sample_rate,
            emotion_tx,
            stop.token(),
        )
        .with_metrics(Arc::clone(&metrics));
        tasks.push(tokio::spawn(emotion.run()));

        let emotion_pump = Arc::clone(&emitter);
        tasks.push(tokio::spawn(async move {
            while let Some(event) = emotion_rx.recv().await {
                emotion_pump.emit(&AnalysisEvent::Emotion(event)).await;
            }
        }));

        if let Err(e) = state.transition(SessionState::Running) {
            warn!("[{}] {}", session.correlation_id(), e);
        }
        info!(
            "[{}] Pipeline started (fps: {}, window: {}s)",
            session.correlation_id(),
            config.video_fps,
            config.emotion_window_sec
        );

        Arc::new(Self {
            session,
            config,
            metrics,
            state,
            stop,
            video_slot,
            fanout,
            frame_index: AtomicU64::new(0),
            emitter,
            tasks: Mutex::new(tasks),
        })
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    /// Transport callback: one decoded video frame. Assigns the arrival
    /// index and stores the frame, displacing any stale one.
    pub fn on_video_frame(&self, image: BgrImage) {
        if self.stop.is_stopped() {
            return;
        }
        let index = self.frame_index.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics.record_video_received();
        if self.video_slot.put(VideoFrame::new(index, image)).is_some() {
            self.metrics.record_video_dropped();
        }
    }

    /// Transport callback: one decoded audio frame, fanned out to both
    /// analyzer queues.
    pub fn on_audio_frame(&self, frame: AudioFrame) {
        if self.stop.is_stopped() {
            return;
        }
        self.metrics.record_audio_received();
        let drops = self.fanout.put(frame);
        if drops.stt {
            self.metrics.record_stt_frame_dropped();
        }
        if drops.emotion {
            self.metrics.record_emotion_frame_dropped();
        }
    }

    /// Attach the client channel and announce the session after the init
    /// delay.
    pub fn attach_channel(self: &Arc<Self>, channel: Arc<dyn crate::channel::DataChannel>) {
        if channel.label() != self.config.detections_channel_label {
            debug!(
                "[{}] Ignoring channel with label {:?}",
                self.session.correlation_id(),
                channel.label()
            );
            return;
        }
        self.session.attach_channel(channel);

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(this.config.data_channel_init_delay()).await;
            this.emitter
                .emit(&AnalysisEvent::SessionStarted {
                    session_id: this.session.correlation_id().to_string(),
                    timestamp_ms: Utc::now().timestamp_millis(),
                    config: SessionConfigPayload {
                        max_resolution: this.config.max_resolution.clone(),
                        confidence_threshold: this.config.confidence_threshold,
                        idle_timeout_sec: this.config.idle_timeout_sec,
                    },
                })
                .await;
        });
    }

    /// Transport callback: the track ended. Stops every processor, closes
    /// the buffers, reports the summary, and closes the session. Safe to
    /// call more than once.
    pub async fn on_end(&self) {
        if self.state.transition(SessionState::Stopping).is_err() {
            return;
        }
        info!("[{}] Pipeline stopping", self.session.correlation_id());

        self.stop.stop();
        self.video_slot.close();
        self.fanout.close_all();

        let handles: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let joined = tokio::time::timeout(SHUTDOWN_BUDGET, async {
            for handle in handles {
                let _ = handle.await;
            }
        })
        .await;
        if joined.is_err() {
            warn!(
                "[{}] Shutdown budget exceeded, aborting remaining tasks",
                self.session.correlation_id()
            );
            for abort in aborts {
                abort.abort();
            }
        }

        // Report the summary while the channel is still open, then close.
        let summary = self.session.summary();
        self.emitter
            .emit(&AnalysisEvent::StreamClosed {
                session_id: self.session.correlation_id().to_string(),
                summary,
            })
            .await;
        self.session.close();

        if let Err(e) = self.state.transition(SessionState::Stopped) {
            warn!("[{}] {}", self.session.correlation_id(), e);
        }
        info!("[{}] Pipeline stopped", self.session.correlation_id());
    }
}
