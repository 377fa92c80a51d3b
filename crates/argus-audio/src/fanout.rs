use crate::frame::AudioFrame;
use crate::queue::AudioFrameQueue;
use std::sync::Arc;

/// Delivery report for one fanned-out frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutDrops {
    pub stt: bool,
    pub emotion: bool,
}

/// Fans each incoming audio frame out to both analyzer queues.
///
/// Frames are delivered as-is; each consumer runs its own adapter so one
/// analyzer's decode state never couples with the other's. A drop in one
/// queue is recorded but never short-circuits delivery to the other.
pub struct AudioFanOut {
    stt: Arc<AudioFrameQueue>,
    emotion: Arc<AudioFrameQueue>,
}

impl AudioFanOut {
    pub fn new(stt: Arc<AudioFrameQueue>, emotion: Arc<AudioFrameQueue>) -> Self {
        Self { stt, emotion }
    }

    pub fn put(&self, frame: AudioFrame) -> FanOutDrops {
        let stt_dropped = self.stt.put(frame.clone()).is_some();
        let emotion_dropped = self.emotion.put(frame).is_some();
        FanOutDrops {
            stt: stt_dropped,
            emotion: emotion_dropped,
        }
    }

    pub fn stt_queue(&self) -> Arc<AudioFrameQueue> {
        Arc::clone(&self.stt)
    }

    pub fn emotion_queue(&self) -> Arc<AudioFrameQueue> {
        Arc::clone(&self.emotion)
    }

    pub fn close_all(&self) {
        self.stt.close();
        self.emotion.close();
    }
}
