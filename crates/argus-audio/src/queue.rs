use crate::frame::AudioFrame;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;

/// Bounded audio frame queue with drop-head overflow.
///
/// The producer never waits: when full, the oldest frame is evicted and
/// returned to the caller for accounting, and the running buffered-duration
/// counter is decremented by the evicted frame's length. Consumers wait
/// asynchronously; `close()` wakes them terminally once the queue drains.
pub struct AudioFrameQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

struct QueueState {
    frames: VecDeque<AudioFrame>,
    buffered: Duration,
    dropped: u64,
    closed: bool,
}

impl AudioFrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                frames: VecDeque::with_capacity(capacity.min(1024)),
                buffered: Duration::ZERO,
                dropped: 0,
                closed: false,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a frame, evicting the oldest if the queue is full. Returns
    /// the evicted frame, if any. Frames offered after `close()` are
    /// discarded.
    pub fn put(&self, frame: AudioFrame) -> Option<AudioFrame> {
        let evicted = {
            let mut st = self.state.lock();
            if st.closed {
                return None;
            }
            let evicted = if st.frames.len() >= self.capacity {
                let old = st.frames.pop_front();
                if let Some(ref f) = old {
                    st.buffered = st.buffered.saturating_sub(f.duration());
                    st.dropped += 1;
                }
                old
            } else {
                None
            };
            st.buffered += frame.duration();
            st.frames.push_back(frame);
            evicted
        };
        self.notify.notify_waiters();
        evicted
    }

    /// Dequeue one frame, waiting until one is available. Returns `None`
    /// once the queue is closed and drained.
    pub async fn get(&self) -> Option<AudioFrame> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut st = self.state.lock();
                if let Some(frame) = st.frames.pop_front() {
                    st.buffered = st.buffered.saturating_sub(frame.duration());
                    return Some(frame);
                }
                if st.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Collect frames until the accumulated audio duration reaches `target`
    /// or `timeout` elapses since the call started, whichever comes first.
    /// May return an empty vec on timeout; returns whatever was gathered
    /// when the queue closes.
    pub async fn get_many(&self, target: Duration, timeout: Duration) -> Vec<AudioFrame> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut collected = Vec::new();
        let mut accumulated = Duration::ZERO;

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut st = self.state.lock();
                while accumulated < target {
                    match st.frames.pop_front() {
                        Some(frame) => {
                            st.buffered = st.buffered.saturating_sub(frame.duration());
                            accumulated += frame.duration();
                            collected.push(frame);
                        }
                        None => break,
                    }
                }
                if accumulated >= target || st.closed {
                    return collected;
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return collected;
            }
        }
    }

    /// Mark the queue closed and wake all waiters. Already-buffered frames
    /// remain retrievable.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.state.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().frames.is_empty()
    }

    pub fn buffered_duration(&self) -> Duration {
        self.state.lock().buffered
    }

    pub fn dropped_count(&self) -> u64 {
        self.state.lock().dropped
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
