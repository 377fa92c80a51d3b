use crate::frame::VideoFrame;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Single-slot video buffer: at most one pending frame per session.
///
/// A `put` against an occupied slot discards the resident frame and keeps
/// the newcomer, because low-latency vision prefers the freshest frame to
/// a queue of stale ones. The consumer waits asynchronously; `close()`
/// wakes it terminally and discards any resident frame.
pub struct VideoFrameSlot {
    state: Mutex<SlotState>,
    notify: Notify,
}

struct SlotState {
    frame: Option<VideoFrame>,
    closed: bool,
    dropped: u64,
}

impl Default for VideoFrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoFrameSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                frame: None,
                closed: false,
                dropped: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Store a frame, returning the one it displaced, if any.
    pub fn put(&self, frame: VideoFrame) -> Option<VideoFrame> {
        let displaced = {
            let mut st = self.state.lock();
            if st.closed {
                return None;
            }
            let displaced = st.frame.replace(frame);
            if displaced.is_some() {
                st.dropped += 1;
            }
            displaced
        };
        self.notify.notify_waiters();
        displaced
    }

    /// Take the pending frame, waiting until one arrives. Returns `None`
    /// once closed.
    pub async fn get(&self) -> Option<VideoFrame> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut st = self.state.lock();
                if let Some(frame) = st.frame.take() {
                    return Some(frame);
                }
                if st.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().frame.is_none()
    }

    pub fn dropped_count(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Close and discard any resident frame; the slot holds at most one,
    /// so there is nothing to drain.
    pub fn close(&self) {
        {
            let mut st = self.state.lock();
            st.closed = true;
            st.frame = None;
        }
        self.notify.notify_waiters();
    }
}
