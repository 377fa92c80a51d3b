use argus_foundation::clock::{Clock, RealClock};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Rate governor for the video path: `should_process` answers true at most
/// once per `1/fps` seconds. Thread-safe; the first frame always passes.
pub struct FrameSampler {
    interval: Duration,
    last: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl FrameSampler {
    pub fn new(fps: u32) -> Self {
        Self::with_clock(fps, Arc::new(RealClock::new()))
    }

    pub fn with_clock(fps: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            last: Mutex::new(None),
            clock,
        }
    }

    pub fn should_process(&self) -> bool {
        let now = self.clock.now();
        let mut last = self.last.lock();
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
