use crate::events::AnalysisEvent;
use crate::http_sink::SinkClient;
use crate::session::Session;
use std::sync::Arc;
use tracing::{debug, warn};

/// Channel-side sink: serialize-and-send to the session's data channel if
/// one is attached and open; otherwise drop silently.
pub struct DataChannelSink {
    session: Arc<Session>,
}

impl DataChannelSink {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn send(&self, json: &str) {
        let Some(channel) = self.session.channel() else {
            debug!(
                "[{}] No data channel attached, dropping event",
                self.session.correlation_id()
            );
            return;
        };
        if !channel.is_open() {
            debug!(
                "[{}] Data channel not open, dropping event",
                self.session.correlation_id()
            );
            return;
        }
        if let Err(e) = channel.send(json) {
            debug!(
                "[{}] Data channel send failed: {}",
                self.session.correlation_id(),
                e
            );
            self.session.metrics().record_channel_failure();
        }
    }
}

/// Fans each event out to both sinks.
///
/// The data channel send happens inline on the calling task, preserving
/// per-processor order; the HTTP forward is fire-and-forget on a spawned
/// task so it can never block or fail the channel path. Both sinks are
/// attempted exactly once per event.
pub struct Emitter {
    session: Arc<Session>,
    channel_sink: DataChannelSink,
    sink: Arc<dyn SinkClient>,
}

impl Emitter {
    pub fn new(session: Arc<Session>, sink: Arc<dyn SinkClient>) -> Self {
        Self {
            channel_sink: DataChannelSink::new(Arc::clone(&session)),
            session,
            sink,
        }
    }

    pub async fn emit(&self, event: &AnalysisEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!(
                    "[{}] Event serialization failed: {}",
                    self.session.correlation_id(),
                    e
                );
                return;
            }
        };

        self.channel_sink.send(&json);

        if let Some(path) = event.forward_path() {
            let sink = Arc::clone(&self.sink);
            let correlation_id = self.session.correlation_id().to_string();
            let metrics = self.session.metrics();
            tokio::spawn(async move {
                if let Err(e) = sink.post(path, json, &correlation_id).await {
                    warn!("[{}] Event forward failed: {}", correlation_id, e);
                    metrics.record_http_failure();
                }
            });
        }
    }
}
