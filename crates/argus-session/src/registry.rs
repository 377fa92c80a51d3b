use crate::session::Session;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Process-wide map of live sessions keyed by correlation id.
///
/// All operations are total: creating over an existing id replaces and
/// closes the prior session, closing an absent id is a no-op. Mutations
/// are serialized by an internal lock; `all()` returns a consistent
/// snapshot.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, correlation_id: &str) -> Arc<Session> {
        let session = Arc::new(Session::new(correlation_id));
        let previous = self
            .sessions
            .lock()
            .insert(correlation_id.to_string(), Arc::clone(&session));
        if let Some(previous) = previous {
            info!(
                "[{}] Duplicate session id, closing prior session",
                correlation_id
            );
            previous.close();
        }
        session
    }

    pub fn get(&self, correlation_id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().get(correlation_id).cloned()
    }

    pub fn close(&self, correlation_id: &str) {
        if let Some(session) = self.sessions.lock().remove(correlation_id) {
            session.close();
        }
    }

    pub fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Close every session and empty the registry. Called once at process
    /// shutdown after the transport stops accepting offers.
    pub fn shutdown(&self) {
        let drained: Vec<_> = self.sessions.lock().drain().collect();
        info!("Closing {} active sessions", drained.len());
        for (_, session) in drained {
            session.close();
        }
    }
}
