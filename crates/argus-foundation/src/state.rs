use crate::error::PipelineError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Initializing,
    Running,
    Stopping,
    Stopped,
}

/// Tracks one session's lifecycle and broadcasts transitions to observers.
pub struct StateManager {
    state: Arc<RwLock<SessionState>>,
    state_tx: Sender<SessionState>,
    state_rx: Receiver<SessionState>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(SessionState::Initializing)),
            state_tx,
            state_rx,
        }
    }

    pub fn transition(&self, new_state: SessionState) -> Result<(), PipelineError> {
        let mut current = self.state.write();

        let valid = matches!(
            (&*current, &new_state),
            (SessionState::Initializing, SessionState::Running)
                | (SessionState::Initializing, SessionState::Stopping)
                | (SessionState::Running, SessionState::Stopping)
                | (SessionState::Stopping, SessionState::Stopped)
        );

        if !valid {
            return Err(PipelineError::Fatal(format!(
                "Invalid state transition: {:?} -> {:?}",
                *current, new_state
            )));
        }

        tracing::debug!("Session state transition: {:?} -> {:?}", *current, new_state);
        *current = new_state.clone();
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> Receiver<SessionState> {
        self.state_rx.clone()
    }
}
