//! Per-session lifecycle state

use std::sync::{Arc, Mutex, PoisonError};

/// Lifecycle of one extraction session
///
/// `Opening -> Streaming -> {Completed, Failed}`, with `Cancelled` reachable
/// from either non-terminal state. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Opening,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    fn can_become(&self, next: SessionState) -> bool {
        match (self, next) {
            (Self::Opening, Self::Streaming) => true,
            (Self::Opening | Self::Streaming, next) => next.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Opening => "opening",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// State shared between the producer and the subscriber of a session
#[derive(Debug, Clone)]
pub(crate) struct SessionStatus(Arc<Mutex<SessionState>>);

impl SessionStatus {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(SessionState::Opening)))
    }

    pub(crate) fn get(&self) -> SessionState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` if the lifecycle allows it, returning whether it moved
    pub(crate) fn transition(&self, next: SessionState) -> bool {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if state.can_become(next) {
            log::trace!("Session {} -> {}", *state, next);
            *state = next;
            true
        } else {
            false
        }
    }
}
