//! Session lifecycle state.
//!
//! `Uninitialized -> Initializing -> Ready -> Closed`. Transitions only move
//! forward and `Closed` is absorbing, so the state is a single atomic that is
//! advanced with `fetch_max`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SessionState {
    /// Built, handshake not started
    Uninitialized = 0,
    /// Handshake in flight
    Initializing = 1,
    /// Handshake complete; requests flow
    Ready = 2,
    /// Closed by the caller, by a failed handshake, or by connection loss
    Closed = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            2 => Self::Ready,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Uninitialized as u8),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// Move to `next` if it is strictly later than the current state.
    ///
    /// Returns `true` only for the caller that performed the transition.
    pub(crate) fn advance(&self, next: SessionState) -> bool {
        let previous = self.state.fetch_max(next as u8, Ordering::SeqCst);
        let transitioned = previous < next as u8;
        if transitioned {
            tracing::debug!(
                "Session state: {} -> {}",
                SessionState::from_u8(previous),
                next
            );
        }
        transitioned
    }

    /// Advance from exactly `from` to `to`.
    pub(crate) fn transition(&self, from: SessionState, to: SessionState) -> bool {
        let swapped = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if swapped {
            tracing::debug!("Session state: {} -> {}", from, to);
        }
        swapped
    }

    pub(crate) fn close(&self) -> bool {
        self.advance(SessionState::Closed)
    }
}
