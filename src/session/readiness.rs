//! Per-generation readiness signal.
//!
//! Every (re)connect creates a fresh [`Readiness`]. It resolves once, either
//! to `Ready` or `Failed`. When a newer generation replaces it, it moves to
//! `Superseded` and every waiter is released with
//! [`Error::Superseded`](crate::Error::Superseded) instead of hanging.

use tokio::sync::watch;

use crate::error::{Error, Result};

// ============================================================================
// ReadyState
// ============================================================================

/// State of a readiness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Connection not usable yet.
    Pending,
    /// Connection opened and settled.
    Ready,
    /// Connection could not be established.
    Failed,
    /// A newer generation replaced this one.
    Superseded,
}

// ============================================================================
// Readiness
// ============================================================================

/// Single-resolution signal for one connection generation.
#[derive(Debug)]
pub struct Readiness {
    generation: u64,
    state: watch::Sender<ReadyState>,
}

impl Readiness {
    /// Creates a pending signal for `generation`.
    #[must_use]
    pub(crate) fn new(generation: u64) -> Self {
        let (state, _) = watch::channel(ReadyState::Pending);
        Self { generation, state }
    }

    /// Returns the generation this signal belongs to.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ReadyState {
        *self.state.borrow()
    }

    /// Resolves to `Ready`. No-op unless pending.
    pub(crate) fn resolve(&self) -> bool {
        self.settle(ReadyState::Ready)
    }

    /// Resolves to `Failed`. No-op unless pending.
    pub(crate) fn fail(&self) -> bool {
        self.settle(ReadyState::Failed)
    }

    /// Invalidates the signal, whatever it resolved to.
    pub(crate) fn supersede(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ReadyState::Superseded {
                return false;
            }
            *state = ReadyState::Superseded;
            true
        })
    }

    fn settle(&self, next: ReadyState) -> bool {
        self.state.send_if_modified(|state| {
            if *state != ReadyState::Pending {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Waits until the signal leaves `Pending`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection failed to establish
    /// - [`Error::Superseded`] if a newer generation replaced this one
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| *state != ReadyState::Pending)
            .await
            .map(|state| *state)
            .unwrap_or(ReadyState::Superseded);

        match state {
            ReadyState::Ready => Ok(()),
            ReadyState::Failed => Err(Error::NotConnected),
            ReadyState::Pending | ReadyState::Superseded => {
                Err(Error::superseded(self.generation))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
