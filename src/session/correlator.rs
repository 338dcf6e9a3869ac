//! Request/response correlation by message name.
//!
//! [`Session::wait_for_response`] registers a one-shot bus listener *before*
//! the request is sent, so a reply arriving right after the send is never
//! missed. The returned [`PendingResponse`] resolves with the first inbound
//! message carrying that name.

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::InboundMessage;

use super::bus::{ListenerId, MessageBus};
use super::core::Session;

// ============================================================================
// PendingResponse
// ============================================================================

/// Awaitable reply to a request.
///
/// Dropping it before the reply arrives, or timing out, unregisters the
/// listener.
pub struct PendingResponse {
    name: String,
    id: ListenerId,
    rx: Option<oneshot::Receiver<InboundMessage>>,
    bus: Arc<MessageBus>,
    default_timeout: Option<Duration>,
}

impl fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

impl PendingResponse {
    /// Returns the awaited message name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the listener id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Waits for the reply using the session's configured timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ResponseTimeout`] if a timeout is configured and elapses
    /// - [`Error::Shutdown`] if the session shut down first
    pub async fn recv(self) -> Result<InboundMessage> {
        let timeout = self.default_timeout;
        self.recv_with(timeout).await
    }

    /// Waits for the reply for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Same as [`recv`](Self::recv).
    pub async fn recv_timeout(self, timeout: Duration) -> Result<InboundMessage> {
        self.recv_with(Some(timeout)).await
    }

    /// Waits for the reply, bounded by `timeout` when given.
    ///
    /// # Errors
    ///
    /// Same as [`recv`](Self::recv).
    pub async fn recv_with(mut self, timeout: Option<Duration>) -> Result<InboundMessage> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(Error::Shutdown);
        };

        let received = match timeout {
            None => rx.await,
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    let timeout_ms = limit.as_millis() as u64;
                    debug!(name = %self.name, timeout_ms, "Response timed out");
                    return Err(Error::response_timeout(self.name.clone(), timeout_ms));
                }
            },
        };

        self.rx = None;
        received.map_err(|_| Error::Shutdown)
    }
}

impl IntoFuture for PendingResponse {
    type Output = Result<InboundMessage>;
    type IntoFuture = BoxFuture<'static, Result<InboundMessage>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.recv())
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        if self.rx.is_some() {
            self.bus.remove(self.id);
        }
    }
}

// ============================================================================
// Session - Correlation
// ============================================================================

impl Session {
    /// Registers interest in the next message named `name`.
    ///
    /// Registration happens synchronously, so call this before sending the
    /// request the reply belongs to.
    #[must_use = "dropping the PendingResponse unregisters the listener"]
    pub fn wait_for_response(&self, name: impl Into<String>) -> PendingResponse {
        let name = name.into();
        let (tx, rx) = oneshot::channel();

        let id = self.inner.bus.register(
            name.clone(),
            Box::new(move |message| {
                let _ = tx.send(message);
            }),
        );

        PendingResponse {
            name,
            id,
            rx: Some(rx),
            bus: Arc::clone(&self.inner.bus),
            default_timeout: self.inner.config.response_timeout,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
