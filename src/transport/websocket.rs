//! WebSocket provider backed by `tokio-tungstenite`.
//!
//! Each [`WsSocket`] owns at most one live link. `reconnect()` tears the old
//! link down and spawns a tokio task that connects, emits
//! [`SocketEvent::Open`], forwards text frames as [`SocketEvent::Message`]
//! and emits [`SocketEvent::Close`] once the stream ends.
//!
//! # Event Loop
//!
//! The link task handles:
//!
//! - Incoming frames from the device
//! - Outgoing frames queued by [`Socket::send`]
//! - Close detection (remote close, stream error, failed connect)
//!
//! Links are numbered. A task whose number is no longer current stops
//! emitting events, so a replaced link never reaches the bound handler.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::{Socket, SocketEvent, SocketHandler, SocketProvider, SocketState};

// ============================================================================
// Types
// ============================================================================

/// Commands for the link task.
enum LinkCommand {
    /// Write a text frame.
    Send(String),
    /// Close the stream without emitting `Close`.
    Close,
}

/// State of the current link.
///
/// The handler lives beside the epoch so an event is checked and routed
/// under one lock.
struct Link {
    /// Number of the current link.
    epoch: u64,
    /// Bound event handler.
    handler: Option<SocketHandler>,
    /// Connection state.
    state: SocketState,
    /// Writer channel of the current link.
    outgoing: Option<mpsc::UnboundedSender<LinkCommand>>,
}

/// Shared state between a socket and its link task.
struct WsInner {
    /// Endpoint to connect to.
    endpoint: Url,
    /// Current link.
    link: Mutex<Link>,
}

// ============================================================================
// WsProvider
// ============================================================================

/// Socket provider for `ws://` and `wss://` endpoints.
///
/// Sockets are cached per endpoint: asking twice for the same URL returns
/// the same socket, and `reconnect()` on it replaces its link.
#[derive(Default)]
pub struct WsProvider {
    /// Sockets by endpoint.
    sockets: Mutex<FxHashMap<Url, Arc<WsSocket>>>,
}

impl WsProvider {
    /// Creates a provider with no cached sockets.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SocketProvider for WsProvider {
    fn socket_for(&self, endpoint: &Url) -> Result<Arc<dyn Socket>> {
        match endpoint.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::provider(format!(
                    "unsupported endpoint scheme: {other}"
                )));
            }
        }

        let mut sockets = self.sockets.lock();
        let socket = sockets
            .entry(endpoint.clone())
            .or_insert_with(|| Arc::new(WsSocket::new(endpoint.clone())));

        trace!(%endpoint, "Socket handed out");
        Ok(Arc::clone(socket) as Arc<dyn Socket>)
    }
}

// ============================================================================
// WsSocket
// ============================================================================

/// A WebSocket connection to one endpoint.
pub struct WsSocket {
    inner: Arc<WsInner>,
}

impl WsSocket {
    /// Creates an unconnected socket for `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            inner: Arc::new(WsInner {
                endpoint,
                link: Mutex::new(Link {
                    epoch: 0,
                    handler: None,
                    state: SocketState::Closed,
                    outgoing: None,
                }),
            }),
        }
    }

    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

impl Socket for WsSocket {
    /// Binds `handler` and retires any live link, so nothing the old link
    /// still emits reaches the new handler.
    fn bind(&self, handler: SocketHandler) {
        let mut link = self.inner.link.lock();
        if let Some(previous) = link.outgoing.take() {
            let _ = previous.send(LinkCommand::Close);
            link.epoch += 1;
            link.state = SocketState::Closed;
            debug!(epoch = link.epoch, "Live link retired by rebind");
        }
        link.handler = Some(handler);
    }

    fn unbind(&self) {
        self.inner.link.lock().handler = None;
    }

    fn send(&self, data: &str) -> Result<()> {
        let link = self.inner.link.lock();

        if link.state != SocketState::Open {
            return Err(Error::transport(format!(
                "socket is not open ({:?})",
                link.state
            )));
        }

        let Some(outgoing) = &link.outgoing else {
            return Err(Error::transport("socket has no writer"));
        };

        outgoing
            .send(LinkCommand::Send(data.to_string()))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn reconnect(&self) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::provider(format!("no async runtime: {e}")))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let epoch = {
            let mut link = self.inner.link.lock();
            if let Some(previous) = link.outgoing.replace(command_tx) {
                let _ = previous.send(LinkCommand::Close);
            }
            link.epoch += 1;
            link.state = SocketState::Connecting;
            link.epoch
        };

        debug!(endpoint = %self.inner.endpoint, epoch, "WebSocket connecting");

        runtime.spawn(run_link(
            Arc::downgrade(&self.inner),
            self.inner.endpoint.clone(),
            epoch,
            command_rx,
        ));

        Ok(())
    }

    fn state(&self) -> SocketState {
        self.inner.link.lock().state
    }

    fn close(&self) {
        let mut link = self.inner.link.lock();
        if let Some(outgoing) = link.outgoing.take() {
            let _ = outgoing.send(LinkCommand::Close);
        }
        link.epoch += 1;
        link.state = SocketState::Closed;
    }
}

// ============================================================================
// WsInner
// ============================================================================

impl WsInner {
    /// Emits an event if `epoch` is still the current link.
    fn emit(&self, epoch: u64, event: SocketEvent) {
        let handler = {
            let link = self.link.lock();
            if link.epoch != epoch {
                trace!(epoch, ?event, "Dropping event from replaced link");
                return;
            }
            link.handler.clone()
        };

        match handler {
            Some(handler) => handler(event),
            None => trace!(?event, "No handler bound"),
        }
    }

    /// Marks the link open. Returns `false` if it was replaced meanwhile.
    fn mark_open(&self, epoch: u64) -> bool {
        let mut link = self.link.lock();
        if link.epoch != epoch {
            return false;
        }
        link.state = SocketState::Open;
        true
    }

    /// Marks the link closed and emits `Close` if it is still current.
    fn finish(&self, epoch: u64) {
        {
            let mut link = self.link.lock();
            if link.epoch != epoch {
                return;
            }
            link.state = SocketState::Closed;
            link.outgoing = None;
        }
        self.emit(epoch, SocketEvent::Close);
    }
}

// ============================================================================
// Link Task
// ============================================================================

/// Connects and pumps one link until it closes or is replaced.
///
/// Holds only a weak reference so a dropped socket ends its task.
async fn run_link(
    inner: Weak<WsInner>,
    endpoint: Url,
    epoch: u64,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
) {
    let ws_stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(%endpoint, epoch, error = %e, "WebSocket connect failed");
            if let Some(inner) = inner.upgrade() {
                inner.finish(epoch);
            }
            return;
        }
    };

    match inner.upgrade() {
        Some(inner) if inner.mark_open(epoch) => {
            info!(%endpoint, epoch, "WebSocket connection established");
            inner.emit(epoch, SocketEvent::Open);
        }
        _ => {
            debug!(epoch, "Link replaced before it opened");
            return;
        }
    }

    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            // Incoming frames from the device
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        inner.emit(epoch, SocketEvent::Message(text.as_str().to_owned()));
                    }

                    Some(Ok(Message::Close(_))) => {
                        debug!(epoch, "WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        warn!(epoch, error = %e, "WebSocket error");
                        break;
                    }

                    None => {
                        debug!(epoch, "WebSocket stream ended");
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            // Writes queued by Socket::send
            command = command_rx.recv() => {
                match command {
                    Some(LinkCommand::Send(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            warn!(epoch, error = %e, "WebSocket write failed");
                            break;
                        }
                        trace!(epoch, "Frame written");
                    }

                    Some(LinkCommand::Close) | None => {
                        let _ = ws_write.close().await;
                        debug!(epoch, "Link closed locally");
                        return;
                    }
                }
            }
        }
    }

    if let Some(inner) = inner.upgrade() {
        inner.finish(epoch);
    }
    debug!(epoch, "Link task terminated");
}

// ============================================================================
// Tests
// ============================================================================
