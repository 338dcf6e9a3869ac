//! Connection lifecycle: reconnect, event handling, scheduled recovery.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::notify::{FaultCategory, FaultNotifier, NotificationSink};
use crate::protocol::InboundMessage;
use crate::transport::{Socket, SocketEvent, SocketHandler, SocketProvider};

use super::bus::MessageBus;
use super::readiness::{Readiness, ReadyState};

// ============================================================================
// Constants
// ============================================================================

/// Shown when the provider cannot produce a connection.
const ESTABLISH_FAILED_MESSAGE: &str =
    "There was a problem establishing communication with the device";

/// Shown when the connection closes.
const CONNECTION_CLOSED_MESSAGE: &str =
    "There seems to be a problem connecting to the instrument (connection keeps closing)";

/// Display duration of the connection-closed notification.
const CONNECTION_CLOSED_DURATION: Duration = Duration::from_secs(10);

// ============================================================================
// Phase
// ============================================================================

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No connection, or the last one closed.
    Disconnected,
    /// Connect issued, `open` not seen yet.
    Connecting,
    /// Socket reported `open`.
    Open,
}

// ============================================================================
// Types
// ============================================================================

/// Mutable connection state, changed only at lifecycle transitions.
struct SessionState {
    /// Generation of the current connection.
    generation: u64,
    /// Current socket, if one was established.
    socket: Option<Arc<dyn Socket>>,
    /// Readiness of the current generation.
    readiness: Arc<Readiness>,
    /// Lifecycle phase.
    phase: Phase,
    /// Closes since the last successful open.
    consecutive_closes: u32,
}

/// Shared state behind every [`Session`] clone.
pub(crate) struct SessionInner {
    pub(crate) config: SessionConfig,
    provider: Arc<dyn SocketProvider>,
    pub(crate) bus: Arc<MessageBus>,
    pub(crate) notifier: Arc<FaultNotifier>,
    state: Mutex<SessionState>,
    /// Runtime for timers; event handlers may run on foreign threads.
    runtime: Option<Handle>,
    /// Set while a reconnect timer is pending.
    reconnect_scheduled: AtomicBool,
    shutdown: AtomicBool,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(socket) = self.state.get_mut().socket.take() {
            socket.unbind();
            socket.close();
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Persistent connection to one device.
///
/// Owns the current socket and its readiness, rebinds handlers on every
/// reconnect and recovers from closes on its own. Cloning is cheap; all
/// clones share one connection.
///
/// # Example
///
/// ```ignore
/// let session = Session::connect(config, Arc::new(WsProvider::new()), Arc::new(TracingSink::new()));
///
/// let reply = session.wait_for_response("status");
/// session.send(Command::new("status")).await?;
/// let status = reply.recv().await?;
/// ```
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Session")
            .field("endpoint", &self.inner.config.endpoint.as_str())
            .field("generation", &state.generation)
            .field("phase", &state.phase)
            .field("pending", &self.inner.bus.pending_count())
            .finish()
    }
}

// ============================================================================
// Session - Constructors
// ============================================================================

impl Session {
    /// Creates a session without connecting.
    ///
    /// Captures the current tokio runtime, if any, for settle and reconnect
    /// timers.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        provider: Arc<dyn SocketProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let notifier = Arc::new(FaultNotifier::from_config(&config, sink));

        Self {
            inner: Arc::new(SessionInner {
                config,
                provider,
                bus: Arc::new(MessageBus::new()),
                notifier,
                state: Mutex::new(SessionState {
                    generation: 0,
                    socket: None,
                    readiness: Arc::new(Readiness::new(0)),
                    phase: Phase::Disconnected,
                    consecutive_closes: 0,
                }),
                runtime: Handle::try_current().ok(),
                reconnect_scheduled: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a session and issues the first connect.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn connect(
        config: SessionConfig,
        provider: Arc<dyn SocketProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let session = Self::new(config, provider, sink);
        session.reconnect();
        session
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Replaces the current connection with a new one.
    ///
    /// Detaches the old socket, supersedes its readiness, binds a handler to
    /// a fresh socket and issues the connect. A provider failure is notified
    /// once (unthrottled) and leaves the session without a connection until
    /// the next call.
    pub fn reconnect(&self) {
        if self.is_shut_down() {
            debug!("Reconnect ignored after shutdown");
            return;
        }

        info!(endpoint = %self.inner.config.endpoint, "Attempting to (re)connect");

        let (generation, readiness) = {
            let mut state = self.inner.state.lock();

            if let Some(previous) = state.socket.take() {
                previous.unbind();
            }
            state.readiness.supersede();

            state.generation += 1;
            state.readiness = Arc::new(Readiness::new(state.generation));
            state.phase = Phase::Connecting;

            (state.generation, Arc::clone(&state.readiness))
        };

        match self.establish(generation) {
            Ok(socket) => {
                let mut state = self.inner.state.lock();
                if state.generation == generation {
                    state.socket = Some(socket);
                    debug!(generation, "Connection installed");
                } else if !state
                    .socket
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &socket))
                {
                    // Providers may hand out the same socket again
                    socket.unbind();
                }
            }

            Err(e) => {
                warn!(generation, error = %e, "Failed to establish connection");
                readiness.fail();
                {
                    let mut state = self.inner.state.lock();
                    if state.generation == generation {
                        state.phase = Phase::Disconnected;
                    }
                }
                self.inner.notifier.notify_now(ESTABLISH_FAILED_MESSAGE);
            }
        }
    }

    /// Shuts the session down.
    ///
    /// Detaches and closes the socket, releases readiness waiters, fails
    /// every pending response with [`Error::Shutdown`] and stops scheduled
    /// reconnects.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        let socket = {
            let mut state = self.inner.state.lock();
            state.readiness.supersede();
            state.phase = Phase::Disconnected;
            state.socket.take()
        };

        if let Some(socket) = socket {
            socket.unbind();
            socket.close();
        }

        let dropped = self.inner.bus.clear();
        info!(dropped, "Session shut down");
    }

    /// Obtains a socket, binds the handler and issues the connect.
    fn establish(&self, generation: u64) -> Result<Arc<dyn Socket>> {
        let socket = self.inner.provider.socket_for(&self.inner.config.endpoint)?;
        socket.bind(self.handler_for(generation));

        if let Err(e) = socket.reconnect() {
            socket.unbind();
            return Err(e);
        }

        Ok(socket)
    }

    /// Builds the event handler for one generation.
    ///
    /// Holds the session weakly so a bound socket never keeps it alive.
    fn handler_for(&self, generation: u64) -> SocketHandler {
        let inner = Arc::downgrade(&self.inner);

        Arc::new(move |event| {
            if let Some(inner) = inner.upgrade() {
                Session { inner }.handle_event(generation, event);
            }
        })
    }

    fn handle_event(&self, generation: u64, event: SocketEvent) {
        match event {
            SocketEvent::Open => self.on_open(generation),
            SocketEvent::Message(raw) => {
                if self.generation() != generation {
                    trace!(generation, "Ignoring message from stale connection");
                    return;
                }
                self.on_message(&raw);
            }
            SocketEvent::Close => self.on_close(generation),
        }
    }

    /// Spawns `task` on the captured runtime, or the current one.
    ///
    /// Returns `false` if neither is available.
    fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = self
            .inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok());

        match runtime {
            Some(runtime) => {
                runtime.spawn(task);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Session - Event Handlers
// ============================================================================

impl Session {
    /// Marks the connection open and resolves readiness after the settle delay.
    fn on_open(&self, generation: u64) {
        let readiness = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                trace!(generation, "Ignoring open from stale connection");
                return;
            }
            state.phase = Phase::Open;
            state.consecutive_closes = 0;
            Arc::clone(&state.readiness)
        };

        debug!(generation, "Connection opened");

        let settle_delay = self.inner.config.settle_delay;
        if settle_delay.is_zero() {
            readiness.resolve();
            return;
        }

        let settled = Arc::clone(&readiness);
        let spawned = self.spawn(async move {
            tokio::time::sleep(settle_delay).await;
            if settled.resolve() {
                debug!(generation, "Connection ready");
            }
        });

        if !spawned {
            warn!(generation, "No runtime for settle delay, ready immediately");
            readiness.resolve();
        }
    }

    /// Parses a frame, dispatches it and reports device faults.
    fn on_message(&self, raw: &str) {
        let message = match InboundMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, raw, "Dropping unparseable message");
                return;
            }
        };

        let fired = self.inner.bus.dispatch(&message);
        trace!(name = message.name(), fired, "Message received");

        if message.is_device_fault() {
            let detail = message.error_detail();
            warn!(detail = ?detail, "Got error message from device");

            let text = match detail {
                Some(detail) => format!("Received error notification from device: {detail}"),
                None => "Received error notification from device.".to_string(),
            };
            self.inner.notifier.notify(FaultCategory::RemoteError, text);
        }
    }

    /// Reports the close and schedules recovery.
    fn on_close(&self, generation: u64) {
        let attempt = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                trace!(generation, "Ignoring close from stale connection");
                return;
            }
            state.phase = Phase::Disconnected;
            let attempt = state.consecutive_closes;
            state.consecutive_closes = state.consecutive_closes.saturating_add(1);
            attempt
        };

        warn!(generation, "Connection closed");

        self.inner.notifier.notify_with(
            FaultCategory::ConnectionClosed,
            CONNECTION_CLOSED_MESSAGE,
            CONNECTION_CLOSED_DURATION,
        );

        let delay = self.inner.config.reconnect.delay_for(attempt);
        self.schedule_reconnect(generation, delay);
    }

    /// Schedules one reconnect after `delay`; later closes coalesce into it.
    ///
    /// Skipped if another reconnect already produced a newer, open connection.
    fn schedule_reconnect(&self, closed_generation: u64, delay: Duration) {
        if self.inner.reconnect_scheduled.swap(true, Ordering::AcqRel) {
            debug!(closed_generation, "Reconnect already scheduled");
            return;
        }

        debug!(closed_generation, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");

        let inner = Arc::downgrade(&self.inner);
        let spawned = self.spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = inner.upgrade() else {
                return;
            };
            inner.reconnect_scheduled.store(false, Ordering::Release);

            let session = Session { inner };
            if session.generation() != closed_generation && session.phase() == Phase::Open {
                debug!(closed_generation, "Connection already re-established");
                return;
            }
            session.reconnect();
        });

        if !spawned {
            self.inner.reconnect_scheduled.store(false, Ordering::Release);
            warn!(closed_generation, "No runtime to schedule reconnect");
        }
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the configured endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.config.endpoint
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Returns the generation of the current connection.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Returns the lifecycle phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// Returns `true` once the current connection has settled.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readiness().state() == ReadyState::Ready
    }

    /// Returns `true` after [`shutdown`](Self::shutdown).
    #[inline]
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Returns the readiness of the current generation.
    #[inline]
    #[must_use]
    pub fn readiness(&self) -> Arc<Readiness> {
        Arc::clone(&self.inner.state.lock().readiness)
    }

    /// Returns the current socket.
    #[inline]
    #[must_use]
    pub(crate) fn current_socket(&self) -> Option<Arc<dyn Socket>> {
        self.inner.state.lock().socket.clone()
    }

    /// Returns the message bus.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.inner.bus
    }

    /// Returns the fault notifier.
    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &FaultNotifier {
        &self.inner.notifier
    }

    /// Waits for the current generation to become ready.
    ///
    /// # Errors
    ///
    /// - [`Error::Superseded`] if a reconnect replaced the generation
    /// - [`Error::NotConnected`] if the connection could not be established
    /// - [`Error::Shutdown`] if the session is shut down
    pub async fn ready(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::Shutdown);
        }
        self.readiness().wait().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::sleep;

    use crate::config::ReconnectPolicy;
    use crate::testutil::{MockProvider, RecordingSink, test_config};

    fn connect(provider: &Arc<MockProvider>) -> (Session, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let session = Session::connect(test_config(), provider.clone(), sink.clone());
        (session, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_settle_delay() {
        let provider = Arc::new(MockProvider::new());
        let (session, _sink) = connect(&provider);

        assert_eq!(session.generation(), 1);
        assert_eq!(session.phase(), Phase::Open);
        assert!(provider.latest().is_bound());

        sleep(Duration::from_millis(49)).await;
        assert!(!session.is_ready());

        sleep(Duration::from_millis(2)).await;
        assert!(session.is_ready());
        session.ready().await.expect("ready");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_reconnects_once_after_backoff() {
        let provider = Arc::new(MockProvider::new());
        let (session, sink) = connect(&provider);
        let first = provider.latest();

        first.emit_close();
        assert_eq!(session.phase(), Phase::Disconnected);
        assert_eq!(sink.contents(), vec![CONNECTION_CLOSED_MESSAGE]);
        assert_eq!(sink.last().expect("shown").duration, CONNECTION_CLOSED_DURATION);

        sleep(Duration::from_millis(14_900)).await;
        assert_eq!(provider.socket_count(), 1);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(provider.socket_count(), 2);
        assert_eq!(session.generation(), 2);

        let second = provider.latest();
        assert!(!first.is_bound());
        assert!(second.is_bound());
        assert_eq!(second.reconnect_calls(), 1);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(provider.socket_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_closes_coalesce() {
        let provider = Arc::new(MockProvider::new());
        let (_session, sink) = connect(&provider);
        let socket = provider.latest();

        socket.emit_close();
        sleep(Duration::from_secs(3)).await;
        socket.emit_close();

        sleep(Duration::from_secs(13)).await;
        assert_eq!(provider.socket_count(), 2);
        assert_eq!(sink.shown_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_grows_until_open() {
        let provider = Arc::new(MockProvider::manual());
        let config = test_config().with_reconnect(ReconnectPolicy::exponential(
            Duration::from_secs(1),
            Duration::from_secs(4),
        ));
        let _session = Session::connect(config, provider.clone(), Arc::new(RecordingSink::new()));

        // 1s, then 2s, then 4s between attempts
        provider.latest().emit_close();
        sleep(Duration::from_millis(1_100)).await;
        assert_eq!(provider.socket_count(), 2);

        provider.latest().emit_close();
        sleep(Duration::from_millis(1_100)).await;
        assert_eq!(provider.socket_count(), 2);
        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(provider.socket_count(), 3);

        // A successful open resets the backoff
        provider.latest().emit_open();
        provider.latest().emit_close();
        sleep(Duration::from_millis(1_100)).await;
        assert_eq!(provider.socket_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_fault_notifies_without_reconnect() {
        let provider = Arc::new(MockProvider::new());
        let (session, sink) = connect(&provider);

        provider
            .latest()
            .emit_message(r#"{"name":"error","errorMessage":"sensor offline"}"#);

        assert_eq!(
            sink.contents(),
            vec!["Received error notification from device: sensor offline"]
        );

        sleep(Duration::from_secs(60)).await;
        assert_eq!(provider.socket_count(), 1);
        assert_eq!(session.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_fault_is_throttled_and_still_dispatched() {
        let provider = Arc::new(MockProvider::new());
        let (session, sink) = connect(&provider);
        let pending = session.wait_for_response("error");

        provider.latest().emit_message(r#"{"name":"error"}"#);
        provider.latest().emit_message(r#"{"name":"error","error":"again"}"#);

        assert_eq!(sink.contents(), vec!["Received error notification from device."]);
        let fault = pending.recv().await.expect("dispatched");
        assert!(fault.is_device_fault());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_message_is_dropped() {
        let provider = Arc::new(MockProvider::new());
        let (session, sink) = connect(&provider);
        let _pending = session.wait_for_response("getFile");

        provider.latest().emit_message("{not json");
        provider.latest().emit_message(r#"{"no_name":true}"#);

        assert_eq!(sink.shown_count(), 0);
        assert_eq!(session.bus().pending_for("getFile"), 1);
        assert_eq!(session.phase(), Phase::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_supersedes_previous_readiness() {
        let provider = Arc::new(MockProvider::manual());
        let (session, _sink) = connect(&provider);
        let stale = session.readiness();

        let waiter = tokio::spawn(async move { stale.wait().await });
        tokio::task::yield_now().await;

        session.reconnect();

        let err = waiter.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::Superseded { generation: 1 }));
        assert_eq!(session.readiness().generation(), 2);
        assert_eq!(session.readiness().state(), ReadyState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_socket_events_are_ignored() {
        let provider = Arc::new(MockProvider::new());
        let (session, sink) = connect(&provider);
        let old = provider.latest();

        session.reconnect();

        assert!(!old.emit_close());
        assert!(!old.emit_message(r#"{"name":"error"}"#));
        assert_eq!(sink.shown_count(), 0);
        assert_eq!(session.phase(), Phase::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_notifies_unthrottled() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_next_establish(2);
        let (session, sink) = connect(&provider);

        assert_eq!(session.phase(), Phase::Disconnected);
        assert!(matches!(session.ready().await, Err(Error::NotConnected)));
        assert_eq!(sink.contents(), vec![ESTABLISH_FAILED_MESSAGE]);

        session.reconnect();
        assert_eq!(sink.shown_count(), 2);
        assert_eq!(provider.socket_count(), 0);

        session.reconnect();
        assert_eq!(provider.socket_count(), 1);
        assert_eq!(session.phase(), Phase::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_call_failure_detaches_socket() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_connect_calls(true);
        let (session, sink) = connect(&provider);

        assert_eq!(provider.socket_count(), 1);
        assert!(!provider.latest().is_bound());
        assert_eq!(session.phase(), Phase::Disconnected);
        assert_eq!(sink.shown_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_detaches_and_stops_reconnects() {
        let provider = Arc::new(MockProvider::new());
        let (session, _sink) = connect(&provider);
        let socket = provider.latest();
        let pending = session.wait_for_response("getFile");

        socket.emit_close();
        session.shutdown();

        assert!(!socket.is_bound());
        assert!(socket.was_closed());
        assert!(matches!(pending.recv().await, Err(Error::Shutdown)));
        assert!(matches!(session.ready().await, Err(Error::Shutdown)));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(provider.socket_count(), 1);

        session.reconnect();
        assert_eq!(provider.socket_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_session_unbinds_socket() {
        let provider = Arc::new(MockProvider::new());
        let (session, _sink) = connect(&provider);
        let socket = provider.latest();

        drop(session);
        assert!(!socket.is_bound());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_from_foreign_thread() {
        let provider = Arc::new(MockProvider::manual());
        let (session, sink) = connect(&provider);
        let socket = provider.latest();

        let opener = Arc::clone(&socket);
        std::thread::spawn(move || opener.emit_open())
            .join()
            .expect("open handled without panic");

        sleep(Duration::from_millis(60)).await;
        assert!(session.is_ready());

        let closer = Arc::clone(&socket);
        std::thread::spawn(move || closer.emit_close())
            .join()
            .expect("close handled without panic");

        assert_eq!(session.phase(), Phase::Disconnected);
        assert_eq!(sink.shown_count(), 1);

        sleep(Duration::from_millis(15_100)).await;
        assert_eq!(provider.socket_count(), 2);

        // The reconnect flag was released, so a later close schedules again
        provider.latest().emit_open();
        provider.latest().emit_close();
        sleep(Duration::from_millis(15_100)).await;
        assert_eq!(provider.socket_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_events_of_replaced_generation_change_nothing() {
        let provider = Arc::new(MockProvider::manual());
        let (session, sink) = connect(&provider);

        session.reconnect();
        assert_eq!(session.generation(), 2);

        // Events tagged with generation 1 arriving after the reconnect
        session.handle_event(1, SocketEvent::Open);
        sleep(Duration::from_millis(100)).await;

        assert_eq!(session.phase(), Phase::Connecting);
        assert_eq!(session.readiness().state(), ReadyState::Pending);

        session.handle_event(1, SocketEvent::Close);
        assert_eq!(session.phase(), Phase::Connecting);
        assert_eq!(sink.shown_count(), 0);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(provider.socket_count(), 2);
    }
}
