//! In-memory doubles for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;
use url::Url;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::notify::{Notification, NotificationSink, NotificationToken};
use crate::transport::{Socket, SocketEvent, SocketHandler, SocketProvider, SocketState};

/// Endpoint used by unit tests.
pub const TEST_ENDPOINT: &str = "ws://device.test/ws";

/// Default configuration pointing at [`TEST_ENDPOINT`].
pub fn test_config() -> SessionConfig {
    SessionConfig::new(Url::parse(TEST_ENDPOINT).expect("valid test endpoint"))
}

// ============================================================================
// MockSocket
// ============================================================================

/// Socket driven by the test: events are emitted by hand.
pub struct MockSocket {
    handler: Mutex<Option<SocketHandler>>,
    state: Mutex<SocketState>,
    sent: Mutex<Vec<String>>,
    send_attempts: AtomicU32,
    fail_sends: AtomicBool,
    fail_connect: bool,
    reconnects: AtomicU32,
    auto_open: bool,
    closed: AtomicBool,
}

impl MockSocket {
    fn new(auto_open: bool, fail_sends: bool, fail_connect: bool) -> Self {
        Self {
            handler: Mutex::new(None),
            state: Mutex::new(SocketState::Closed),
            sent: Mutex::new(Vec::new()),
            send_attempts: AtomicU32::new(0),
            fail_sends: AtomicBool::new(fail_sends),
            fail_connect,
            reconnects: AtomicU32::new(0),
            auto_open,
            closed: AtomicBool::new(false),
        }
    }

    /// Delivers `event` to the bound handler. Returns `false` if unbound.
    pub fn emit(&self, event: SocketEvent) -> bool {
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    pub fn emit_open(&self) -> bool {
        *self.state.lock() = SocketState::Open;
        self.emit(SocketEvent::Open)
    }

    pub fn emit_message(&self, text: &str) -> bool {
        self.emit(SocketEvent::Message(text.to_string()))
    }

    pub fn emit_close(&self) -> bool {
        *self.state.lock() = SocketState::Closed;
        self.emit(SocketEvent::Close)
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn is_bound(&self) -> bool {
        self.handler.lock().is_some()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst) as usize
    }

    pub fn reconnect_calls(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Socket for MockSocket {
    fn bind(&self, handler: SocketHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn unbind(&self) {
        *self.handler.lock() = None;
    }

    fn send(&self, data: &str) -> Result<()> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::transport("mock send failure"));
        }
        self.sent.lock().push(data.to_string());
        Ok(())
    }

    fn reconnect(&self) -> Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(Error::transport("mock connect failure"));
        }

        *self.state.lock() = SocketState::Connecting;
        if self.auto_open {
            self.emit_open();
        }
        Ok(())
    }

    fn state(&self) -> SocketState {
        *self.state.lock()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.state.lock() = SocketState::Closed;
    }
}

// ============================================================================
// MockProvider
// ============================================================================

/// Provider handing out a fresh [`MockSocket`] per call.
pub struct MockProvider {
    sockets: Mutex<Vec<Arc<MockSocket>>>,
    auto_open: bool,
    fail_establish: AtomicU32,
    fail_sends: AtomicBool,
    fail_connect: AtomicBool,
}

impl MockProvider {
    /// Sockets open as soon as they are connected.
    pub fn new() -> Self {
        Self::with_auto_open(true)
    }

    /// Sockets stay connecting until the test emits `Open`.
    pub fn manual() -> Self {
        Self::with_auto_open(false)
    }

    fn with_auto_open(auto_open: bool) -> Self {
        Self {
            sockets: Mutex::new(Vec::new()),
            auto_open,
            fail_establish: AtomicU32::new(0),
            fail_sends: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
        }
    }

    /// Fails the next `count` calls to `socket_for`.
    pub fn fail_next_establish(&self, count: u32) {
        self.fail_establish.store(count, Ordering::SeqCst);
    }

    /// Makes sockets created from now on fail every send.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Makes sockets created from now on fail `reconnect`.
    pub fn fail_connect_calls(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn sockets(&self) -> Vec<Arc<MockSocket>> {
        self.sockets.lock().clone()
    }

    pub fn socket_count(&self) -> usize {
        self.sockets.lock().len()
    }

    pub fn latest(&self) -> Arc<MockSocket> {
        self.sockets
            .lock()
            .last()
            .cloned()
            .expect("no socket created yet")
    }
}

impl SocketProvider for MockProvider {
    fn socket_for(&self, _endpoint: &Url) -> Result<Arc<dyn Socket>> {
        let remaining = self.fail_establish.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_establish.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::provider("mock provider failure"));
        }

        let socket = Arc::new(MockSocket::new(
            self.auto_open,
            self.fail_sends.load(Ordering::SeqCst),
            self.fail_connect.load(Ordering::SeqCst),
        ));
        self.sockets.lock().push(Arc::clone(&socket));
        Ok(socket)
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Sink that records everything shown and cancelled.
#[derive(Default)]
pub struct RecordingSink {
    next_id: AtomicU64,
    shown: Mutex<Vec<Notification>>,
    cancelled: Mutex<Vec<NotificationToken>>,
    visible: Mutex<Vec<NotificationToken>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<String> {
        self.shown.lock().iter().map(|n| n.content.clone()).collect()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.lock().len()
    }

    pub fn cancelled(&self) -> Vec<NotificationToken> {
        self.cancelled.lock().clone()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.lock().len()
    }

    pub fn last(&self) -> Option<Notification> {
        self.shown.lock().last().cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, notification: &Notification) -> NotificationToken {
        let token = NotificationToken::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.shown.lock().push(notification.clone());
        self.visible.lock().push(token);
        token
    }

    fn cancel(&self, token: NotificationToken) {
        self.cancelled.lock().push(token);
        self.visible.lock().retain(|t| *t != token);
    }
}
