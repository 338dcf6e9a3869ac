//! Outbound delivery with readiness gating and bounded retry.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::Outbound;

use super::core::Session;
use super::readiness::Readiness;

/// Shown when every send attempt failed.
const SEND_EXHAUSTED_PREFIX: &str =
    "Reached maximum # of retries when attempting to send message to WebSocket server";

impl Session {
    /// Sends a message once the current connection is ready.
    ///
    /// A failed write forces a reconnect and the send is retried after the
    /// configured delay, up to `max_send_retries` retries. Waiting on a
    /// generation that gets replaced does not count as an attempt; the send
    /// moves on to the newer generation.
    ///
    /// # Errors
    ///
    /// - [`Error::SendExhausted`] after the last failed attempt
    /// - [`Error::Shutdown`] if the session shuts down while sending
    /// - [`Error::Json`] if a JSON payload cannot be serialized
    pub async fn send(&self, message: impl Into<Outbound>) -> Result<()> {
        let wire = message.into().into_wire()?;
        let max_retries = self.inner.config.max_send_retries;
        let mut attempt: u32 = 0;

        loop {
            let outcome = match self.wait_ready_for_send().await {
                Ok(readiness) => self.write(&readiness, &wire),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    trace!(attempt, bytes = wire.len(), "Message sent");
                    return Ok(());
                }

                Err(Error::Shutdown) => return Err(Error::Shutdown),

                Err(e) => {
                    debug!(attempt, error = %e, "Send failed, reconnecting");
                    self.reconnect();

                    if attempt >= max_retries {
                        warn!(attempts = attempt + 1, "Giving up on send");
                        self.inner
                            .notifier
                            .notify_now(format!("{SEND_EXHAUSTED_PREFIX}: {wire}"));
                        return Err(Error::send_exhausted(attempt + 1, e.to_string()));
                    }

                    tokio::time::sleep(self.inner.config.send_retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Waits until the current generation is ready.
    ///
    /// Follows reconnects: a superseded generation is replaced by the newer
    /// one. A generation that failed to connect is a write failure.
    async fn wait_ready_for_send(&self) -> Result<Arc<Readiness>> {
        loop {
            if self.is_shut_down() {
                return Err(Error::Shutdown);
            }

            let readiness = self.readiness();
            match readiness.wait().await {
                Ok(()) => return Ok(readiness),
                Err(Error::Superseded { generation }) => {
                    trace!(generation, "Readiness superseded, following reconnect");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Writes one frame to the socket of the ready generation.
    fn write(&self, readiness: &Readiness, wire: &str) -> Result<()> {
        let socket = self.current_socket().ok_or(Error::NotConnected)?;

        if self.generation() != readiness.generation() {
            return Err(Error::superseded(readiness.generation()));
        }

        socket.send(wire)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::json;
    use tokio::time::{Instant, sleep};
    use tokio_test::{assert_pending, assert_ready_ok, task};

    use crate::protocol::Command;
    use crate::testutil::{MockProvider, RecordingSink, test_config};

    fn connect(provider: &Arc<MockProvider>) -> (Session, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let session = Session::connect(test_config(), provider.clone(), sink.clone());
        (session, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_when_ready_writes_once() {
        let provider = Arc::new(MockProvider::new());
        let (session, _sink) = connect(&provider);
        session.ready().await.expect("ready");

        let start = Instant::now();
        session.send(Command::get_file("/a")).await.expect("sent");
        session.send(json!({"command": "ping"})).await.expect("sent");
        session.send("raw").await.expect("sent");
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert_eq!(
            provider.latest().sent(),
            vec![
                r#"{"command":"getFile","path":"/a"}"#.to_string(),
                r#"{"command":"ping"}"#.to_string(),
                "raw".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_waits_for_readiness() {
        let provider = Arc::new(MockProvider::manual());
        let (session, _sink) = connect(&provider);

        let mut send = task::spawn(session.send("hello"));
        assert_pending!(send.poll());
        assert!(provider.latest().sent().is_empty());

        provider.latest().emit_open();
        sleep(Duration::from_millis(60)).await;

        assert!(send.is_woken());
        assert_ready_ok!(send.poll());
        assert_eq!(provider.latest().sent(), vec!["hello".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_exhausts_after_max_retries() {
        let provider = Arc::new(MockProvider::new());
        provider.set_fail_sends(true);
        let (session, sink) = connect(&provider);
        session.ready().await.expect("ready");

        let start = Instant::now();
        let err = session.send("payload").await.unwrap_err();

        assert!(matches!(err, Error::SendExhausted { attempts: 11, .. }));
        // one retry delay between consecutive attempts, none after the last
        assert_eq!(start.elapsed(), test_config().send_retry_delay * 10);
        // initial socket plus one reconnect per failed attempt
        assert_eq!(provider.socket_count(), 12);

        let attempts: usize = provider.sockets().iter().map(|s| s.send_attempts()).sum();
        assert_eq!(attempts, 11);

        assert_eq!(
            sink.last().expect("shown").content,
            format!("{SEND_EXHAUSTED_PREFIX}: payload")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_recovers_after_one_failure() {
        let provider = Arc::new(MockProvider::new());
        let (session, sink) = connect(&provider);
        session.ready().await.expect("ready");

        let first = provider.latest();
        first.fail_sends(true);

        session.send("retry me").await.expect("sent");

        assert_eq!(provider.socket_count(), 2);
        assert_eq!(first.send_attempts(), 1);
        assert!(first.sent().is_empty());
        assert_eq!(provider.latest().sent(), vec!["retry me".to_string()]);
        assert_eq!(sink.shown_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_follows_superseded_generation() {
        let provider = Arc::new(MockProvider::manual());
        let (session, _sink) = connect(&provider);

        let sender = session.clone();
        let handle = tokio::spawn(async move { sender.send("late").await });
        tokio::task::yield_now().await;

        session.reconnect();
        provider.latest().emit_open();

        handle.await.expect("join").expect("sent");

        let sockets = provider.sockets();
        assert_eq!(sockets.len(), 2);
        assert!(sockets[0].sent().is_empty());
        assert_eq!(sockets[1].sent(), vec!["late".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_fails_on_shutdown() {
        let provider = Arc::new(MockProvider::manual());
        let (session, sink) = connect(&provider);

        let sender = session.clone();
        let handle = tokio::spawn(async move { sender.send("never").await });
        tokio::task::yield_now().await;

        session.shutdown();

        let err = handle.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::Shutdown));
        assert_eq!(sink.shown_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_provider_failure_retries() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_next_establish(1);
        let (session, sink) = connect(&provider);

        session.send("after failure").await.expect("sent");

        assert_eq!(provider.socket_count(), 1);
        assert_eq!(provider.latest().sent(), vec!["after failure".to_string()]);
        assert_eq!(sink.contents().len(), 1);
    }
}
