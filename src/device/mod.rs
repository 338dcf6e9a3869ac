//! High-level device operations.
//!
//! [`Device`] wraps a [`Session`] with typed request helpers. Each helper
//! registers for its reply, sends the command and maps an error reply to
//! [`Error::Remote`], notifying the user once.
//!
//! # Example
//!
//! ```ignore
//! let device = Device::connect(config, Arc::new(WsProvider::new()), Arc::new(TracingSink::new()));
//!
//! let contents = device.get_file("/etc/hostname").await?;
//! device.download_file("/var/log/device.log", &DirectorySink::new("logs")).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod files;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::notify::{FaultCategory, FaultNotifier, NotificationSink};
use crate::protocol::{Command, GET_FILE, InboundMessage};
use crate::session::Session;
use crate::transport::SocketProvider;

// ============================================================================
// Re-exports
// ============================================================================

pub use files::{DirectorySink, FileSink};

// ============================================================================
// Constants
// ============================================================================

/// Reply field carrying file contents.
const FILE_CONTENTS_FIELD: &str = "base64";

/// Display duration of the download confirmation.
const DOWNLOAD_NOTIFICATION_DURATION: Duration = Duration::from_secs(1);

// ============================================================================
// Device
// ============================================================================

/// Typed operations on a connected device.
#[derive(Debug, Clone)]
pub struct Device {
    session: Session,
}

impl Device {
    /// Wraps an existing session.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Creates a session and connects it.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn connect(
        config: SessionConfig,
        provider: Arc<dyn SocketProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::new(Session::connect(config, provider, sink))
    }

    /// Returns the underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the fault notifier.
    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &FaultNotifier {
        self.session.notifier()
    }
}

// ============================================================================
// Device - Operations
// ============================================================================

impl Device {
    /// Sends `command` and returns its reply.
    ///
    /// # Errors
    ///
    /// - [`Error::Remote`] if the device answered with an error
    /// - Any delivery error from [`Session::send`] or the reply wait
    pub async fn request(&self, command: Command) -> Result<InboundMessage> {
        let operation = command.name().to_string();

        match self.exchange(command).await {
            Err(Error::Remote { operation, detail }) => {
                self.session.notifier().notify(
                    FaultCategory::RemoteError,
                    format!("Device rejected '{operation}': {detail}"),
                );
                Err(Error::Remote { operation, detail })
            }
            other => {
                debug!(%operation, ok = other.is_ok(), "Request finished");
                other
            }
        }
    }

    /// Fetches a file and returns its base64 contents.
    ///
    /// # Errors
    ///
    /// - [`Error::Remote`] if the device could not read the file
    /// - [`Error::Protocol`] if the reply carries no contents
    pub async fn get_file(&self, path: &str) -> Result<String> {
        debug!(path, "Requesting file");

        let reply = match self.exchange(Command::get_file(path)).await {
            Ok(reply) => reply,
            Err(e @ Error::Remote { .. }) => {
                warn!(path, error = %e, "File retrieval failed");
                self.session.notifier().notify(
                    FaultCategory::RemoteError,
                    format!("Error retrieving file: {path}"),
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        reply
            .get_str(FILE_CONTENTS_FIELD)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::protocol(format!(
                    "{GET_FILE} reply missing '{FILE_CONTENTS_FIELD}' field"
                ))
            })
    }

    /// Fetches a file and hands it to `sink` under its base name.
    ///
    /// Returns the file name used.
    ///
    /// # Errors
    ///
    /// Same as [`get_file`](Self::get_file), plus any error from `sink`.
    pub async fn download_file(&self, path: &str, sink: &dyn FileSink) -> Result<String> {
        let contents = self.get_file(path).await?;
        let filename = file_name(path).to_string();

        sink.save(&filename, &contents)?;

        self.session.notifier().success(
            format!("Downloading file: {filename}"),
            DOWNLOAD_NOTIFICATION_DURATION,
        );
        Ok(filename)
    }

    /// Registers for the reply, sends and maps error replies.
    async fn exchange(&self, command: Command) -> Result<InboundMessage> {
        let reply = self.session.wait_for_response(command.reply_name());
        let operation = command.name().to_string();

        self.session.send(command).await?;
        let message = reply.await?;

        match message.error_detail() {
            Some(detail) => Err(Error::remote(operation, detail)),
            None => Ok(message),
        }
    }
}

/// Returns the last path segment.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ============================================================================
// Tests
// ============================================================================
