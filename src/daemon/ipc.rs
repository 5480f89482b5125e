//! IPC server for the break reminder daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response framing with size and time limits
//! - Dispatch of requests to the timer engine and the host window

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::notification::{HostWindow, NotificationBridge};
use crate::settings::SettingsStore;
use crate::types::{IpcRequest, IpcResponse, ResponseData, SettingsPatch, WindowSignal};

use super::timer::TimerEngine;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
pub const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// The client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// A stale socket file is removed before binding. If another daemon still
    /// accepts connections on it, nothing is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a daemon is already listening on the socket or
    /// the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            if std::os::unix::net::UnixStream::connect(socket_path).is_ok() {
                bail!("Another daemon is already listening on {:?}", socket_path);
            }
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until the client shuts down its write half or the size limit is
    /// exceeded, within a read timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(1024);
        let limit = (MAX_REQUEST_SIZE + 1) as u64;

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            (&mut *stream).take(limit).read_to_end(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest =
            serde_json::from_slice(&buffer).context("Failed to deserialize IPC request")?;

        debug!("Received request: {:?}", request);
        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;
        stream
            .shutdown()
            .await
            .context("Failed to close response stream")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the timer engine and host window.
pub struct RequestHandler<S, N> {
    engine: TimerEngine<S, N>,
    window: Box<dyn HostWindow>,
}

impl<S: SettingsStore, N: NotificationBridge> RequestHandler<S, N> {
    /// Creates a new request handler owning the given engine.
    pub fn new(engine: TimerEngine<S, N>, window: Box<dyn HostWindow>) -> Self {
        Self { engine, window }
    }

    pub fn engine(&self) -> &TimerEngine<S, N> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TimerEngine<S, N> {
        &mut self.engine
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&mut self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Toggle => self.handle_toggle(),
            IpcRequest::Start => self.handle_start(),
            IpcRequest::Pause => self.handle_pause(),
            IpcRequest::Switch => self.handle_switch().await,
            IpcRequest::Replay => self.handle_replay(),
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Status => self.handle_status(),
            IpcRequest::Settings => self.handle_settings().await,
            IpcRequest::Setting { name } => self.handle_setting(&name).await,
            IpcRequest::Update { settings } => self.handle_update(settings).await,
            IpcRequest::Window { signal } => self.handle_window(signal),
        }
    }

    fn timer_response(&self, message: impl Into<String>) -> IpcResponse {
        IpcResponse::success(
            message,
            Some(ResponseData::from_timer_state(self.engine.state())),
        )
    }

    fn handle_toggle(&mut self) -> IpcResponse {
        self.engine.toggle_run();
        if self.engine.state().running {
            self.timer_response("Timer started")
        } else {
            self.timer_response("Timer paused")
        }
    }

    fn handle_start(&mut self) -> IpcResponse {
        if self.engine.start_if_paused() {
            self.timer_response("Timer started")
        } else {
            self.timer_response("Timer is already running")
        }
    }

    fn handle_pause(&mut self) -> IpcResponse {
        if self.engine.pause_if_running() {
            self.timer_response("Timer paused")
        } else {
            self.timer_response("Timer is not running")
        }
    }

    async fn handle_switch(&mut self) -> IpcResponse {
        match self.engine.switch_mode().await {
            Ok(()) => {
                let message = format!("Switched to {} mode", self.engine.state().mode.as_str());
                self.timer_response(message)
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn handle_replay(&mut self) -> IpcResponse {
        self.engine.replay();
        let message = format!("Replaying {} mode", self.engine.state().mode.as_str());
        self.timer_response(message)
    }

    async fn handle_reset(&mut self) -> IpcResponse {
        match self.engine.reset_to_work_duration().await {
            Ok(()) => self.timer_response("Timer reset to work duration"),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn handle_status(&self) -> IpcResponse {
        self.timer_response("")
    }

    async fn handle_settings(&mut self) -> IpcResponse {
        match self.engine.fetch_settings().await {
            Some(settings) => IpcResponse::success("", Some(ResponseData::from_settings(settings))),
            None => IpcResponse::error("Settings are unavailable"),
        }
    }

    async fn handle_setting(&self, name: &str) -> IpcResponse {
        match self.engine.fetch_one_setting(name).await {
            Some(value) => IpcResponse::success("", Some(ResponseData::from_setting(name, value))),
            None => IpcResponse::error(format!("Could not read setting: {}", name)),
        }
    }

    async fn handle_update(&mut self, patch: SettingsPatch) -> IpcResponse {
        match self.engine.update_settings(patch).await {
            Ok(()) => IpcResponse::success(
                "Your settings have been updated.",
                Some(ResponseData::from_settings(self.engine.settings().clone())),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn handle_window(&self, signal: WindowSignal) -> IpcResponse {
        self.window.send_window_signal(signal);
        IpcResponse::success(format!("Sent {} to window", signal.as_str()), None)
    }
}

// ============================================================================
// Tests
// ============================================================================
