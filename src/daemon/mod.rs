//! Daemon module for the break reminder.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with the work/rest countdown state machine
//! - `ipc`: Unix socket server and request dispatch
//! - `error`: Engine error types
//!
//! [`Daemon::run`] is the only place the engine is touched. Connection tasks
//! forward requests over a channel with a oneshot reply, and tick tasks send
//! tick signals; the loop applies both in arrival order.

pub mod error;
pub mod ipc;
pub mod timer;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::notification::{ConsoleShell, NotificationBridge, ShellBridge};
use crate::settings::file::JsonFileSettingsStore;
use crate::settings::SettingsStore;
use crate::types::{IpcRequest, IpcResponse};

pub use error::EngineError;
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use timer::{TickHandle, TickSignal, TimerEngine, TICK_PERIOD};

/// Number of requests that may wait for the daemon loop.
const COMMAND_QUEUE_SIZE: usize = 32;

/// A request from a connection task, with the channel for its response.
#[derive(Debug)]
pub struct Command {
    pub request: IpcRequest,
    pub reply: oneshot::Sender<IpcResponse>,
}

// ============================================================================
// Daemon
// ============================================================================

/// The daemon: IPC server, request handler and tick receiver.
pub struct Daemon<S, N> {
    server: Arc<IpcServer>,
    handler: RequestHandler<S, N>,
    tick_rx: mpsc::UnboundedReceiver<TickSignal>,
}

impl<S: SettingsStore, N: NotificationBridge> Daemon<S, N> {
    /// Creates a daemon. `tick_rx` must receive from the sender given to the
    /// handler's engine.
    pub fn new(
        server: IpcServer,
        handler: RequestHandler<S, N>,
        tick_rx: mpsc::UnboundedReceiver<TickSignal>,
    ) -> Self {
        Self {
            server: Arc::new(server),
            handler,
            tick_rx,
        }
    }

    pub fn socket_path(&self) -> &Path {
        self.server.socket_path()
    }

    /// Serves requests and applies ticks until `shutdown` completes.
    ///
    /// On return the countdown is paused and the socket file is removed.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(COMMAND_QUEUE_SIZE);
        let accept_task = spawn_accept_loop(Arc::clone(&self.server), cmd_tx);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                Some(signal) = self.tick_rx.recv() => {
                    self.handler.engine_mut().on_tick(signal);
                }
                Some(command) = cmd_rx.recv() => {
                    let response = self.handler.handle(command.request).await;
                    if command.reply.send(response).is_err() {
                        debug!("Client went away before the response was ready");
                    }
                }
            }
        }

        accept_task.abort();
        let _ = accept_task.await;
        self.handler.engine_mut().pause_if_running();

        info!("Daemon stopped");
        Ok(())
    }
}

fn spawn_accept_loop(server: Arc<IpcServer>, cmd_tx: mpsc::Sender<Command>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match server.accept().await {
                Ok(stream) => {
                    tokio::spawn(handle_connection(stream, cmd_tx.clone()));
                }
                Err(e) => {
                    warn!("{:#}", e);
                }
            }
        }
    })
}

async fn handle_connection(mut stream: tokio::net::UnixStream, cmd_tx: mpsc::Sender<Command>) {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => {
            let (reply_tx, reply_rx) = oneshot::channel();
            let command = Command {
                request,
                reply: reply_tx,
            };
            if cmd_tx.send(command).await.is_err() {
                return;
            }
            match reply_rx.await {
                Ok(response) => response,
                Err(_) => return,
            }
        }
        Err(e) => {
            warn!("Invalid request: {:#}", e);
            IpcResponse::error(e.to_string())
        }
    };

    if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
        warn!("{:#}", e);
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Runs the daemon with the file settings store and the console shell until
/// Ctrl-C or SIGTERM.
pub async fn run_daemon(config: &AppConfig) -> Result<()> {
    let (bridge, shell_rx) = ShellBridge::channel();
    let shell = ConsoleShell::spawn(shell_rx);

    let store = JsonFileSettingsStore::new(config.settings_path.clone());
    let (tick_tx, tick_rx) = mpsc::unbounded_channel();
    let mut engine = TimerEngine::new(store, bridge.clone(), tick_tx);

    if let Err(e) = engine.reset_to_work_duration().await {
        warn!("Starting without stored settings: {}", e);
    }

    let result = match IpcServer::new(&config.socket_path) {
        Ok(server) => {
            info!("Listening on {:?}", server.socket_path());
            let handler = RequestHandler::new(engine, Box::new(bridge.clone()));
            Daemon::new(server, handler, tick_rx)
                .run(shutdown_signal())
                .await
        }
        Err(e) => Err(e),
    };

    bridge.shutdown();
    if shell.join().is_err() {
        error!("Host shell thread panicked");
    }

    result
}

/// Completes on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
