//! Listening socket and accept loop.
//!
//! # Responsibilities
//! - Own the listener for the server's lifetime
//! - Hand each accepted connection to its own task
//! - Launch the connection monitor
//! - Stop on request: close the listener, drain in-flight connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{MonitorConfig, ServerConfig};
use crate::lifecycle::Shutdown;
use crate::message::ParseLimits;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Listener, ListenerError};
use crate::observability::ConnectionMonitor;
use crate::routing::Router;
use crate::server::handler::ConnectionHandler;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) cannot spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// A bound server, ready to `start`.
pub struct Server {
    listener: Listener,
    handler: Arc<ConnectionHandler>,
    handle: ServerHandle,
    monitor: MonitorConfig,
    drain_timeout: Duration,
}

/// Cloneable control surface for a running server.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listening socket. Connections queue in the backlog until `start`.
    pub async fn bind(config: &ServerConfig, router: Router) -> Result<Self, ListenerError> {
        let listener = Listener::bind(&config.listener).await?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
        let tracker = ConnectionTracker::new();

        let handler = ConnectionHandler::new(
            Arc::new(router),
            tracker.clone(),
            ParseLimits::from(&config.listener),
        );

        Ok(Self {
            listener,
            handler: Arc::new(handler),
            handle: ServerHandle {
                shutdown: Shutdown::new(),
                tracker,
                local_addr,
            },
            monitor: config.monitor.clone(),
            drain_timeout: Duration::from_secs(config.listener.drain_timeout_secs),
        })
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr
    }

    /// Request shutdown. Same as [`ServerHandle::stop`].
    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Accept connections until stopped, then close the listener and drain.
    pub async fn start(self) {
        let Server {
            listener,
            handler,
            handle,
            monitor,
            drain_timeout,
        } = self;

        if monitor.enabled {
            ConnectionMonitor::new(
                handle.tracker.clone(),
                Duration::from_secs(monitor.interval_secs),
            )
            .spawn();
        }

        tracing::info!(address = %handle.local_addr, "Server accepting connections");

        loop {
            if !handle.is_running() {
                break;
            }

            tokio::select! {
                _ = handle.shutdown.triggered() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        let handler = Arc::clone(&handler);
                        tokio::spawn(async move {
                            handler.handle(stream, peer_addr).await;
                            drop(permit);
                        });
                    }
                    Err(e) if !handle.is_running() => {
                        tracing::debug!(error = %e, "Accept interrupted by shutdown");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        tracing::info!(
            address = %handle.local_addr,
            in_flight = handle.active_connections(),
            "Listener closed"
        );

        if handle.tracker.wait_for_idle(drain_timeout).await {
            tracing::info!("Server stopped");
        } else {
            tracing::warn!(
                remaining = handle.active_connections(),
                "Drain timeout elapsed with connections still open"
            );
        }
    }
}

impl ServerHandle {
    /// Stop accepting connections. Idempotent.
    ///
    /// In-flight connections run to completion; `start` returns once they
    /// have drained or the drain timeout elapses.
    pub fn stop(&self) {
        if self.shutdown.trigger() {
            tracing::info!(address = %self.local_addr, "Stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_triggered()
    }

    /// Connection handlers currently executing.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
