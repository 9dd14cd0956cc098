//! HTTP server.
//!
//! One accept loop, one task per connection, HTTP/1.1 and h2c through
//! `hyper_util`'s auto builder. Each request is collected, converted into a
//! [`Request`](crate::core::Request) and handed to the [`Kernel`].
//!
//! # Graceful Shutdown
//!
//! ```rust,ignore
//! let server = Arc::new(Server::bind(&config.server, kernel).await?);
//! let runner = Arc::clone(&server);
//! tokio::spawn(async move { runner.run().await });
//!
//! // Stop accepting, let open connections finish
//! server.trigger_shutdown();
//! server.wait_for_drain(Duration::from_secs(30)).await;
//! ```

mod connection;
pub mod multipart;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::http::Kernel;
use connection::ConnectionContext;

/// HTTP server bound to a listening socket.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: Arc<ConnectionContext>,
    active_connections: Arc<AtomicUsize>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    shutdown_initiated: AtomicBool,
    drain_timeout: Duration,
}

impl Server {
    /// Bind the listen address. Port 0 picks a free port; see
    /// [`local_addr`](Server::local_addr).
    pub async fn bind(config: &ServerConfig, kernel: Kernel) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let active_connections = Arc::new(AtomicUsize::new(0));

        let ctx = Arc::new(ConnectionContext {
            kernel: Arc::new(kernel),
            upload_dir: config.upload_dir.clone(),
            server_name: config.server_name.clone(),
            active_connections: Arc::clone(&active_connections),
        });

        Ok(Self {
            listener,
            local_addr,
            ctx,
            active_connections,
            shutdown_tx,
            shutdown_rx,
            shutdown_initiated: AtomicBool::new(false),
            drain_timeout: config.drain_timeout,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Accept connections until [`trigger_shutdown`](Server::trigger_shutdown).
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Server listening on http://{}", self.local_addr);

        let mut shutdown_rx = self.shutdown_rx.clone();
        if *shutdown_rx.borrow() {
            return Ok(());
        }

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    let (stream, remote_addr) = match result {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Accept error: {}", e);
                            continue;
                        }
                    };

                    let _ = stream.set_nodelay(true);

                    let ctx = Arc::clone(&self.ctx);
                    let conn_shutdown = self.shutdown_rx.clone();
                    tokio::spawn(async move {
                        ctx.handle_connection(stream, remote_addr, conn_shutdown).await;
                    });
                }
                _ = shutdown_rx.changed() => {
                    debug!("Shutdown signalled, stopping accept loop");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Stop accepting new connections and ask open ones to close after their
    /// current request.
    pub fn trigger_shutdown(&self) {
        if self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait until no connections are open. Returns false on timeout.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        let check_interval = Duration::from_millis(50);

        loop {
            let active = self.active_connections();
            if active == 0 {
                return true;
            }

            if start.elapsed() >= timeout {
                warn!("Drain timeout reached with {} active connections", active);
                return false;
            }

            debug!("Waiting for {} connections to drain...", active);
            tokio::time::sleep(check_interval).await;
        }
    }
}
