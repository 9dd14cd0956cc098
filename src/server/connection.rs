//! Per-connection HTTP handling.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::multipart::parse_multipart;
use crate::core::{Request, Response};
use crate::http::Kernel;

/// Time allowed for a client to send the request headers.
const HEADER_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that just mean the peer went away.
fn is_connection_error(err_str: &str) -> bool {
    err_str.contains("connection reset")
        || err_str.contains("broken pipe")
        || err_str.contains("Connection reset")
        || err_str.contains("os error 104")
        || err_str.contains("os error 32")
        || err_str.contains("timed out")
        || err_str.contains("HeaderTimeout")
}

/// State shared by every connection of one server.
pub struct ConnectionContext {
    pub kernel: Arc<Kernel>,
    pub upload_dir: PathBuf,
    pub server_name: Option<String>,
    pub active_connections: Arc<AtomicUsize>,
}

/// Decrements the active connection count when dropped.
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(counter))
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl ConnectionContext {
    /// Serve one TCP connection (HTTP/1.1 or h2c) until the peer closes it
    /// or shutdown is signalled, in which case in-flight requests finish
    /// first.
    pub async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let _guard = ConnectionGuard::new(&self.active_connections);

        let ctx = Arc::clone(&self);
        let service = service_fn(move |req| {
            let ctx = Arc::clone(&ctx);
            async move { ctx.handle_request(req, remote_addr).await }
        });

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(Some(HEADER_TIMEOUT))
            .keep_alive(true);

        let conn = builder.serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        let result = if *shutdown_rx.borrow() {
            conn.as_mut().graceful_shutdown();
            conn.await
        } else {
            tokio::select! {
                result = conn.as_mut() => result,
                _ = shutdown_rx.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            }
        };

        if let Err(err) = result {
            let err_str = format!("{:?}", err);
            if !is_connection_error(&err_str) {
                debug!("Connection error from {}: {:?}", remote_addr, err);
            }
        }
    }

    async fn handle_request(
        &self,
        req: hyper::Request<Incoming>,
        remote_addr: SocketAddr,
    ) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
        let (parts, body) = req.into_parts();

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                debug!("Failed to read request body from {}: {}", remote_addr, e);
                return Ok(plain(StatusCode::BAD_REQUEST, "Failed to read request body"));
            }
        };

        let is_head = parts.method == Method::HEAD;
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let is_multipart = parts.method == Method::POST
            && content_type
                .to_ascii_lowercase()
                .starts_with("multipart/form-data");

        let mut request = Request::new(parts.method, parts.uri, parts.headers, body.clone())
            .with_remote_addr(remote_addr)
            .with_version(parts.version);

        if let Some(name) = &self.server_name {
            request = request.with_server_name(name.clone());
        }

        if is_multipart {
            match parse_multipart(&content_type, body, &self.upload_dir).await {
                Ok((fields, files)) => request = request.with_multipart(fields, files),
                Err(e) => {
                    warn!("Rejected multipart body from {}: {}", remote_addr, e);
                    return Ok(plain(StatusCode::BAD_REQUEST, "Malformed multipart body"));
                }
            }
        }

        let temp_files: Vec<PathBuf> = request
            .all_files()
            .values()
            .flatten()
            .map(|f| f.tmp_name.clone())
            .filter(|path| !path.as_os_str().is_empty())
            .collect();

        let response = self.kernel.handle(request).await;

        // Uploads live only as long as the request
        for temp_file in temp_files {
            if let Err(e) = tokio::fs::remove_file(&temp_file).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove upload {}: {}", temp_file.display(), e);
                }
            }
        }

        let response = if is_head {
            response.without_body()
        } else {
            response
        };

        Ok(response.into_http().map(Full::new))
    }
}

fn plain(status: StatusCode, message: &'static str) -> hyper::Response<Full<Bytes>> {
    Response::text(message)
        .with_status(status)
        .into_http()
        .map(Full::new)
}
