//! Per-connection unit of work.
//!
//! # Responsibilities
//! - Count the connection for its whole lifetime
//! - Read exactly one request
//! - Route it and turn any failure into an error response
//! - Write the response and close the socket
//!
//! # Design Decisions
//! - The only place a `HandlerError` becomes a `Response`
//! - Malformed requests never reach the router
//! - Write failures are logged, never retried
//! - No deadline: a stalled peer holds its task until the transport fails

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http::header::CONNECTION;
use http::{HeaderValue, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::error_response;
use crate::message::{encode_response, read_request, ParseError, ParseLimits, Request, Response};
use crate::net::connection::{ConnectionGuard, ConnectionState, ConnectionTracker};
use crate::observability::metrics;
use crate::routing::Router;

pub struct ConnectionHandler {
    router: Arc<Router>,
    tracker: ConnectionTracker,
    limits: ParseLimits,
}

impl ConnectionHandler {
    pub fn new(router: Arc<Router>, tracker: ConnectionTracker, limits: ParseLimits) -> Self {
        Self {
            router,
            tracker,
            limits,
        }
    }

    /// Serve one connection from first byte to close.
    pub async fn handle<S>(&self, stream: S, peer_addr: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut guard = self.tracker.track();
        let span = tracing::info_span!(
            "connection",
            connection_id = %guard.id(),
            request_id = %Uuid::new_v4(),
            peer_addr = %peer_addr,
        );
        self.serve(stream, &mut guard).instrument(span).await;
    }

    async fn serve<S>(&self, mut stream: S, guard: &mut ConnectionGuard)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let started = Instant::now();

        let parsed = {
            let mut reader = BufReader::new(&mut stream);
            read_request(&mut reader, &self.limits).await
        };

        let response = match parsed {
            Ok(request) => {
                guard.transition(ConnectionState::Routing);
                let response = self.dispatch(&request).await;
                metrics::record_request(request.method(), response.status(), started);
                tracing::info!(
                    method = %request.method(),
                    path = %request.path(),
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Request handled"
                );
                response
            }
            Err(ParseError::ConnectionClosed) => {
                tracing::debug!("Peer closed before sending a request");
                return;
            }
            Err(e) if !e.is_malformed() => {
                tracing::warn!(error = %e, "Failed to read request");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed request");
                metrics::record_malformed(started);
                error_response(StatusCode::BAD_REQUEST, &e.to_string())
            }
        };

        guard.transition(ConnectionState::Responding);
        let response = response.with_header(CONNECTION, HeaderValue::from_static("close"));
        if let Err(e) = write_response(&mut stream, &response).await {
            tracing::warn!(error = %e, status = response.status().as_u16(), "Failed to write response");
        }
    }

    /// Route a request, mapping every failure to its status.
    async fn dispatch(&self, request: &Request) -> Response {
        match self.router.route(request).await {
            Ok(response) => response,
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    tracing::error!(
                        method = %request.method(),
                        path = %request.path(),
                        error = %err,
                        "Request failed"
                    );
                } else {
                    tracing::warn!(
                        method = %request.method(),
                        path = %request.path(),
                        status = status.as_u16(),
                        error = %err,
                        "Request rejected"
                    );
                }
                err.to_response()
            }
        }
    }
}

async fn write_response<S>(stream: &mut S, response: &Response) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&encode_response(response)).await?;
    stream.flush().await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::{Controller, DeveloperController};
    use crate::error::HandlerError;
    use crate::repository::{MemoryRepository, Repository, RepositoryError};
    use crate::model::Developer;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt};

    struct FailingStore;

    impl Repository<Developer> for FailingStore {
        fn find_all(&self) -> Result<Vec<Developer>, RepositoryError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "secret stack detail").into())
        }
        fn find_by_id(&self, _: u64) -> Result<Option<Developer>, RepositoryError> {
            Ok(None)
        }
        fn save(&self, entity: Developer) -> Result<Developer, RepositoryError> {
            Ok(entity)
        }
        fn replace(&self, _: u64, _: Developer) -> Result<Option<Developer>, RepositoryError> {
            Ok(None)
        }
        fn delete_by_id(&self, _: u64) -> Result<bool, RepositoryError> {
            Ok(false)
        }
        fn exists_by_id(&self, _: u64) -> Result<bool, RepositoryError> {
            Ok(false)
        }
        fn count(&self) -> Result<usize, RepositoryError> {
            Ok(0)
        }
    }

    struct NeverCalled;

    impl Controller for NeverCalled {
        fn handle(&self, _: &Request) -> Result<Response, HandlerError> {
            panic!("router must not be reached");
        }
    }

    fn handler_with(resource: &str, controller: Arc<dyn Controller>) -> ConnectionHandler {
        let mut router = Router::new(Duration::from_millis(10));
        router.add_controller(resource, controller).unwrap();
        ConnectionHandler::new(
            Arc::new(router),
            ConnectionTracker::new(),
            ParseLimits::default(),
        )
    }

    async fn exchange(handler: &ConnectionHandler, raw: &[u8]) -> String {
        let (mut client, server) = duplex(64 * 1024);
        client.write_all(raw).await.unwrap();
        client.shutdown().await.unwrap();
        handler.handle(server, "127.0.0.1:9".parse().unwrap()).await;

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn serves_a_request_and_closes() {
        let repo: Arc<dyn Repository<Developer>> = Arc::new(MemoryRepository::new());
        let handler = handler_with("developers", Arc::new(DeveloperController::new(repo)));

        let body = r#"{"name":"Arkane"}"#;
        let raw = format!(
            "POST /developers HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let out = exchange(&handler, raw.as_bytes()).await;
        assert!(out.starts_with("HTTP/1.1 201 Created\r\n"), "{out}");
        assert!(out.contains("connection: close\r\n"));
        assert!(out.ends_with(r#"{"id":1,"name":"Arkane","country":null,"founded_year":null,"website":null}"#));
        assert_eq!(handler.tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn malformed_request_skips_router() {
        let handler = handler_with("developers", Arc::new(NeverCalled));
        let out = exchange(&handler, b"NONSENSE\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{out}");
        assert_eq!(handler.tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn internal_failures_are_opaque_500s() {
        let repo: Arc<dyn Repository<Developer>> = Arc::new(FailingStore);
        let handler = handler_with("developers", Arc::new(DeveloperController::new(repo)));
        let out = exchange(&handler, b"GET /developers HTTP/1.1\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"), "{out}");
        assert!(!out.contains("secret stack detail"));
    }

    #[tokio::test]
    async fn silent_peer_gets_no_response() {
        let handler = handler_with("developers", Arc::new(NeverCalled));
        let out = exchange(&handler, b"").await;
        assert!(out.is_empty());
        assert_eq!(handler.tracker.active_count(), 0);
    }
}
