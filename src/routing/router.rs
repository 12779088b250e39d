//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store one controller per resource name
//! - Answer the disconnect handshake
//! - Delegate everything else to the matching controller
//! - Return an explicit 404 when no resource matches

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use thiserror::Error;

use crate::controllers::Controller;
use crate::error::{error_response, HandlerError};
use crate::message::{Request, Response};

/// Path of the non-resource disconnect handshake.
pub const DISCONNECT_PATH: &str = "/disconnect";

const DISCONNECT_ACK: &str = "ACK";

/// Registration failures. Only possible while wiring at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("a controller is already registered for {0:?}")]
    DuplicateResource(String),

    #[error("invalid resource name {0:?}")]
    InvalidName(String),
}

pub struct Router {
    routes: HashMap<String, Arc<dyn Controller>>,
    disconnect_delay: Duration,
}

impl Router {
    pub fn new(disconnect_delay: Duration) -> Self {
        Self {
            routes: HashMap::new(),
            disconnect_delay,
        }
    }

    /// Register `controller` under the lower-cased `resource` name.
    pub fn add_controller(
        &mut self,
        resource: &str,
        controller: Arc<dyn Controller>,
    ) -> Result<(), RouterError> {
        let name = resource.trim().to_lowercase();
        if name.is_empty() || name.contains('/') {
            return Err(RouterError::InvalidName(resource.to_string()));
        }
        if self.routes.contains_key(&name) {
            return Err(RouterError::DuplicateResource(name));
        }

        tracing::debug!(resource = %name, "Controller registered");
        self.routes.insert(name, controller);
        Ok(())
    }

    /// Registered resource names, sorted.
    pub fn resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn route(&self, request: &Request) -> Result<Response, HandlerError> {
        if *request.method() == Method::POST && request.path() == DISCONNECT_PATH {
            tracing::debug!(delay = ?self.disconnect_delay, "Disconnect handshake");
            tokio::time::sleep(self.disconnect_delay).await;
            return Ok(Response::text(StatusCode::OK, DISCONNECT_ACK));
        }

        let controller = request
            .segments()
            .next()
            .and_then(|resource| self.routes.get(&resource.to_lowercase()));

        match controller {
            Some(controller) => controller.handle(request),
            None => {
                tracing::debug!(path = %request.path(), "No resource matched");
                Ok(error_response(
                    StatusCode::NOT_FOUND,
                    &format!("no resource at {}", request.path()),
                ))
            }
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("resources", &self.resources())
            .field("disconnect_delay", &self.disconnect_delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Records how often it was invoked and answers with a fixed status.
    struct StubController {
        calls: AtomicUsize,
        status: StatusCode,
    }

    impl StubController {
        fn new(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Controller for StubController {
        fn handle(&self, _request: &Request) -> Result<Response, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response::empty(self.status))
        }
    }

    /// Always raises the same failure.
    struct FailingController;

    impl Controller for FailingController {
        fn handle(&self, request: &Request) -> Result<Response, HandlerError> {
            Err(HandlerError::MethodNotAllowed {
                method: request.method().clone(),
                path: request.path().to_string(),
            })
        }
    }

    fn router_with(resource: &str, controller: Arc<dyn Controller>) -> Router {
        let mut router = Router::new(Duration::from_millis(10));
        router.add_controller(resource, controller).unwrap();
        router
    }

    #[tokio::test]
    async fn registered_resource_is_delegated() {
        let stub = StubController::new(StatusCode::OK);
        let router = router_with("developers", stub.clone());

        for path in ["/developers", "/Developers/3", "/DEVELOPERS/"] {
            let response = router
                .route(&Request::new(Method::GET, path))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test]
    async fn unknown_resource_is_404_without_controller() {
        let stub = StubController::new(StatusCode::OK);
        let router = router_with("developers", stub.clone());

        for path in ["/publishers", "/", "//", "/developerz/1"] {
            let response = router
                .route(&Request::new(Method::GET, path))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn controller_failures_propagate() {
        let router = router_with("developers", Arc::new(FailingController));
        let err = router
            .route(&Request::new(Method::PATCH, "/developers"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MethodNotAllowed { .. }));
    }

    #[tokio::test]
    async fn disconnect_acknowledges_after_delay() {
        let stub = StubController::new(StatusCode::OK);
        let mut router = Router::new(Duration::from_millis(50));
        router.add_controller("disconnect", stub.clone()).unwrap();

        let started = Instant::now();
        let response = router
            .route(&Request::new(Method::POST, DISCONNECT_PATH))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), b"ACK");
        assert_eq!(stub.calls(), 0, "handshake is matched before resource lookup");

        // Only the exact method + path is special.
        router
            .route(&Request::new(Method::GET, DISCONNECT_PATH))
            .await
            .unwrap();
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut router = router_with("developers", StubController::new(StatusCode::OK));
        assert_eq!(
            router.add_controller("Developers", StubController::new(StatusCode::OK)),
            Err(RouterError::DuplicateResource("developers".into()))
        );
        assert_eq!(
            router.add_controller("", StubController::new(StatusCode::OK)),
            Err(RouterError::InvalidName(String::new()))
        );
        assert_eq!(router.resources(), vec!["developers"]);
    }
}
