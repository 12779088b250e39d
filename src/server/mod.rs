//! Server subsystem.
//!
//! # Data Flow
//! ```text
//! Server::start
//!     → Listener::accept (loop, one acceptor)
//!     → tokio::spawn(ConnectionHandler::handle)   one task per connection
//!         → read_request → Router::route → encode_response → close
//! ```
//!
//! # Design Decisions
//! - The accept loop never waits on a connection task
//! - Concurrency is bounded only by `listener.max_connections`
//! - stop() is idempotent and callable from any task via ServerHandle

pub mod handler;
#[allow(clippy::module_inception)]
pub mod server;

pub use handler::ConnectionHandler;
pub use server::{Server, ServerHandle};
