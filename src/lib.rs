//! Game catalog server library.

pub mod config;
pub mod controllers;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod model;
pub mod net;
pub mod observability;
pub mod repository;
pub mod routing;
pub mod server;

pub use config::schema::ServerConfig;
pub use lifecycle::startup::start_server;
pub use lifecycle::Shutdown;
pub use server::{Server, ServerHandle};
