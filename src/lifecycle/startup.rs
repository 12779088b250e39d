//! Startup orchestration.
//!
//! # Responsibilities
//! - Construct one repository per configured resource
//! - Wrap each in its controller and register it with the router
//! - Bind the server last (traffic only when ready)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The resource → record type mapping is an ordinary `match`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{ServerConfig, StorageBackend, StorageConfig};
use crate::controllers::{Controller, ResourceController};
use crate::model::{Console, Developer, Entity, Game, Genre, Publisher};
use crate::net::listener::ListenerError;
use crate::repository::{FileRepository, MemoryRepository, Repository, RepositoryError};
use crate::routing::{Router, RouterError};
use crate::server::Server;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("unknown resource {0:?}")]
    UnknownResource(String),

    #[error("failed to open storage: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Build the route table for every configured resource.
pub fn build_router(config: &ServerConfig) -> Result<Router, StartupError> {
    let mut router = Router::new(Duration::from_millis(config.disconnect.delay_ms));
    for resource in &config.resources {
        let controller = controller_for(resource, &config.storage)?;
        router.add_controller(resource, controller)?;
    }
    tracing::info!(
        resources = ?router.resources(),
        storage = ?config.storage.backend,
        "Routes registered"
    );
    Ok(router)
}

/// Build the router and bind the server.
pub async fn start_server(config: &ServerConfig) -> Result<Server, StartupError> {
    let router = build_router(config)?;
    Ok(Server::bind(config, router).await?)
}

fn controller_for(
    resource: &str,
    storage: &StorageConfig,
) -> Result<Arc<dyn Controller>, StartupError> {
    match resource.to_lowercase().as_str() {
        Developer::RESOURCE => controller::<Developer>(storage),
        Publisher::RESOURCE => controller::<Publisher>(storage),
        Genre::RESOURCE => controller::<Genre>(storage),
        Console::RESOURCE => controller::<Console>(storage),
        Game::RESOURCE => controller::<Game>(storage),
        _ => Err(StartupError::UnknownResource(resource.to_string())),
    }
}

fn controller<E: Entity>(storage: &StorageConfig) -> Result<Arc<dyn Controller>, StartupError> {
    let repository: Arc<dyn Repository<E>> = match storage.backend {
        StorageBackend::Memory => Arc::new(MemoryRepository::<E>::new()),
        StorageBackend::File => {
            let path = Path::new(&storage.data_dir).join(format!("{}.json", E::RESOURCE));
            Arc::new(FileRepository::<E>::open(path)?)
        }
    };
    Ok(Arc::new(ResourceController::new(repository)))
}
