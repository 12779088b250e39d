//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! ResourceController<E>
//!     → Repository<E> (trait object, injected at startup)
//!         → memory.rs (DashMap, process lifetime)
//!         → file.rs   (memory.rs + JSON snapshot per resource)
//! ```
//!
//! # Design Decisions
//! - One repository instance per resource, shared across connections
//! - Each call is independent; there is no transaction spanning calls
//! - Implementations do their own locking

pub mod file;
pub mod memory;

use thiserror::Error;

use crate::model::Entity;

pub use file::FileRepository;
pub use memory::MemoryRepository;

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),
}

/// CRUD capability for one record type.
pub trait Repository<E: Entity>: Send + Sync {
    /// All records, ordered by id.
    fn find_all(&self) -> Result<Vec<E>, RepositoryError>;

    fn find_by_id(&self, id: u64) -> Result<Option<E>, RepositoryError>;

    /// Insert when the record has no id, update (or insert under that id) otherwise.
    /// Returns the stored record with its id set.
    fn save(&self, entity: E) -> Result<E, RepositoryError>;

    /// Overwrite the record stored under `id`, forcing its id to `id`.
    ///
    /// Returns `None` and stores nothing when no record exists. The presence
    /// check and the write are one step, so a concurrent delete is never undone.
    fn replace(&self, id: u64, entity: E) -> Result<Option<E>, RepositoryError>;

    /// Returns false when nothing was stored under `id`.
    fn delete_by_id(&self, id: u64) -> Result<bool, RepositoryError>;

    fn exists_by_id(&self, id: u64) -> Result<bool, RepositoryError>;

    fn count(&self) -> Result<usize, RepositoryError>;
}
