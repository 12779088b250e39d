//! In-memory repository.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::model::Entity;
use crate::repository::{Repository, RepositoryError};

/// A thread-safe map of id → record with a monotonically increasing id sequence.
#[derive(Debug)]
pub struct MemoryRepository<E> {
    entries: DashMap<u64, E>,
    /// Next id to hand out. Ids start at 1.
    next_id: AtomicU64,
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build from previously stored records, continuing the id sequence after the highest id.
    pub fn from_records(records: Vec<E>) -> Self {
        let repository = Self::new();
        for record in records {
            if let Some(id) = record.id() {
                repository.bump_sequence(id);
                repository.entries.insert(id, record);
            }
        }
        repository
    }

    fn bump_sequence(&self, id: u64) {
        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    /// Remove and return the record under `id`.
    pub(crate) fn take(&self, id: u64) -> Option<E> {
        self.entries.remove(&id).map(|(_, record)| record)
    }

    /// Put a record back under `id` without touching the id sequence.
    pub(crate) fn restore(&self, id: u64, record: E) {
        self.entries.insert(id, record);
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Repository<E> for MemoryRepository<E> {
    fn find_all(&self) -> Result<Vec<E>, RepositoryError> {
        let mut records: Vec<(u64, E)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        records.sort_by_key(|(id, _)| *id);
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<E>, RepositoryError> {
        Ok(self.entries.get(&id).map(|entry| entry.value().clone()))
    }

    fn save(&self, mut entity: E) -> Result<E, RepositoryError> {
        let id = match entity.id() {
            Some(id) => {
                self.bump_sequence(id);
                id
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                entity.set_id(id);
                id
            }
        };
        self.entries.insert(id, entity.clone());
        Ok(entity)
    }

    fn replace(&self, id: u64, mut entity: E) -> Result<Option<E>, RepositoryError> {
        entity.set_id(id);
        // The shard stays write-locked between the lookup and the store.
        Ok(self.entries.get_mut(&id).map(|mut slot| {
            *slot = entity.clone();
            entity
        }))
    }

    fn delete_by_id(&self, id: u64) -> Result<bool, RepositoryError> {
        Ok(self.take(id).is_some())
    }

    fn exists_by_id(&self, id: u64) -> Result<bool, RepositoryError> {
        Ok(self.entries.contains_key(&id))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.entries.len())
    }
}
