//! JSON file repository.
//!
//! Records live in memory and every mutation rewrites `<resource>.json`
//! through a temp file + rename, so a crash leaves either the old or the
//! new snapshot on disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::Entity;
use crate::repository::{MemoryRepository, Repository, RepositoryError};

pub struct FileRepository<E> {
    path: PathBuf,
    inner: MemoryRepository<E>,
    /// Serializes mutate-then-persist so snapshots land in order.
    write_lock: Mutex<()>,
}

impl<E: Entity> FileRepository<E> {
    /// Open the snapshot at `path`, creating parent directories as needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let records: Vec<E> = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)?
        } else {
            Vec::new()
        };
        tracing::info!(
            path = %path.display(),
            resource = E::RESOURCE,
            records = records.len(),
            "Loaded repository snapshot"
        );

        Ok(Self {
            path,
            inner: MemoryRepository::from_records(records),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), RepositoryError> {
        let records = self.inner.find_all()?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &records)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "Snapshot written");
        Ok(())
    }

    /// Persist the change to `id`, or undo it in memory if the snapshot
    /// cannot be written. `previous` is what `id` held before the change.
    fn commit(&self, id: u64, previous: Option<E>) -> Result<(), RepositoryError> {
        let Err(e) = self.persist() else {
            return Ok(());
        };

        match previous {
            Some(record) => self.inner.restore(id, record),
            None => {
                self.inner.take(id);
            }
        }
        tracing::warn!(
            path = %self.path.display(),
            resource = E::RESOURCE,
            id,
            error = %e,
            "Snapshot write failed, change rolled back"
        );
        Err(e)
    }
}

impl<E: Entity> Repository<E> for FileRepository<E> {
    fn find_all(&self) -> Result<Vec<E>, RepositoryError> {
        self.inner.find_all()
    }

    fn find_by_id(&self, id: u64) -> Result<Option<E>, RepositoryError> {
        self.inner.find_by_id(id)
    }

    fn save(&self, entity: E) -> Result<E, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let previous = match entity.id() {
            Some(id) => self.inner.find_by_id(id)?,
            None => None,
        };
        let saved = self.inner.save(entity)?;
        if let Some(id) = saved.id() {
            self.commit(id, previous)?;
        }
        Ok(saved)
    }

    fn replace(&self, id: u64, entity: E) -> Result<Option<E>, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let Some(previous) = self.inner.find_by_id(id)? else {
            return Ok(None);
        };
        let replaced = self.inner.replace(id, entity)?;
        if replaced.is_some() {
            self.commit(id, Some(previous))?;
        }
        Ok(replaced)
    }

    fn delete_by_id(&self, id: u64) -> Result<bool, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let Some(removed) = self.inner.take(id) else {
            return Ok(false);
        };
        self.commit(id, Some(removed))?;
        Ok(true)
    }

    fn exists_by_id(&self, id: u64) -> Result<bool, RepositoryError> {
        self.inner.exists_by_id(id)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        self.inner.count()
    }
}
