use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{Record, RecordId, Repository, RepositoryError};

/// Mutex-guarded collection with sequential ids starting at 1.
pub struct InMemoryRepository<T> {
    records: Mutex<BTreeMap<RecordId, T>>,
    sequence: AtomicU64,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            sequence: AtomicU64::new(1),
        }
    }
}

impl<T: Record> InMemoryRepository<T> {
    fn guard(&self) -> Result<MutexGuard<'_, BTreeMap<RecordId, T>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable(format!("{} store poisoned", T::KIND)))
    }

    fn conflicts(records: &BTreeMap<RecordId, T>, candidate: &T) -> bool {
        let Some(key) = candidate.unique_key() else {
            return false;
        };

        records.values().any(|existing| {
            existing.id() != candidate.id() && existing.unique_key().as_deref() == Some(&key)
        })
    }
}

impl<T: Record> Repository<T> for InMemoryRepository<T> {
    fn insert(&self, mut record: T) -> Result<T, RepositoryError> {
        let mut guard = self.guard()?;
        record.assign_id(0);
        if Self::conflicts(&guard, &record) {
            return Err(RepositoryError::Conflict(T::KIND));
        }

        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        record.assign_id(id);
        guard.insert(id, record.clone());
        Ok(record)
    }

    fn update(&self, record: T) -> Result<(), RepositoryError> {
        let mut guard = self.guard()?;
        if !guard.contains_key(&record.id()) {
            return Err(RepositoryError::NotFound(T::KIND));
        }
        if Self::conflicts(&guard, &record) {
            return Err(RepositoryError::Conflict(T::KIND));
        }

        guard.insert(record.id(), record);
        Ok(())
    }

    fn fetch(&self, id: RecordId) -> Result<Option<T>, RepositoryError> {
        Ok(self.guard()?.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        Ok(self.guard()?.values().cloned().collect())
    }

    fn remove(&self, id: RecordId) -> Result<bool, RepositoryError> {
        Ok(self.guard()?.remove(&id).is_some())
    }
}
