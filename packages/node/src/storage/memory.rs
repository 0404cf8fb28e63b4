//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Each entity type gets its own [`BTreeMap`] keyed by id, so listing
//! is an in-order walk with no secondary index.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use recallwire::{Entity, EntityId, Record};

use super::{Storage, StorageError};

type Tables = HashMap<String, BTreeMap<EntityId, Record>>;

/// Thread-safe, in-memory implementation of [`Storage`].
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables
            .read()
            .map_err(|_| StorageError::Internal("storage lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables
            .write()
            .map_err(|_| StorageError::Internal("storage lock poisoned".into()))
    }
}

fn key_of(record: &Record) -> Result<EntityId, StorageError> {
    record.id().cloned().ok_or_else(|| {
        StorageError::Internal(format!("cannot store a {} without an id", record.entity_type()))
    })
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert(&self, record: &Record) -> Result<(), StorageError> {
        let id = key_of(record)?;
        let mut tables = self.write()?;
        let table = tables.entry(record.entity_type().to_string()).or_default();
        if table.contains_key(&id) {
            return Err(StorageError::Conflict(format!(
                "{} {id} already exists",
                record.entity_type()
            )));
        }
        table.insert(id, record.clone());
        Ok(())
    }

    async fn insert_all(&self, records: &[Record]) -> Result<(), StorageError> {
        let keys = records.iter().map(key_of).collect::<Result<Vec<_>, _>>()?;
        let mut tables = self.write()?;

        {
            let mut seen: HashSet<(&str, &EntityId)> = HashSet::new();
            for (record, id) in records.iter().zip(&keys) {
                let taken = tables
                    .get(record.entity_type())
                    .is_some_and(|t| t.contains_key(id));
                if taken || !seen.insert((record.entity_type(), id)) {
                    return Err(StorageError::Conflict(format!(
                        "{} {id} already exists",
                        record.entity_type()
                    )));
                }
            }
        }

        for (record, id) in records.iter().zip(keys) {
            tables
                .entry(record.entity_type().to_string())
                .or_default()
                .insert(id, record.clone());
        }
        Ok(())
    }

    async fn update(&self, record: &Record) -> Result<(), StorageError> {
        let id = key_of(record)?;
        let mut tables = self.write()?;
        let slot = tables
            .get_mut(record.entity_type())
            .and_then(|t| t.get_mut(&id))
            .ok_or(StorageError::NotFound)?;
        *slot = record.clone();
        Ok(())
    }

    async fn get(&self, entity_type: &str, id: &EntityId) -> Result<Option<Record>, StorageError> {
        Ok(self
            .read()?
            .get(entity_type)
            .and_then(|t| t.get(id))
            .cloned())
    }

    async fn delete(&self, entity_type: &str, id: &EntityId) -> Result<(), StorageError> {
        self.write()?
            .get_mut(entity_type)
            .and_then(|t| t.remove(id))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn list(&self, entity_type: &str) -> Result<Vec<Record>, StorageError> {
        Ok(self
            .read()?
            .get(entity_type)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, entity_type: &str) -> Result<usize, StorageError> {
        Ok(self.read()?.get(entity_type).map_or(0, BTreeMap::len))
    }
}
