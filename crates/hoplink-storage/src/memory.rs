use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hoplink_core::error::StorageError;
use hoplink_core::repository::{ReadRepository, Repository, Result, UrlRecord};
use hoplink_core::shortcode::ShortCode;
use std::sync::Arc;

/// An in-memory repository backed by a concurrent map.
///
/// The entry API gives the same check-and-insert atomicity a database
/// uniqueness constraint provides, so the duplicate-key race path can be
/// exercised in tests without a real database. Clones share the
/// underlying map, like a pooled database handle.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<DashMap<String, UrlRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self.items.get(code.as_str()).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        match self.items.entry(code.as_str().to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(code.to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                Ok(())
            }
        }
    }

    async fn update(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        match self.items.get_mut(code.as_str()) {
            Some(mut existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StorageError::Operation(format!(
                "no record to update for code '{}'",
                code
            ))),
        }
    }
}
