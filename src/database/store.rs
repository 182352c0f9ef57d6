//! Key-value store abstraction
//!
//! The pool only needs point reads, ordered prefix scans and an atomic
//! multi-key write. [`MemoryStore`] backs tests and the demo;
//! [`DatabaseManager`](crate::database::DatabaseManager) backs persistent nodes.

use std::collections::BTreeMap;
use std::ops::Bound;

use anyhow::Result;
use parking_lot::RwLock;

/// Point reads
pub trait StateRead {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Transactional key-value store
pub trait KvStore: StateRead + Send + Sync {
    /// Apply every write or none of them
    fn write_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()>;

    /// Ascending entries whose key starts with `prefix` and is `>= start`
    /// (when given), at most `limit` of them (when given)
    fn scan_prefix(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// In-memory ordered store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StateRead for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }
}

impl KvStore for MemoryStore {
    fn write_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        let mut entries = self.entries.write();
        for (key, value) in writes {
            entries.insert(key, value);
        }
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let from = match start {
            Some(start) if start > prefix => start.to_vec(),
            _ => prefix.to_vec(),
        };
        let entries = self.entries.read();
        Ok(entries
            .range((Bound::Included(from), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
