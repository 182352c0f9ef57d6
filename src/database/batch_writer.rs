//! Atomic Batch Writer
//!
//! Per-operation write overlay. State transitions stage their writes here;
//! reads check the overlay before the store so later steps of one operation
//! observe earlier ones (a nullifier spent by input 1 is already "used" when
//! input 2 is checked). Nothing reaches the store until [`commit`], which hands
//! the whole overlay to a single atomic `write_batch`.
//!
//! [`commit`]: AtomicBatchWriter::commit

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::database::records;
use crate::database::store::{KvStore, StateRead};

/// Write overlay over a [`KvStore`]
pub struct AtomicBatchWriter<'a, S: KvStore + ?Sized> {
    store: &'a S,
    staged: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'a, S: KvStore + ?Sized> AtomicBatchWriter<'a, S> {
    /// Create new batch writer
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
        }
    }

    /// Stage a raw write; a later write to the same key wins
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.staged.insert(key, value);
    }

    /// Stage a serialized record
    pub fn put_record<T: Serialize>(&mut self, key: Vec<u8>, record: &T) -> Result<()> {
        let value = records::encode(record).context("Failed to serialize staged record")?;
        self.put(key, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write everything atomically. Returns the number of keys written.
    pub fn commit(self) -> Result<usize> {
        let count = self.staged.len();
        if count == 0 {
            return Ok(0);
        }
        self.store
            .write_batch(self.staged.into_iter().collect())
            .context("Failed to commit write batch")?;
        Ok(count)
    }
}

impl<'a, S: KvStore + ?Sized> StateRead for AtomicBatchWriter<'a, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.staged.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.store.get(key),
        }
    }
}
