//! Record encoding
//!
//! Stored records are bincode-encoded serde types.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::store::StateRead;

pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    bincode::serialize(record).context("bincode encode")
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).context("bincode decode")
}

/// Read and decode one record
pub fn load<T, R>(reader: &R, key: &[u8]) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: StateRead + ?Sized,
{
    match reader.get(key)? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}
