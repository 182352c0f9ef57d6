//! Database Schema Implementation
//!
//! RocksDB backend for the pool store. Each record family from
//! [`keys`](crate::database::keys) lives in its own column family, chosen by the
//! key's first byte. Keys keep their prefix byte so the layout is identical to
//! the in-memory store.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rocksdb::{
    BlockBasedOptions, ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction,
    IteratorMode, Options, ReadOptions, WriteBatch, WriteOptions, DB,
};

use crate::database::keys::prefixes;
use crate::database::store::{KvStore, StateRead};

/// Column family names
pub mod cf_names {
    pub const PARAMS: &str = "cf_params";
    pub const DEPOSITS: &str = "cf_deposits";
    pub const DEPOSIT_INDICES: &str = "cf_deposit_indices";
    pub const NULLIFIERS: &str = "cf_nullifiers";
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DBConfig {
    /// Database path
    pub db_path: String,

    /// Write buffer size per column family (default: 64MB)
    pub write_buffer_size: usize,

    /// Maximum open files (default: 1000)
    pub max_open_files: i32,

    /// Bloom filters on point-lookup column families
    pub enable_bloom_filters: bool,

    pub compression_type: rocksdb::DBCompressionType,

    /// Background thread count for compaction
    pub max_background_jobs: i32,

    /// fsync every committed batch
    pub sync_writes: bool,
}

impl Default for DBConfig {
    fn default() -> Self {
        Self {
            db_path: "./privacy_pool_db".to_string(),
            write_buffer_size: 64 * 1024 * 1024,
            max_open_files: 1000,
            enable_bloom_filters: true,
            compression_type: rocksdb::DBCompressionType::Lz4,
            max_background_jobs: 4,
            sync_writes: true,
        }
    }
}

impl DBConfig {
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            db_path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        }
    }
}

/// Per column family tuning
#[derive(Debug, Clone)]
pub struct CFConfig {
    pub name: &'static str,
    pub write_buffer_size: usize,
    pub point_lookups: bool,
}

impl CFConfig {
    /// Single params record
    pub fn params() -> Self {
        Self {
            name: cf_names::PARAMS,
            write_buffer_size: 4 * 1024 * 1024,
            point_lookups: true,
        }
    }

    /// Deposits are read by key and by ordered range
    pub fn deposits(buffer: usize) -> Self {
        Self {
            name: cf_names::DEPOSITS,
            write_buffer_size: buffer,
            point_lookups: false,
        }
    }

    pub fn deposit_indices() -> Self {
        Self {
            name: cf_names::DEPOSIT_INDICES,
            write_buffer_size: 4 * 1024 * 1024,
            point_lookups: true,
        }
    }

    /// Spent-set membership checks dominate
    pub fn nullifiers(buffer: usize) -> Self {
        Self {
            name: cf_names::NULLIFIERS,
            write_buffer_size: buffer,
            point_lookups: true,
        }
    }

    pub fn all(config: &DBConfig) -> Vec<Self> {
        vec![
            Self::params(),
            Self::deposits(config.write_buffer_size),
            Self::deposit_indices(),
            Self::nullifiers(config.write_buffer_size),
        ]
    }

    pub fn to_options(&self, config: &DBConfig) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_compression_type(config.compression_type);
        opts.set_compaction_style(DBCompactionStyle::Level);

        let mut block_opts = BlockBasedOptions::default();
        if self.point_lookups && config.enable_bloom_filters {
            block_opts.set_bloom_filter(10.0, false);
            block_opts.set_cache_index_and_filter_blocks(true);
        }
        opts.set_block_based_table_factory(&block_opts);
        opts
    }
}

/// Column family holding keys with this prefix byte
pub fn cf_for_key(key: &[u8]) -> Result<&'static str> {
    match key.first() {
        Some(&prefixes::PARAMS) => Ok(cf_names::PARAMS),
        Some(&prefixes::DEPOSIT) => Ok(cf_names::DEPOSITS),
        Some(&prefixes::NEXT_DEPOSIT_INDEX) => Ok(cf_names::DEPOSIT_INDICES),
        Some(&prefixes::NULLIFIER) => Ok(cf_names::NULLIFIERS),
        Some(other) => Err(anyhow!("No column family for key prefix 0x{:02x}", other)),
        None => Err(anyhow!("Key is empty")),
    }
}

/// RocksDB-backed store
pub struct DatabaseManager {
    db: DB,
    config: DBConfig,
}

impl DatabaseManager {
    /// Open database with all column families
    pub fn open(config: DBConfig) -> Result<Self> {
        let cf_descriptors: Vec<ColumnFamilyDescriptor> = CFConfig::all(&config)
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(cf.name, cf.to_options(&config)))
            .collect();

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_max_background_jobs(config.max_background_jobs);

        let db = DB::open_cf_descriptors(&db_opts, Path::new(&config.db_path), cf_descriptors)
            .with_context(|| format!("Failed to open database at {}", config.db_path))?;

        log::info!("Opened pool database at {}", config.db_path);
        Ok(Self { db, config })
    }

    /// Get column family handle
    pub fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| anyhow!("Column family '{}' not found", name))
    }

    pub fn config(&self) -> &DBConfig {
        &self.config
    }

    /// RocksDB statistics dump
    pub fn get_statistics(&self) -> Result<String> {
        self.db
            .property_value("rocksdb.stats")
            .context("Failed to read statistics")?
            .ok_or_else(|| anyhow!("Statistics not enabled"))
    }

    /// Manual compaction of one column family
    pub fn compact_cf(&self, cf_name: &str) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        self.db.compact_range_cf(cf, None::<&[u8]>, None::<&[u8]>);
        Ok(())
    }
}

impl StateRead for DatabaseManager {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf_name = cf_for_key(key)?;
        let cf = self.cf_handle(cf_name)?;
        self.db
            .get_cf_opt(cf, key, &ReadOptions::default())
            .with_context(|| format!("Failed to get key from {}", cf_name))
    }
}

impl KvStore for DatabaseManager {
    fn write_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        let mut batch = WriteBatch::default();
        for (key, value) in &writes {
            let cf = self.cf_handle(cf_for_key(key)?)?;
            batch.put_cf(cf, key, value);
        }

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .context("Failed to execute write batch")
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf_name = cf_for_key(prefix)?;
        let cf = self.cf_handle(cf_name)?;
        let from = match start {
            Some(start) if start > prefix => start,
            _ => prefix,
        };
        let limit = limit.unwrap_or(usize::MAX);

        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(from, Direction::Forward))
        {
            if entries.len() >= limit {
                break;
            }
            let (key, value) = item.with_context(|| format!("Failed to iterate {}", cf_name))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }
}
