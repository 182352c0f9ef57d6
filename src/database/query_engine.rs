//! Query Engine Implementation
//!
//! Read-only views over the pool store: params, deposits (point, paged and
//! ranged), deposit counters, the spent set and aggregate statistics.

use std::collections::HashMap;

use crate::database::keys;
use crate::database::records;
use crate::database::store::KvStore;
use crate::privacy::params::PoolParams;
use crate::privacy::types::{DenomStats, PoolStats, PrivateDeposit, UsedNullifier};

/// Page size when the request leaves `limit` at zero
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Cap on `deposits_by_range`
pub const MAX_RANGE_SIZE: u64 = 1000;

/// Query errors
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid query parameters: {0}")]
    InvalidParameters(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Key- or offset-based pagination. `key` is relative to the scanned prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub key: Option<Vec<u8>>,
    pub offset: u64,
    pub limit: u64,
    pub count_total: bool,
}

impl PageRequest {
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn after_key(key: Vec<u8>, limit: u64) -> Self {
        Self {
            key: Some(key),
            limit,
            ..Default::default()
        }
    }

    fn effective_limit(&self) -> usize {
        let limit = if self.limit == 0 { DEFAULT_PAGE_LIMIT } else { self.limit };
        usize::try_from(limit).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResponse {
    /// Pass back as `PageRequest::key` for the next page; `None` at the end
    pub next_key: Option<Vec<u8>>,
    /// Set when `count_total` was requested on an offset query
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositsPage {
    pub deposits: Vec<PrivateDeposit>,
    pub pagination: PageResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextDepositIndex {
    pub next_index: u64,
    /// Indices start at zero, so this equals `next_index`
    pub total_deposits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullifierStatus {
    pub used: bool,
    pub spent_at_height: Option<u64>,
    pub spent_tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRange {
    pub deposits: Vec<PrivateDeposit>,
    pub start_index: u64,
    /// One past the last returned index
    pub end_index: u64,
}

/// Read-only query interface
pub struct QueryEngine<'a, S: KvStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KvStore + ?Sized> QueryEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Stored params, or defaults if none were ever written
    pub fn params(&self) -> QueryResult<PoolParams> {
        Ok(records::load(self.store, &keys::params_key())?.unwrap_or_default())
    }

    pub fn deposit(&self, denom: &str, index: u64) -> QueryResult<PrivateDeposit> {
        require_denom(denom)?;
        records::load(self.store, &keys::deposit_key(denom, index))?.ok_or_else(|| {
            QueryError::NotFound(format!("deposit {} not found for denom {}", index, denom))
        })
    }

    /// Deposits of one denom in index order
    pub fn deposits(&self, denom: &str, page: &PageRequest) -> QueryResult<DepositsPage> {
        require_denom(denom)?;
        self.paginate(&keys::deposit_denom_prefix(denom), page)
    }

    /// Deposits of every denom, ordered by denom then index
    pub fn all_deposits(&self, page: &PageRequest) -> QueryResult<DepositsPage> {
        self.paginate(&keys::deposit_prefix(), page)
    }

    pub fn next_deposit_index(&self, denom: &str) -> QueryResult<NextDepositIndex> {
        require_denom(denom)?;
        let next_index = self.read_next_index(denom)?;
        Ok(NextDepositIndex {
            next_index,
            total_deposits: next_index,
        })
    }

    pub fn is_nullifier_used(&self, nullifier: &[u8]) -> QueryResult<NullifierStatus> {
        if nullifier.is_empty() {
            return Err(QueryError::InvalidParameters("nullifier cannot be empty".to_string()));
        }
        let record: Option<UsedNullifier> = records::load(self.store, &keys::nullifier_key(nullifier))?;
        Ok(match record {
            Some(used) => NullifierStatus {
                used: true,
                spent_at_height: Some(used.spent_at_height),
                spent_tx_hash: Some(used.spent_tx_hash),
            },
            None => NullifierStatus {
                used: false,
                spent_at_height: None,
                spent_tx_hash: None,
            },
        })
    }

    /// Hex form of [`is_nullifier_used`](Self::is_nullifier_used)
    pub fn is_nullifier_used_hex(&self, nullifier_hex: &str) -> QueryResult<NullifierStatus> {
        let bytes = hex::decode(nullifier_hex).map_err(|e| {
            QueryError::InvalidParameters(format!("invalid nullifier hex encoding: {}", e))
        })?;
        self.is_nullifier_used(&bytes)
    }

    /// Deposits `[start, end)`, capped at [`MAX_RANGE_SIZE`]; stops at the
    /// first missing index.
    pub fn deposits_by_range(&self, denom: &str, start: u64, end: u64) -> QueryResult<DepositRange> {
        require_denom(denom)?;
        if start >= end {
            return Err(QueryError::InvalidParameters(
                "start_index must be less than end_index".to_string(),
            ));
        }
        let end = end.min(start.saturating_add(MAX_RANGE_SIZE));

        let mut deposits = Vec::new();
        for index in start..end {
            match records::load::<PrivateDeposit, _>(self.store, &keys::deposit_key(denom, index))? {
                Some(deposit) => deposits.push(deposit),
                None => break,
            }
        }

        let end_index = start + deposits.len() as u64;
        Ok(DepositRange {
            deposits,
            start_index: start,
            end_index,
        })
    }

    /// Per-denom counts for allowed denoms with at least one deposit
    pub fn stats(&self) -> QueryResult<PoolStats> {
        let params = self.params()?;

        let mut spent_by_denom: HashMap<String, u64> = HashMap::new();
        for (_, value) in self.store.scan_prefix(&keys::nullifier_prefix(), None, None)? {
            match records::decode::<UsedNullifier>(&value) {
                Ok(used) => *spent_by_denom.entry(used.denom).or_insert(0) += 1,
                Err(e) => log::warn!("Skipping undecodable nullifier record: {:#}", e),
            }
        }

        let mut stats = PoolStats {
            total_deposits: 0,
            total_spent: 0,
            active_deposits: 0,
            denom_stats: Vec::new(),
            phase: params.phase,
        };

        for denom in &params.allowed_denoms {
            let total = self.read_next_index(denom)?;
            if total == 0 {
                continue;
            }
            let spent = spent_by_denom.get(denom).copied().unwrap_or(0);
            stats.denom_stats.push(DenomStats {
                denom: denom.clone(),
                total_deposits: total,
                active_deposits: total.saturating_sub(spent),
                total_value_locked: "0".to_string(),
            });
            stats.total_deposits += total;
            stats.total_spent += spent;
        }
        stats.active_deposits = stats.total_deposits.saturating_sub(stats.total_spent);
        Ok(stats)
    }

    fn read_next_index(&self, denom: &str) -> QueryResult<u64> {
        match self.store.get(&keys::next_deposit_index_key(denom))? {
            None => Ok(0),
            Some(bytes) => keys::decode_index(&bytes).ok_or_else(|| {
                QueryError::Database(anyhow::anyhow!("corrupt deposit index for {}", denom))
            }),
        }
    }

    fn paginate(&self, prefix: &[u8], page: &PageRequest) -> QueryResult<DepositsPage> {
        if page.key.is_some() && page.offset > 0 {
            return Err(QueryError::InvalidParameters(
                "either offset or key may be set, not both".to_string(),
            ));
        }
        let limit = page.effective_limit();

        let (entries, total) = match &page.key {
            Some(relative) => {
                let mut start = prefix.to_vec();
                start.extend_from_slice(relative);
                let entries = self
                    .store
                    .scan_prefix(prefix, Some(&start), Some(limit.saturating_add(1)))?;
                (entries, None)
            }
            None => {
                let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
                let scan_limit = if page.count_total {
                    None
                } else {
                    Some(offset.saturating_add(limit).saturating_add(1))
                };
                let all = self.store.scan_prefix(prefix, None, scan_limit)?;
                let total = page.count_total.then_some(all.len() as u64);
                (all.into_iter().skip(offset).collect::<Vec<_>>(), total)
            }
        };

        let next_key = entries.get(limit).map(|(key, _)| key[prefix.len()..].to_vec());
        let deposits = entries
            .into_iter()
            .take(limit)
            .map(|(_, value)| records::decode::<PrivateDeposit>(&value))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(DepositsPage {
            deposits,
            pagination: PageResponse { next_key, total },
        })
    }
}

fn require_denom(denom: &str) -> QueryResult<()> {
    if denom.is_empty() {
        return Err(QueryError::InvalidParameters("denomination cannot be empty".to_string()));
    }
    Ok(())
}
