//! Pool parameters
//!
//! Governance-controlled configuration. Stored under the params key and
//! replaced only through `UpdateParams`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const MAX_DEPOSITS_PER_TX_LIMIT: u32 = 128;
pub const MAX_MERKLE_TREE_DEPTH: u32 = 64;
pub const MAX_MEMO_SIZE_LIMIT: u32 = 4096;

/// Ciphertext allowance on top of `max_memo_size` (GCM tag plus slack)
pub const NOTE_ENVELOPE_OVERHEAD: usize = 48;

/// Operating phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Signature-authorized spends
    #[default]
    Phase1,
    /// zk-proof spends; not supported by this ledger
    Phase2,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Phase1 => write!(f, "phase1"),
            Phase::Phase2 => write!(f, "phase2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofSystem {
    #[default]
    Groth16,
    Plonk,
}

/// Parameter validation errors
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("max_deposits_per_tx must be between 1 and 128, got {0}")]
    MaxDepositsPerTx(u32),

    #[error("merkle_tree_depth must be between 1 and 64, got {0}")]
    MerkleTreeDepth(u32),

    #[error("max_memo_size cannot exceed 4096 bytes, got {0}")]
    MaxMemoSize(u32),

    #[error("nullifier_cache_duration must be non-negative, got {0}")]
    NullifierCacheDuration(i64),

    #[error("invalid denom {0:?}")]
    InvalidDenom(String),

    #[error("duplicate denom {0}")]
    DuplicateDenom(String),

    #[error("invalid minimum shield amount {value:?} for {denom}")]
    InvalidMinShieldAmount { denom: String, value: String },

    #[error("failed to read params file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse params: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Privacy pool parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolParams {
    pub enabled: bool,
    pub allowed_denoms: Vec<String>,
    /// Decimal strings keyed by denom
    pub min_shield_amounts: BTreeMap<String, String>,
    pub max_deposits_per_tx: u32,
    pub merkle_tree_depth: u32,
    pub proof_system: ProofSystem,
    pub max_memo_size: u32,
    pub nullifier_cache_duration: i64,
    pub phase: Phase,
    // Stored for the host's fee schedule; never charged here
    pub shield_gas_cost: u64,
    pub unshield_gas_cost: u64,
    pub private_transfer_gas_cost: u64,
    pub verify_proof_gas_cost: u64,
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_denoms: Vec::new(),
            min_shield_amounts: BTreeMap::new(),
            max_deposits_per_tx: 16,
            merkle_tree_depth: 32,
            proof_system: ProofSystem::Groth16,
            max_memo_size: 512,
            nullifier_cache_duration: 100_000,
            phase: Phase::Phase1,
            shield_gas_cost: 50_000,
            unshield_gas_cost: 50_000,
            private_transfer_gas_cost: 100_000,
            verify_proof_gas_cost: 500_000,
        }
    }
}

impl PoolParams {
    /// Enabled params admitting `denoms`
    pub fn enabled_for(denoms: &[&str]) -> Self {
        Self {
            enabled: true,
            allowed_denoms: denoms.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Load and validate a JSON params file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ParamsError> {
        let params: Self = serde_json::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_deposits_per_tx == 0 || self.max_deposits_per_tx > MAX_DEPOSITS_PER_TX_LIMIT {
            return Err(ParamsError::MaxDepositsPerTx(self.max_deposits_per_tx));
        }
        if self.merkle_tree_depth == 0 || self.merkle_tree_depth > MAX_MERKLE_TREE_DEPTH {
            return Err(ParamsError::MerkleTreeDepth(self.merkle_tree_depth));
        }
        if self.max_memo_size > MAX_MEMO_SIZE_LIMIT {
            return Err(ParamsError::MaxMemoSize(self.max_memo_size));
        }
        if self.nullifier_cache_duration < 0 {
            return Err(ParamsError::NullifierCacheDuration(self.nullifier_cache_duration));
        }

        let mut seen = HashSet::new();
        for denom in &self.allowed_denoms {
            // NUL is the key separator between denom and index
            if denom.is_empty() || denom.contains('\0') {
                return Err(ParamsError::InvalidDenom(denom.clone()));
            }
            if !seen.insert(denom.as_str()) {
                return Err(ParamsError::DuplicateDenom(denom.clone()));
            }
        }

        for denom in self.min_shield_amounts.keys() {
            self.min_shield_amount(denom)?;
        }
        Ok(())
    }

    pub fn is_denom_allowed(&self, denom: &str) -> bool {
        self.allowed_denoms.iter().any(|d| d == denom)
    }

    /// Configured minimum for `denom`, if any
    pub fn min_shield_amount(&self, denom: &str) -> Result<Option<u64>, ParamsError> {
        match self.min_shield_amounts.get(denom) {
            None => Ok(None),
            Some(value) => value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ParamsError::InvalidMinShieldAmount {
                    denom: denom.to_string(),
                    value: value.clone(),
                }),
        }
    }

    /// Largest accepted note ciphertext
    pub fn max_note_size(&self) -> usize {
        self.max_memo_size as usize + NOTE_ENVELOPE_OVERHEAD
    }
}
