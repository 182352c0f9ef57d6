//! Public-balance ledger collaborator
//!
//! The pool never keeps transparent balances itself. Shield moves funds into
//! pool custody and burns them; Unshield mints into custody and releases them.

use std::collections::HashMap;

use bech32::{FromBase32, Variant};
use parking_lot::Mutex;

use crate::privacy::types::Coin;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BankError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("{address} has {available}, needs {needed}")]
    InsufficientFunds {
        address: String,
        needed: u64,
        available: u64,
    },

    #[error("{0}")]
    Backend(String),
}

pub type BankResult<T> = Result<T, BankError>;

/// Account bookkeeping owned by the host ledger.
///
/// Shield and Unshield each make two calls (custody move then burn, mint
/// then release); both must run inside the host's atomic boundary so a
/// failure of the second call rolls back the first.
pub trait BankLedger: Send + Sync {
    fn validate_address(&self, address: &str) -> BankResult<()>;

    /// Move `coin` from `address` into pool custody
    fn transfer_to_custody(&self, address: &str, coin: &Coin) -> BankResult<()>;

    /// Destroy `coin` held in pool custody
    fn burn_from_custody(&self, coin: &Coin) -> BankResult<()>;

    /// Create `coin` in pool custody
    fn mint_to_custody(&self, coin: &Coin) -> BankResult<()>;

    /// Release `coin` from pool custody to `address`
    fn transfer_from_custody(&self, address: &str, coin: &Coin) -> BankResult<()>;
}

const MAX_ADDRESS_BYTES: usize = 255;
const CUSTODY: &str = "privacy-pool-custody";

#[derive(Debug, Default)]
struct Ledger {
    balances: HashMap<(String, String), u64>,
    supply: HashMap<String, u64>,
}

impl Ledger {
    fn balance(&self, address: &str, denom: &str) -> u64 {
        self.balances
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, address: &str, coin: &Coin) -> BankResult<()> {
        let entry = self
            .balances
            .entry((address.to_string(), coin.denom.clone()))
            .or_insert(0);
        *entry = entry
            .checked_add(coin.amount)
            .ok_or_else(|| BankError::Backend(format!("balance overflow for {}", address)))?;
        Ok(())
    }

    fn debit(&mut self, address: &str, coin: &Coin) -> BankResult<()> {
        let available = self.balance(address, &coin.denom);
        if available < coin.amount {
            return Err(BankError::InsufficientFunds {
                address: address.to_string(),
                needed: coin.amount,
                available,
            });
        }
        self.balances
            .insert((address.to_string(), coin.denom.clone()), available - coin.amount);
        Ok(())
    }
}

/// In-memory bank for tests and the demo.
///
/// Addresses are checksummed bech32 under the configured prefix with a
/// non-empty payload of at most 255 bytes.
#[derive(Debug)]
pub struct MemoryBank {
    hrp: String,
    ledger: Mutex<Ledger>,
}

impl MemoryBank {
    pub fn new(hrp: impl Into<String>) -> Self {
        Self {
            hrp: hrp.into(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Mint straight into an account
    pub fn fund(&self, address: &str, coin: &Coin) -> BankResult<()> {
        self.validate_address(address)?;
        let mut ledger = self.ledger.lock();
        ledger.credit(address, coin)?;
        *ledger.supply.entry(coin.denom.clone()).or_insert(0) += coin.amount;
        Ok(())
    }

    pub fn balance(&self, address: &str, denom: &str) -> u64 {
        self.ledger.lock().balance(address, denom)
    }

    pub fn custody_balance(&self, denom: &str) -> u64 {
        self.ledger.lock().balance(CUSTODY, denom)
    }

    /// Transparent supply of `denom`
    pub fn supply(&self, denom: &str) -> u64 {
        self.ledger.lock().supply.get(denom).copied().unwrap_or(0)
    }
}

impl BankLedger for MemoryBank {
    fn validate_address(&self, address: &str) -> BankResult<()> {
        let invalid = || BankError::InvalidAddress(address.to_string());
        let (hrp, data, variant) = bech32::decode(address).map_err(|_| invalid())?;
        if hrp != self.hrp || variant != Variant::Bech32 {
            return Err(invalid());
        }
        let payload = Vec::<u8>::from_base32(&data).map_err(|_| invalid())?;
        if payload.is_empty() || payload.len() > MAX_ADDRESS_BYTES {
            return Err(invalid());
        }
        Ok(())
    }

    fn transfer_to_custody(&self, address: &str, coin: &Coin) -> BankResult<()> {
        let mut ledger = self.ledger.lock();
        ledger.debit(address, coin)?;
        ledger.credit(CUSTODY, coin)
    }

    fn burn_from_custody(&self, coin: &Coin) -> BankResult<()> {
        let mut ledger = self.ledger.lock();
        ledger.debit(CUSTODY, coin)?;
        let supply = ledger.supply.entry(coin.denom.clone()).or_insert(0);
        *supply = supply.saturating_sub(coin.amount);
        Ok(())
    }

    fn mint_to_custody(&self, coin: &Coin) -> BankResult<()> {
        let mut ledger = self.ledger.lock();
        ledger.credit(CUSTODY, coin)?;
        *ledger.supply.entry(coin.denom.clone()).or_insert(0) += coin.amount;
        Ok(())
    }

    fn transfer_from_custody(&self, address: &str, coin: &Coin) -> BankResult<()> {
        let mut ledger = self.ledger.lock();
        ledger.debit(CUSTODY, coin)?;
        ledger.credit(address, coin)
    }
}
