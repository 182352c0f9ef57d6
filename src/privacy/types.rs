//! Shared types for the privacy pool: stored records, messages and responses

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::crypto::curve::COORDINATE_LEN;
use crate::crypto::{CryptoError, CryptoResult, CryptoUtils, EcPoint, NoteCiphertext, OneTimeAddress};
use crate::privacy::params::{Phase, PoolParams};

/// Affine point as carried in messages and records: big-endian coordinates
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePoint {
    #[serde_as(as = "Hex")]
    pub x: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub y: Vec<u8>,
}

impl WirePoint {
    pub fn from_point(point: &EcPoint) -> CryptoResult<Self> {
        let (x, y) = point.coordinates()?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
        })
    }

    /// 32-byte coordinates, on-curve, not the identity
    pub fn to_point(&self) -> CryptoResult<EcPoint> {
        if self.x.len() != COORDINATE_LEN || self.y.len() != COORDINATE_LEN {
            return Err(CryptoError::InvalidPoint(format!(
                "coordinates must be {} bytes, got {} and {}",
                COORDINATE_LEN,
                self.x.len(),
                self.y.len()
            )));
        }
        let point = EcPoint::from_coordinates(&self.x, &self.y)?;
        point.ensure_valid()?;
        Ok(point)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeAddressData {
    pub address: WirePoint,
    pub tx_public_key: WirePoint,
}

impl OneTimeAddressData {
    pub fn from_one_time(one_time: &OneTimeAddress) -> CryptoResult<Self> {
        Ok(Self {
            address: WirePoint::from_point(&one_time.address)?,
            tx_public_key: WirePoint::from_point(&one_time.tx_public_key)?,
        })
    }

    pub fn to_one_time(&self) -> CryptoResult<OneTimeAddress> {
        Ok(OneTimeAddress {
            address: self.address.to_point()?,
            tx_public_key: self.tx_public_key.to_point()?,
        })
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedNoteData {
    #[serde_as(as = "Hex")]
    pub encrypted_data: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub nonce: Vec<u8>,
    pub ephemeral_key: WirePoint,
}

impl EncryptedNoteData {
    pub fn from_ciphertext(note: &NoteCiphertext) -> CryptoResult<Self> {
        Ok(Self {
            encrypted_data: note.ciphertext.clone(),
            nonce: note.nonce.to_vec(),
            ephemeral_key: WirePoint::from_point(&note.ephemeral_key)?,
        })
    }
}

/// A shielded deposit. Keyed by `(denom, index)`; `nullifier` is set once, on spend.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateDeposit {
    pub denom: String,
    pub index: u64,
    pub commitment: WirePoint,
    pub one_time_address: OneTimeAddressData,
    pub encrypted_note: EncryptedNoteData,
    #[serde_as(as = "Option<Hex>")]
    pub nullifier: Option<Vec<u8>>,
    pub created_at_height: u64,
    pub tx_hash: String,
}

impl PrivateDeposit {
    pub fn is_spent(&self) -> bool {
        self.nullifier.is_some()
    }
}

/// Spent-set entry. Its existence is the double-spend check.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedNullifier {
    #[serde_as(as = "Hex")]
    pub nullifier: Vec<u8>,
    pub spent_at_height: u64,
    pub spent_tx_hash: String,
    pub denom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u64,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Block the operation executes in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    pub tx_hash: String,
}

impl BlockContext {
    pub fn new(height: u64, tx_hash: impl Into<String>) -> Self {
        Self {
            height,
            tx_hash: tx_hash.into(),
        }
    }

    /// Tx hash as uppercase hex SHA-256 of the raw transaction
    pub fn from_tx_bytes(height: u64, tx_bytes: &[u8]) -> Self {
        Self {
            height,
            tx_hash: CryptoUtils::to_hex(&CryptoUtils::sha256(tx_bytes)).to_uppercase(),
        }
    }
}

// Messages

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgShield {
    pub sender: String,
    pub amount: Coin,
    pub one_time_address: OneTimeAddressData,
    pub commitment: WirePoint,
    pub encrypted_note: EncryptedNoteData,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInput {
    pub deposit_index: u64,
    #[serde_as(as = "Hex")]
    pub nullifier: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutput {
    pub denom: String,
    pub one_time_address: OneTimeAddressData,
    pub commitment: WirePoint,
    pub encrypted_note: EncryptedNoteData,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgPrivateTransfer {
    pub sender: String,
    pub denom: String,
    pub inputs: Vec<TransferInput>,
    pub outputs: Vec<TransferOutput>,
    pub balance_commitment: WirePoint,
    #[serde_as(as = "Option<Hex>")]
    pub zk_proof: Option<Vec<u8>>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUnshield {
    pub recipient: String,
    pub denom: String,
    /// Decimal string; signed exactly as written
    pub amount: String,
    #[serde_as(as = "Hex")]
    pub nullifier: Vec<u8>,
    pub commitment: WirePoint,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
    pub deposit_index: u64,
    #[serde_as(as = "Option<Hex>")]
    pub zk_proof: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub authority: String,
    pub params: PoolParams,
}

// Responses

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgShieldResponse {
    pub denom: String,
    pub deposit_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgPrivateTransferResponse {
    pub output_indices: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUnshieldResponse {
    pub amount: Coin,
}

/// Pool statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_deposits: u64,
    pub total_spent: u64,
    pub active_deposits: u64,
    pub denom_stats: Vec<DenomStats>,
    pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomStats {
    pub denom: String,
    pub total_deposits: u64,
    pub active_deposits: u64,
    /// Amounts are hidden behind commitments; always "0"
    pub total_value_locked: String,
}
