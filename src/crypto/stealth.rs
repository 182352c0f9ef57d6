//! Stealth Addresses
//!
//! Dual-key (view/spend) one-time addresses:
//!
//! ```text
//! sender:    R = r·G,  s = SHA256(r·V),  P = Hs(s)·G + S
//! recipient: s = SHA256(v·R),  P' = Hs(s)·G + S,  x = Hs(s) + spend_priv
//! ```
//!
//! `V`/`S` are the recipient's view and spend public keys. Only the holder of
//! `v` can recognise `P`; only the holder of the spend key can sign for it.

use crate::crypto::curve::{
    hash_to_scalar, point_add, private_key_from_bytes, random_scalar, scalar_base_mult,
    scalar_mult, scalar_to_bytes, EcPoint, Scalar,
};
use crate::crypto::{CryptoError, CryptoResult, CryptoUtils};

/// A recipient's long-lived key material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthKeyPair {
    pub view_private: Scalar,
    pub view_public: EcPoint,
    pub spend_private: Scalar,
    pub spend_public: EcPoint,
}

/// The public half of a [`StealthKeyPair`], shared with senders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StealthPublicKeys {
    pub view: EcPoint,
    pub spend: EcPoint,
}

/// One-time address published with a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneTimeAddress {
    /// P, the one-time public key
    pub address: EcPoint,
    /// R = r·G
    pub tx_public_key: EcPoint,
}

/// Everything the sender learns while deriving a one-time address
#[derive(Debug, Clone)]
pub struct StealthAddressOutput {
    pub one_time: OneTimeAddress,
    pub shared_secret: [u8; 32],
    pub tx_private_key: Scalar,
}

impl StealthKeyPair {
    /// Fresh view and spend keys
    pub fn generate() -> Self {
        let view_private = random_scalar();
        let spend_private = random_scalar();
        Self {
            view_private,
            view_public: scalar_base_mult(&view_private),
            spend_private,
            spend_public: scalar_base_mult(&spend_private),
        }
    }

    pub fn from_private_keys(view_private: Scalar, spend_private: Scalar) -> CryptoResult<Self> {
        if bool::from(view_private.is_zero()) || bool::from(spend_private.is_zero()) {
            return Err(CryptoError::InvalidPrivateKey("private key is zero".to_string()));
        }
        Ok(Self {
            view_private,
            view_public: scalar_base_mult(&view_private),
            spend_private,
            spend_public: scalar_base_mult(&spend_private),
        })
    }

    /// Import from 32-byte big-endian hex keys
    pub fn from_hex(view_hex: &str, spend_hex: &str) -> CryptoResult<Self> {
        let view = private_key_from_bytes(&CryptoUtils::from_hex(view_hex)?)?;
        let spend = private_key_from_bytes(&CryptoUtils::from_hex(spend_hex)?)?;
        Self::from_private_keys(view, spend)
    }

    /// `(view_hex, spend_hex)`
    pub fn export_private_hex(&self) -> (String, String) {
        (
            CryptoUtils::to_hex(&scalar_to_bytes(&self.view_private)),
            CryptoUtils::to_hex(&scalar_to_bytes(&self.spend_private)),
        )
    }

    pub fn public_keys(&self) -> StealthPublicKeys {
        StealthPublicKeys {
            view: self.view_public,
            spend: self.spend_public,
        }
    }

    /// Ownership check for a one-time address; see [`check_if_mine`]
    pub fn check_if_mine(&self, one_time: &OneTimeAddress) -> CryptoResult<Option<Scalar>> {
        check_if_mine(one_time, &self.view_private, &self.spend_public, &self.spend_private)
    }
}

impl StealthPublicKeys {
    /// `(view_hex, spend_hex)` of the compressed points
    pub fn to_hex(&self) -> CryptoResult<(String, String)> {
        Ok((
            CryptoUtils::to_hex(&self.view.to_compressed()?),
            CryptoUtils::to_hex(&self.spend.to_compressed()?),
        ))
    }

    pub fn from_hex(view_hex: &str, spend_hex: &str) -> CryptoResult<Self> {
        let view = EcPoint::from_compressed(&CryptoUtils::from_hex(view_hex)?)
            .map_err(|e| CryptoError::InvalidPublicKey(format!("view key: {}", e)))?;
        let spend = EcPoint::from_compressed(&CryptoUtils::from_hex(spend_hex)?)
            .map_err(|e| CryptoError::InvalidPublicKey(format!("spend key: {}", e)))?;
        Ok(Self { view, spend })
    }
}

/// Derive a one-time address for `(view_public, spend_public)`
pub fn generate_stealth_address(
    view_public: &EcPoint,
    spend_public: &EcPoint,
) -> CryptoResult<StealthAddressOutput> {
    view_public
        .ensure_valid()
        .map_err(|e| CryptoError::InvalidPublicKey(format!("view key: {}", e)))?;
    spend_public
        .ensure_valid()
        .map_err(|e| CryptoError::InvalidPublicKey(format!("spend key: {}", e)))?;

    let r = random_scalar();
    let tx_public_key = scalar_base_mult(&r);
    let shared_secret = compute_shared_secret(&r, view_public)?;

    let address = point_add(&scalar_base_mult(&hash_to_scalar(&shared_secret)), spend_public);
    address.ensure_valid()?;

    Ok(StealthAddressOutput {
        one_time: OneTimeAddress {
            address,
            tx_public_key,
        },
        shared_secret,
        tx_private_key: r,
    })
}

/// Returns the one-time private key if `one_time` belongs to the given keys.
pub fn check_if_mine(
    one_time: &OneTimeAddress,
    view_private: &Scalar,
    spend_public: &EcPoint,
    spend_private: &Scalar,
) -> CryptoResult<Option<Scalar>> {
    let shared_secret = compute_shared_secret(view_private, &one_time.tx_public_key)?;
    let hs = hash_to_scalar(&shared_secret);
    let expected = point_add(&scalar_base_mult(&hs), spend_public);

    if expected != one_time.address {
        return Ok(None);
    }
    Ok(Some(hs + spend_private))
}

/// `SHA256(uncompressed(k·Q))`
pub fn compute_shared_secret(private_key: &Scalar, public_key: &EcPoint) -> CryptoResult<[u8; 32]> {
    let shared = scalar_mult(private_key, public_key);
    Ok(CryptoUtils::sha256(&shared.to_uncompressed()?))
}

/// `x = Hs(s) + spend_priv (mod n)`
pub fn derive_one_time_private_key(shared_secret: &[u8; 32], spend_private: &Scalar) -> Scalar {
    hash_to_scalar(shared_secret) + spend_private
}

/// Both published points must be usable
pub fn validate_one_time_address(one_time: &OneTimeAddress) -> CryptoResult<()> {
    one_time.address.ensure_valid()?;
    one_time.tx_public_key.ensure_valid()
}
