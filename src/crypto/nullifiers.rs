//! Nullifier (key image) generation and verification
//!
//! `I = x · Hp(P)` where `x` is the one-time private key and `Hp` hashes the
//! uncompressed one-time address onto the curve. The same deposit always yields
//! the same nullifier, so a second spend is caught by set membership alone.
//! The ledger never recomputes `I`; ownership is proven by the spend signature.

use crate::crypto::curve::{hash_to_point, scalar_mult, EcPoint, Scalar, COMPRESSED_POINT_LEN};
use crate::crypto::{CryptoError, CryptoResult, CryptoUtils};

/// Wire length of a nullifier
pub const NULLIFIER_LEN: usize = COMPRESSED_POINT_LEN;

/// A key image, stored with its compressed encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nullifier {
    point: EcPoint,
    bytes: [u8; NULLIFIER_LEN],
}

impl Nullifier {
    /// `x · Hp(uncompressed(P))`
    pub fn generate(one_time_private_key: &Scalar, one_time_address: &EcPoint) -> CryptoResult<Self> {
        if bool::from(one_time_private_key.is_zero()) {
            return Err(CryptoError::NullifierFailed("one-time private key is zero".to_string()));
        }
        let base = hash_to_point(&one_time_address.to_uncompressed()?)?;
        Self::from_point(scalar_mult(one_time_private_key, &base))
    }

    fn from_point(point: EcPoint) -> CryptoResult<Self> {
        let bytes = point
            .to_compressed()
            .map_err(|_| CryptoError::NullifierFailed("nullifier is the identity".to_string()))?;
        Ok(Self { point, bytes })
    }

    /// Parse the 33-byte wire form
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != NULLIFIER_LEN {
            return Err(CryptoError::NullifierFailed(format!(
                "nullifier must be {} bytes, got {}",
                NULLIFIER_LEN,
                bytes.len()
            )));
        }
        Self::from_point(EcPoint::from_compressed(bytes)?)
    }

    pub fn as_bytes(&self) -> &[u8; NULLIFIER_LEN] {
        &self.bytes
    }

    pub fn point(&self) -> &EcPoint {
        &self.point
    }

    /// SHA-256 of the wire form, for indexers that want a fixed 32-byte id
    pub fn hash(&self) -> [u8; 32] {
        CryptoUtils::sha256(&self.bytes)
    }

    /// Client-side self check: does this nullifier belong to `(x, P)`?
    pub fn verify_linkage(&self, one_time_address: &EcPoint, one_time_private_key: &Scalar) -> bool {
        match Self::generate(one_time_private_key, one_time_address) {
            Ok(expected) => CryptoUtils::constant_time_eq(&expected.bytes, &self.bytes),
            Err(_) => false,
        }
    }
}
