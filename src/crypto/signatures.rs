//! Spend Authorization Signatures
//!
//! ECDSA (secp256k1) over SHA-256 of the message, keyed by a deposit's one-time
//! private key. Signatures travel as 64-byte compact `R || S`.

use secp256k1::{ecdsa, Message, PublicKey, Secp256k1, SecretKey};

use crate::crypto::curve::{scalar_to_bytes, EcPoint, Scalar};
use crate::crypto::nullifiers::Nullifier;
use crate::crypto::{CryptoError, CryptoResult, CryptoUtils};

/// Compact signature length
pub const SIGNATURE_LEN: usize = 64;

/// ECDSA sign `SHA256(message)`
pub fn sign_message(private_key: &Scalar, message: &[u8]) -> CryptoResult<[u8; SIGNATURE_LEN]> {
    if message.is_empty() {
        return Err(CryptoError::InvalidInput("message is empty".to_string()));
    }

    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(&scalar_to_bytes(private_key))
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;

    let message_hash = CryptoUtils::sha256(message);
    let message = Message::from_digest_slice(&message_hash)
        .map_err(|e| CryptoError::InvalidInput(format!("Invalid message hash: {}", e)))?;

    Ok(secp.sign_ecdsa(&message, &secret_key).serialize_compact())
}

/// Verify a compact signature against `public_key`. Any malformed input is a
/// plain `false`.
pub fn verify_message(public_key: &EcPoint, message: &[u8], signature: &[u8]) -> bool {
    if message.is_empty() || signature.len() != SIGNATURE_LEN {
        return false;
    }

    let public_key = match public_key
        .to_compressed()
        .ok()
        .and_then(|bytes| PublicKey::from_slice(&bytes).ok())
    {
        Some(pk) => pk,
        None => return false,
    };

    let mut signature = match ecdsa::Signature::from_compact(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    // high-S signatures are accepted as their low-S twin
    signature.normalize_s();

    let message_hash = CryptoUtils::sha256(message);
    let message = match Message::from_digest_slice(&message_hash) {
        Ok(m) => m,
        Err(_) => return false,
    };

    Secp256k1::verification_only()
        .verify_ecdsa(&message, &signature, &public_key)
        .is_ok()
}

/// Proves knowledge of `x` for the deposit the nullifier spends.
/// Message: the nullifier's compressed bytes.
pub fn sign_nullifier(one_time_private_key: &Scalar, nullifier: &Nullifier) -> CryptoResult<[u8; SIGNATURE_LEN]> {
    sign_message(one_time_private_key, nullifier.as_bytes())
}

pub fn verify_nullifier_signature(one_time_address: &EcPoint, nullifier: &Nullifier, signature: &[u8]) -> bool {
    verify_message(one_time_address, nullifier.as_bytes(), signature)
}

/// `nullifier || recipient || amount`, no separators.
///
/// Byte-compatible with existing signers. Not length-prefixed.
pub fn unshield_message(nullifier: &Nullifier, recipient: &str, amount: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(nullifier.as_bytes().len() + recipient.len() + amount.len());
    message.extend_from_slice(nullifier.as_bytes());
    message.extend_from_slice(recipient.as_bytes());
    message.extend_from_slice(amount.as_bytes());
    message
}

/// Binds a withdrawal to its recipient and amount
pub fn sign_unshield(
    one_time_private_key: &Scalar,
    nullifier: &Nullifier,
    recipient: &str,
    amount: &str,
) -> CryptoResult<[u8; SIGNATURE_LEN]> {
    if recipient.is_empty() || amount.is_empty() {
        return Err(CryptoError::InvalidInput("recipient and amount are required".to_string()));
    }
    sign_message(one_time_private_key, &unshield_message(nullifier, recipient, amount))
}

pub fn verify_unshield_signature(
    one_time_address: &EcPoint,
    nullifier: &Nullifier,
    recipient: &str,
    amount: &str,
    signature: &[u8],
) -> bool {
    if recipient.is_empty() || amount.is_empty() {
        return false;
    }
    verify_message(one_time_address, &unshield_message(nullifier, recipient, amount), signature)
}
