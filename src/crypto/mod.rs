//! Cryptographic Primitives Module
//!
//! secp256k1 building blocks for the shielded pool:
//! - Curve arithmetic and the second generator `H`
//! - Pedersen commitments with homomorphic balance checks
//! - Stealth (one-time) addresses
//! - Nullifiers (key images)
//! - ECDSA spend authorization
//! - AES-256-GCM note encryption

use rand::RngCore;
use sha2::Digest;

pub mod curve;
pub mod commitments;
pub mod stealth;
pub mod nullifiers;
pub mod signatures;
pub mod ecies;

// Re-export main types
pub use curve::{EcPoint, Scalar};
pub use commitments::PedersenCommitment;
pub use stealth::{OneTimeAddress, StealthAddressOutput, StealthKeyPair, StealthPublicKeys};
pub use nullifiers::Nullifier;
pub use ecies::{NoteCiphertext, NoteEncryption, NotePlaintext};

/// Cryptographic error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    #[error("Point is the identity element")]
    IdentityPoint,

    #[error("Invalid scalar: {0}")]
    InvalidScalar(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Commitment generation failed: {0}")]
    CommitmentFailed(String),

    #[error("Nullifier generation failed: {0}")]
    NullifierFailed(String),

    #[error("hash-to-point found no curve point after {0} attempts")]
    HashToPointExhausted(usize),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Note decryption failed")]
    DecryptionFailed,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Domain constants for cryptographic operations
pub mod domains {
    /// Seed hashed onto the curve to obtain the second generator `H`
    pub const DOMAIN_H_GENERATOR: &[u8] = b"privacy-pool-ledger/pedersen/H";

    /// Suffix appended to the ECDH shared secret to derive the note key
    pub const DOMAIN_NOTE: &[u8] = b"note_encryption";

    /// Suffix appended to the ECDH shared secret to derive the ephemeral key
    pub const DOMAIN_EPHEMERAL: &[u8] = b"ephemeral_key";
}

/// Cryptographic utilities
pub struct CryptoUtils;

impl CryptoUtils {
    /// Generate cryptographically secure random bytes
    pub fn random_bytes(length: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; length];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Generate random 12-byte array (AES-GCM nonce)
    pub fn random_12() -> [u8; 12] {
        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Hash data with SHA-256
    pub fn sha256(data: &[u8]) -> [u8; 32] {
        sha2::Sha256::digest(data).into()
    }

    /// Hash the concatenation of several slices with SHA-256
    pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
        let mut hasher = sha2::Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().into()
    }

    /// Constant-time comparison of byte arrays
    pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
        use subtle::ConstantTimeEq;
        a.ct_eq(b).into()
    }

    /// Convert bytes to hex string
    pub fn to_hex(bytes: &[u8]) -> String {
        hex::encode(bytes)
    }

    /// Convert hex string to bytes
    pub fn from_hex(hex: &str) -> CryptoResult<Vec<u8>> {
        hex::decode(hex.trim_start_matches("0x"))
            .map_err(|e| CryptoError::SerializationError(e.to_string()))
    }
}
