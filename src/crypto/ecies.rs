//! Note Encryption
//!
//! ECDH-keyed AES-256-GCM for the `(amount, blinding)` opening of a deposit's
//! commitment. The shared secret is the stealth-address secret, so only the
//! holder of the recipient's view key can decrypt.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::crypto::curve::{hash_to_scalar, scalar_base_mult, scalar_from_bytes, scalar_to_bytes, EcPoint, Scalar};
use crate::crypto::{domains, CryptoError, CryptoResult, CryptoUtils};

/// AES-GCM nonce length
pub const NONCE_LEN: usize = 12;

/// `LE64(amount) || BE256(blinding)`
pub const NOTE_PLAINTEXT_LEN: usize = 40;

/// AES-GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Decrypted note contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePlaintext {
    pub amount: u64,
    pub blinding: Scalar,
}

/// Encrypted note as it travels on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCiphertext {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
    /// Carried for wire compatibility; decryption does not use it
    pub ephemeral_key: EcPoint,
}

impl NotePlaintext {
    pub fn to_bytes(&self) -> [u8; NOTE_PLAINTEXT_LEN] {
        let mut out = [0u8; NOTE_PLAINTEXT_LEN];
        out[..8].copy_from_slice(&self.amount.to_le_bytes());
        out[8..].copy_from_slice(&scalar_to_bytes(&self.blinding));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != NOTE_PLAINTEXT_LEN {
            return Err(CryptoError::DecryptionFailed);
        }
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&bytes[..8]);
        let blinding = scalar_from_bytes(&bytes[8..]).map_err(|_| CryptoError::DecryptionFailed)?;
        Ok(Self {
            amount: u64::from_le_bytes(amount),
            blinding,
        })
    }
}

/// Note encryption under the stealth shared secret
pub struct NoteEncryption;

impl NoteEncryption {
    /// Encrypt `(amount, blinding)` for whoever shares `shared_secret`
    pub fn encrypt_note(amount: u64, blinding: &Scalar, shared_secret: &[u8; 32]) -> CryptoResult<NoteCiphertext> {
        let plaintext = NotePlaintext {
            amount,
            blinding: *blinding,
        };

        let nonce_bytes = CryptoUtils::random_12();
        let cipher = Self::cipher(shared_secret);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), &plaintext.to_bytes()[..])
            .map_err(|e| CryptoError::EncryptionFailed(format!("{:?}", e)))?;

        Ok(NoteCiphertext {
            ciphertext,
            nonce: nonce_bytes,
            ephemeral_key: Self::derive_ephemeral_key(shared_secret),
        })
    }

    /// Decrypt a note. Fails closed on a wrong key, a wrong nonce length, a
    /// tampered ciphertext or a malformed plaintext.
    pub fn decrypt_note(ciphertext: &[u8], nonce: &[u8], shared_secret: &[u8; 32]) -> CryptoResult<NotePlaintext> {
        if nonce.len() != NONCE_LEN {
            return Err(CryptoError::DecryptionFailed);
        }
        let cipher = Self::cipher(shared_secret);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        NotePlaintext::from_bytes(&plaintext)
    }

    /// `SHA256(shared_secret || "note_encryption")`
    pub fn derive_encryption_key(shared_secret: &[u8; 32]) -> [u8; 32] {
        CryptoUtils::sha256_concat(&[&shared_secret[..], domains::DOMAIN_NOTE])
    }

    /// `Hs(shared_secret || "ephemeral_key")·G`
    pub fn derive_ephemeral_key(shared_secret: &[u8; 32]) -> EcPoint {
        let mut seed = Vec::with_capacity(shared_secret.len() + domains::DOMAIN_EPHEMERAL.len());
        seed.extend_from_slice(shared_secret);
        seed.extend_from_slice(domains::DOMAIN_EPHEMERAL);
        scalar_base_mult(&hash_to_scalar(&seed))
    }

    fn cipher(shared_secret: &[u8; 32]) -> Aes256Gcm {
        let key = Self::derive_encryption_key(shared_secret);
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key))
    }
}
