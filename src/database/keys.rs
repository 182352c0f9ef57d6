//! Store key layout
//!
//! ```text
//! params            0x01
//! deposit           0x02 | denom | 0x00 | index (u64 BE)
//! next index        0x03 | denom
//! used nullifier    0x04 | nullifier bytes
//! ```
//!
//! Big-endian indices keep a denom's deposits in index order under a prefix
//! scan.

/// Key prefixes
pub mod prefixes {
    pub const PARAMS: u8 = 0x01;
    pub const DEPOSIT: u8 = 0x02;
    pub const NEXT_DEPOSIT_INDEX: u8 = 0x03;
    pub const NULLIFIER: u8 = 0x04;
}

/// Separates the variable-length denom from the index in deposit keys
pub const DENOM_SEPARATOR: u8 = 0x00;

pub fn params_key() -> Vec<u8> {
    vec![prefixes::PARAMS]
}

pub fn deposit_key(denom: &str, index: u64) -> Vec<u8> {
    let mut key = deposit_denom_prefix(denom);
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// All deposits of one denom
pub fn deposit_denom_prefix(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + denom.len() + 8);
    key.push(prefixes::DEPOSIT);
    key.extend_from_slice(denom.as_bytes());
    key.push(DENOM_SEPARATOR);
    key
}

/// All deposits of every denom
pub fn deposit_prefix() -> Vec<u8> {
    vec![prefixes::DEPOSIT]
}

pub fn next_deposit_index_key(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + denom.len());
    key.push(prefixes::NEXT_DEPOSIT_INDEX);
    key.extend_from_slice(denom.as_bytes());
    key
}

pub fn nullifier_key(nullifier: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + nullifier.len());
    key.push(prefixes::NULLIFIER);
    key.extend_from_slice(nullifier);
    key
}

pub fn nullifier_prefix() -> Vec<u8> {
    vec![prefixes::NULLIFIER]
}

/// Inverse of [`deposit_key`]
pub fn parse_deposit_key(key: &[u8]) -> Option<(String, u64)> {
    if key.len() < 10 || key[0] != prefixes::DEPOSIT {
        return None;
    }
    let (head, index) = key.split_at(key.len() - 8);
    if head[head.len() - 1] != DENOM_SEPARATOR {
        return None;
    }
    let denom = std::str::from_utf8(&head[1..head.len() - 1]).ok()?;
    let mut index_bytes = [0u8; 8];
    index_bytes.copy_from_slice(index);
    Some((denom.to_string(), u64::from_be_bytes(index_bytes)))
}

/// Counter values are stored as raw 8-byte big-endian integers
pub fn encode_index(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}

pub fn decode_index(bytes: &[u8]) -> Option<u64> {
    let array: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(array))
}
