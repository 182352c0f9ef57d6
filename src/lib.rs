// Core modules
pub mod crypto;
pub mod database;
pub mod privacy;

#[cfg(test)]
mod integration_test;

// Re-export main types for easy access
pub use crypto::{
    CryptoError, EcPoint, Nullifier, PedersenCommitment, Scalar, StealthKeyPair, StealthPublicKeys,
};
pub use database::{DBConfig, DatabaseManager, KvStore, MemoryStore, QueryEngine};
pub use privacy::{
    build_private_transfer, build_shield, build_unshield, BlockContext, Coin, MemoryBank,
    MsgPrivateTransfer, MsgShield, MsgUnshield, MsgUpdateParams, NoteScanner, OwnedDeposit,
    Phase, PoolError, PoolEvent, PoolParams, PoolResult, PoolStats, PrivacyPool,
};
