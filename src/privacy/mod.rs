//! Privacy Module
//!
//! The pool state machine, its collaborators (bank, events) and the wallet-side
//! scanner and message builders.

pub mod types;
pub mod params;
pub mod errors;
pub mod bank;
pub mod events;
pub mod privacy_pool;
pub mod note_scanner;
pub mod client;

// Re-export main types
pub use types::{
    BlockContext, Coin, DenomStats, MsgPrivateTransfer, MsgShield, MsgUnshield, MsgUpdateParams,
    PoolStats, PrivateDeposit, UsedNullifier,
};
pub use params::{Phase, PoolParams, ProofSystem};
pub use errors::{ErrorKind, PoolError, PoolResult};
pub use bank::{BankError, BankLedger, MemoryBank};
pub use events::{EventSink, LogEventSink, MemoryEventSink, PoolEvent};
pub use privacy_pool::PrivacyPool;
pub use note_scanner::{NoteScanner, OwnedDeposit};
pub use client::{build_private_transfer, build_shield, build_unshield};
