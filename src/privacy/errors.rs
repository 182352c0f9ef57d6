//! Pool error types

use crate::crypto::CryptoError;
use crate::privacy::bank::BankError;
use crate::privacy::params::ParamsError;

/// Coarse classification used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    PolicyViolation,
    DoubleSpend,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    /// Only internal failures may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

/// State machine errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("privacy module is disabled")]
    ModuleDisabled,

    #[error("unsupported phase: {0}")]
    UnsupportedPhase(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("denom not allowed: {0}")]
    DenomNotAllowed(String),

    #[error("invalid denom: {0}")]
    InvalidDenom(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount below minimum: {0}")]
    AmountBelowMinimum(String),

    #[error("invalid one-time address: {0}")]
    InvalidOneTimeAddress(String),

    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),

    #[error("invalid note: {0}")]
    InvalidNote(String),

    #[error("memo too large: {0}")]
    MemoTooLarge(String),

    #[error("transfer has no inputs")]
    EmptyInputs,

    #[error("too many inputs: {0}")]
    TooManyInputs(String),

    #[error("transfer has no outputs")]
    EmptyOutputs,

    #[error("too many outputs: {0}")]
    TooManyOutputs(String),

    #[error("invalid nullifier: {0}")]
    InvalidNullifier(String),

    #[error("nullifier already used: {0}")]
    NullifierAlreadyUsed(String),

    #[error("deposit already spent: {0}")]
    DepositAlreadySpent(String),

    #[error("deposit not found: {0}")]
    DepositNotFound(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid balance commitment: {0}")]
    InvalidBalanceCommitment(String),

    #[error("invalid params: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("bank error: {0}")]
    Bank(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        use PoolError::*;
        match self {
            InvalidAddress(_)
            | InvalidDenom(_)
            | InvalidAmount(_)
            | InvalidOneTimeAddress(_)
            | InvalidCommitment(_)
            | InvalidNote(_)
            | EmptyInputs
            | EmptyOutputs
            | InvalidNullifier(_)
            | DepositNotFound(_)
            | InvalidBalanceCommitment(_)
            | InvalidParams(_) => ErrorKind::MalformedInput,

            ModuleDisabled
            | UnsupportedPhase(_)
            | DenomNotAllowed(_)
            | AmountBelowMinimum(_)
            | MemoTooLarge(_)
            | TooManyInputs(_)
            | TooManyOutputs(_)
            | InsufficientFunds(_) => ErrorKind::PolicyViolation,

            NullifierAlreadyUsed(_) | DepositAlreadySpent(_) => ErrorKind::DoubleSpend,

            Unauthorized(_) | InvalidSignature(_) => ErrorKind::Unauthorized,

            Bank(_) | Crypto(_) | Store(_) => ErrorKind::Internal,
        }
    }

    pub fn is_double_spend(&self) -> bool {
        self.kind() == ErrorKind::DoubleSpend
    }
}

impl From<BankError> for PoolError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::InvalidAddress(addr) => PoolError::InvalidAddress(addr),
            BankError::InsufficientFunds { .. } => PoolError::InsufficientFunds(err.to_string()),
            BankError::Backend(msg) => PoolError::Bank(msg),
        }
    }
}

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
