//! Error types for the roulette settlement engine
//!
//! Ledger, settlement and configuration failures each get their own enum;
//! `RouletteError` ties them together for callers that do not care which
//! layer failed.

use crate::games::types::PlayerId;
use rust_decimal::Decimal;

/// Root error type for all engine operations
#[derive(Debug, thiserror::Error)]
pub enum RouletteError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

/// Errors reported by a balance ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The balance moved between read and write; the caller should re-read and retry
    #[error("Concurrent modification: expected balance {expected}, found {actual}")]
    ConcurrentModification { expected: Decimal, actual: Decimal },

    #[error("Account not found: {0}")]
    AccountNotFound(PlayerId),

    #[error("Account already exists: {0}")]
    AccountExists(PlayerId),

    #[error("Delta {delta} would leave balance {balance} negative")]
    NegativeBalance { balance: Decimal, delta: Decimal },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Delta {delta} would overflow balance {balance}")]
    Overflow { balance: Decimal, delta: Decimal },

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by `SettlementEngine::resolve_spin`
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("Insufficient balance: wagers total {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("Too many wagers: {count} submitted (max {max})")]
    TooManyWagers { count: usize, max: usize },

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Stakes, winnings or the resulting balance exceed the representable range
    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Ledger kept changing underneath the spin after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Rollback failed, stake {stake} not returned to {player}: {reason}")]
    RollbackFailed {
        player: PlayerId,
        stake: Decimal,
        reason: String,
    },

    #[error("Settlement task aborted: {0}")]
    Aborted(String),
}

impl SettlementError {
    /// Service-side failures the caller may resubmit unchanged.
    ///
    /// Domain rejections (balance, wager count, unknown player) are not retryable
    /// as-is, and a failed rollback needs operator attention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SettlementError::LedgerUnavailable(_)
                | SettlementError::RetriesExhausted { .. }
                | SettlementError::Aborted(_)
        )
    }

    /// Stable machine-readable code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            SettlementError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            SettlementError::TooManyWagers { .. } => "TOO_MANY_WAGERS",
            SettlementError::UnknownPlayer(_) => "UNKNOWN_PLAYER",
            SettlementError::AmountOverflow(_) => "AMOUNT_OVERFLOW",
            SettlementError::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
            SettlementError::RetriesExhausted { .. } => "LEDGER_CONFLICT",
            SettlementError::RollbackFailed { .. } => "ROLLBACK_FAILED",
            SettlementError::Aborted(_) => "SETTLEMENT_ABORTED",
        }
    }
}

// Convenience type alias for Results
pub type RouletteResult<T> = Result<T, RouletteError>;
