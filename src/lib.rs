//! Roulette Engine - American roulette bet resolution and balance settlement
//!
//! A spin takes a player's wager list, draws one of 38 pockets, evaluates
//! every wager against the pocket's attributes and applies the net result to
//! the player's balance as a single all-or-nothing unit.
//!
//! Balances live behind the [`ledger::BalanceLedger`] trait; the engine only
//! proposes compare-and-set deltas. [`api`] exposes the engine over HTTP.

pub mod api;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod notifications;

pub use config::EngineConfig;
pub use errors::{LedgerError, RouletteError, RouletteResult, SettlementError};
pub use games::{
    classify, FixedWheel, PlayerId, Pocket, RawWager, RngWheel, SequenceWheel, SettlementEngine,
    SettlementResult, Wager, WagerKind, WagerOutcome, Wheel,
};
pub use ledger::{BalanceLedger, InMemoryLedger};
pub use metrics::SettlementMetrics;
pub use notifications::{BroadcastSink, NoopSink, SettlementEvent, SettlementSink};
