//! Roulette game logic: wheel, classification, payouts, wager parsing and settlement

pub mod classifier;
pub mod payout;
pub mod settlement;
pub mod types;
pub mod wager;
pub mod wheel;

pub use classifier::classify;
pub use payout::{payout_info, payout_multiplier, PayoutInfo, PAYOUT_TABLE};
pub use settlement::{SettlementEngine, SpinPhase};
pub use types::*;
pub use wager::{parse_wagers, MalformedWager, ParsedWager};
pub use wheel::{FixedWheel, RngWheel, SequenceWheel, Wheel};
