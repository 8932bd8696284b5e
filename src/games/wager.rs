//! Wire-level wager validation
//!
//! A malformed wager never fails the batch: it is carried as a zero-stake
//! entry so the caller still sees it in the per-wager breakdown.

use crate::games::payout::winning_payout;
use crate::games::types::{Pocket, RawWager, Wager, WagerKind};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Why a wager was skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedWager {
    #[error("wager must be an object, got {0}")]
    NotAnObject(String),

    #[error("missing wager kind")]
    MissingKind,

    #[error("wager kind must be a string")]
    InvalidKind,

    #[error("missing amount")]
    MissingAmount,

    #[error("amount '{0}' is not a number")]
    InvalidAmount(String),

    #[error("amount {0} is negative")]
    NegativeAmount(Decimal),

    #[error("amount {0} is too large to settle")]
    AmountTooLarge(Decimal),

    #[error("straight bet needs a pocket selector")]
    MissingSelector,

    #[error("selector '{0}' is not a pocket (0-36 or \"00\")")]
    InvalidSelector(String),
}

/// A wager after validation, keeping its position in the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWager {
    pub index: usize,
    /// Kind string as sent, for reporting malformed entries
    pub raw_kind: String,
    pub wager: Result<Wager, MalformedWager>,
}

impl ParsedWager {
    /// Stake counted toward the spin; zero for malformed wagers
    pub fn stake(&self) -> Decimal {
        self.wager.as_ref().map(|w| w.stake).unwrap_or(Decimal::ZERO)
    }
}

fn parse_amount(value: &serde_json::Value) -> Result<Decimal, MalformedWager> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => return Err(MalformedWager::InvalidAmount(other.to_string())),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| MalformedWager::InvalidAmount(text.clone()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MalformedWager::NegativeAmount(amount));
    }
    Ok(amount)
}

/// Validate one raw wager
pub fn parse_wager(raw: &RawWager) -> Result<Wager, MalformedWager> {
    if let Some(entry) = &raw.not_an_object {
        return Err(MalformedWager::NotAnObject(entry.clone()));
    }

    let kind = match &raw.kind {
        None | Some(serde_json::Value::Null) => return Err(MalformedWager::MissingKind),
        Some(serde_json::Value::String(s)) => WagerKind::parse(s),
        Some(_) => return Err(MalformedWager::InvalidKind),
    };

    let stake = match &raw.amount {
        None | Some(serde_json::Value::Null) => return Err(MalformedWager::MissingAmount),
        Some(value) => parse_amount(value)?,
    };
    if winning_payout(&kind, stake).is_none() {
        return Err(MalformedWager::AmountTooLarge(stake));
    }

    let selector = if kind == WagerKind::Straight {
        match &raw.selector {
            None | Some(serde_json::Value::Null) => return Err(MalformedWager::MissingSelector),
            Some(value) => Some(
                Pocket::from_json(value)
                    .ok_or_else(|| MalformedWager::InvalidSelector(selector_text(value)))?,
            ),
        }
    } else {
        None
    };

    Ok(Wager {
        kind,
        selector,
        stake,
    })
}

fn selector_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Validate a whole request, preserving order
pub fn parse_wagers(raw: &[RawWager]) -> Vec<ParsedWager> {
    raw.iter()
        .enumerate()
        .map(|(index, raw)| ParsedWager {
            index,
            raw_kind: match &raw.kind {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            wager: parse_wager(raw),
        })
        .collect()
}

/// Sum of stakes across valid wagers, `None` if it overflows
pub fn total_stake(parsed: &[ParsedWager]) -> Option<Decimal> {
    parsed
        .iter()
        .try_fold(Decimal::ZERO, |total, entry| total.checked_add(entry.stake()))
}
