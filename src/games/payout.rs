//! Payout table and wager evaluation

use crate::games::types::{
    Classification, Color, Column, Dozen, Half, Parity, Pocket, Wager, WagerKind,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net winnings per unit stake, by kind. Kinds absent here never pay.
pub const PAYOUT_TABLE: [(WagerKind, u32); 13] = [
    (WagerKind::Straight, 35),
    (WagerKind::Red, 1),
    (WagerKind::Black, 1),
    (WagerKind::Even, 1),
    (WagerKind::Odd, 1),
    (WagerKind::FirstDozen, 2),
    (WagerKind::SecondDozen, 2),
    (WagerKind::ThirdDozen, 2),
    (WagerKind::Column1, 2),
    (WagerKind::Column2, 2),
    (WagerKind::Column3, 2),
    (WagerKind::Low, 1),
    (WagerKind::High, 1),
];

/// Largest multiplier in the table (straight up)
pub const MAX_PAYOUT_MULTIPLIER: u32 = 35;

pub fn payout_multiplier(kind: &WagerKind) -> Option<u32> {
    PAYOUT_TABLE
        .iter()
        .find(|(k, _)| k == kind)
        .map(|(_, multiplier)| *multiplier)
}

/// Whether a wager wins against a drawn pocket
pub fn wins(wager: &Wager, pocket: Pocket, classification: &Classification) -> bool {
    match wager.kind {
        WagerKind::Straight => wager.selector == Some(pocket),
        WagerKind::Red => classification.color == Color::Red,
        WagerKind::Black => classification.color == Color::Black,
        WagerKind::Even => classification.parity == Some(Parity::Even),
        WagerKind::Odd => classification.parity == Some(Parity::Odd),
        WagerKind::FirstDozen => classification.dozen == Some(Dozen::First),
        WagerKind::SecondDozen => classification.dozen == Some(Dozen::Second),
        WagerKind::ThirdDozen => classification.dozen == Some(Dozen::Third),
        WagerKind::Column1 => classification.column == Some(Column::First),
        WagerKind::Column2 => classification.column == Some(Column::Second),
        WagerKind::Column3 => classification.column == Some(Column::Third),
        WagerKind::Low => classification.half == Some(Half::Low),
        WagerKind::High => classification.half == Some(Half::High),
        WagerKind::Unknown(_) => false,
    }
}

/// Amount returned when `stake` wins on `kind`, or `None` if it does not fit a `Decimal`.
///
/// Kinds without a table entry never pay, so their payout is zero.
pub fn winning_payout(kind: &WagerKind, stake: Decimal) -> Option<Decimal> {
    match payout_multiplier(kind) {
        Some(multiplier) => stake.checked_mul(Decimal::from(multiplier + 1)),
        None => Some(Decimal::ZERO),
    }
}

/// Amount returned for a wager: `stake * (multiplier + 1)` when won, else zero.
///
/// Returns `(won, payout)`, or `None` when the payout overflows.
pub fn evaluate(wager: &Wager, pocket: Pocket, classification: &Classification) -> Option<(bool, Decimal)> {
    if payout_multiplier(&wager.kind).is_some() && wins(wager, pocket, classification) {
        winning_payout(&wager.kind, wager.stake).map(|payout| (true, payout))
    } else {
        Some((false, Decimal::ZERO))
    }
}

/// Table entry as published to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutInfo {
    pub kind: String,
    pub payout_multiplier: u32,
    pub description: String,
}

fn describe(kind: &WagerKind) -> &'static str {
    match kind {
        WagerKind::Straight => "Single pocket (0, 00, 1-36)",
        WagerKind::Red => "18 red numbers",
        WagerKind::Black => "18 black numbers",
        WagerKind::Even => "Even numbers (0 and 00 lose)",
        WagerKind::Odd => "Odd numbers",
        WagerKind::FirstDozen => "1-12",
        WagerKind::SecondDozen => "13-24",
        WagerKind::ThirdDozen => "25-36",
        WagerKind::Column1 => "1, 4, 7, ..., 34",
        WagerKind::Column2 => "2, 5, 8, ..., 35",
        WagerKind::Column3 => "3, 6, 9, ..., 36",
        WagerKind::Low => "1-18",
        WagerKind::High => "19-36",
        WagerKind::Unknown(_) => "Not payable",
    }
}

pub fn payout_info() -> Vec<PayoutInfo> {
    PAYOUT_TABLE
        .iter()
        .map(|(kind, multiplier)| PayoutInfo {
            kind: kind.as_str().to_string(),
            payout_multiplier: *multiplier,
            description: describe(kind).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::classifier::classify;
    use rust_decimal_macros::dec;

    fn eval(wager: &Wager, pocket: Pocket) -> (bool, Decimal) {
        evaluate(wager, pocket, &classify(pocket)).unwrap()
    }

    #[test]
    fn test_every_known_kind_has_an_entry() {
        for kind in WagerKind::KNOWN.iter() {
            assert!(payout_multiplier(kind).is_some(), "{}", kind);
        }
        assert_eq!(payout_multiplier(&WagerKind::Unknown("split".into())), None);
        assert_eq!(payout_multiplier(&WagerKind::Straight), Some(MAX_PAYOUT_MULTIPLIER));
    }

    #[test]
    fn test_evaluate_straight_win() {
        let wager = Wager::straight(Pocket::Number(17), dec!(10));
        assert_eq!(eval(&wager, Pocket::Number(17)), (true, dec!(360)));
        assert_eq!(eval(&wager, Pocket::Number(18)), (false, dec!(0)));
    }

    #[test]
    fn test_straight_distinguishes_zero_and_double_zero() {
        let on_zero = Wager::straight(Pocket::ZERO, dec!(1));
        let on_double_zero = Wager::straight(Pocket::DoubleZero, dec!(1));

        assert!(eval(&on_zero, Pocket::ZERO).0);
        assert!(!eval(&on_zero, Pocket::DoubleZero).0);
        assert!(eval(&on_double_zero, Pocket::DoubleZero).0);
        assert!(!eval(&on_double_zero, Pocket::ZERO).0);
    }

    #[test]
    fn test_evaluate_red() {
        let wager = Wager::new(WagerKind::Red, dec!(20));
        assert_eq!(eval(&wager, Pocket::Number(1)), (true, dec!(40)));
        assert_eq!(eval(&wager, Pocket::Number(2)), (false, dec!(0)));
        assert_eq!(eval(&wager, Pocket::ZERO), (false, dec!(0)));
    }

    #[test]
    fn test_even_odd_lose_on_zero_pockets() {
        let even = Wager::new(WagerKind::Even, dec!(5));
        let odd = Wager::new(WagerKind::Odd, dec!(5));

        assert!(eval(&even, Pocket::Number(2)).0);
        assert!(eval(&odd, Pocket::Number(3)).0);
        for pocket in [Pocket::ZERO, Pocket::DoubleZero] {
            assert!(!eval(&even, pocket).0);
            assert!(!eval(&odd, pocket).0);
        }
    }

    #[test]
    fn test_two_to_one_bets() {
        let dozen = Wager::new(WagerKind::SecondDozen, dec!(10));
        let column = Wager::new(WagerKind::Column3, dec!(10));

        assert_eq!(eval(&dozen, Pocket::Number(13)), (true, dec!(30)));
        assert!(!eval(&dozen, Pocket::Number(25)).0);
        assert_eq!(eval(&column, Pocket::Number(36)), (true, dec!(30)));
        assert!(!eval(&column, Pocket::Number(34)).0);
    }

    #[test]
    fn test_halves() {
        let low = Wager::new(WagerKind::Low, dec!(2.5));
        let high = Wager::new(WagerKind::High, dec!(2.5));

        assert_eq!(eval(&low, Pocket::Number(18)), (true, dec!(5.0)));
        assert!(!eval(&low, Pocket::Number(19)).0);
        assert!(eval(&high, Pocket::Number(19)).0);
        assert!(!eval(&high, Pocket::DoubleZero).0);
    }

    #[test]
    fn test_unknown_kind_always_loses() {
        let wager = Wager::new(WagerKind::Unknown("corner".into()), dec!(10));
        for pocket in Pocket::all() {
            assert_eq!(eval(&wager, pocket), (false, dec!(0)));
        }
    }

    #[test]
    fn test_payout_info_lists_table() {
        let info = payout_info();
        assert_eq!(info.len(), PAYOUT_TABLE.len());
        assert_eq!(info[0].kind, "straight");
        assert_eq!(info[0].payout_multiplier, 35);
    }

    #[test]
    fn test_oversized_payout_is_reported_not_computed() {
        let huge = Decimal::MAX - dec!(1);
        assert_eq!(winning_payout(&WagerKind::Red, huge), None);
        assert_eq!(winning_payout(&WagerKind::Unknown("split".into()), huge), Some(Decimal::ZERO));

        let wager = Wager::new(WagerKind::Red, huge);
        assert_eq!(evaluate(&wager, Pocket::Number(1), &classify(Pocket::Number(1))), None);
        assert_eq!(
            evaluate(&wager, Pocket::Number(2), &classify(Pocket::Number(2))),
            Some((false, dec!(0)))
        );
    }
}
