//! Pocket classification
//!
//! Pure functions from a pocket to its color, parity, dozen, column and half.

use crate::games::types::{Classification, Color, Column, Dozen, Half, Parity, Pocket};

/// The eighteen red numbers of the standard layout
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// The eighteen black numbers of the standard layout
pub const BLACK_NUMBERS: [u8; 18] = [
    2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35,
];

pub fn color_of(pocket: Pocket) -> Color {
    match pocket.numbered() {
        None => Color::Green,
        Some(n) if RED_NUMBERS.contains(&n) => Color::Red,
        Some(_) => Color::Black,
    }
}

pub fn parity_of(pocket: Pocket) -> Option<Parity> {
    pocket
        .numbered()
        .map(|n| if n % 2 == 0 { Parity::Even } else { Parity::Odd })
}

pub fn dozen_of(pocket: Pocket) -> Option<Dozen> {
    pocket.numbered().map(|n| match n {
        1..=12 => Dozen::First,
        13..=24 => Dozen::Second,
        _ => Dozen::Third,
    })
}

/// Column `((n - 1) mod 3) + 1`
pub fn column_of(pocket: Pocket) -> Option<Column> {
    pocket.numbered().map(|n| match (n - 1) % 3 {
        0 => Column::First,
        1 => Column::Second,
        _ => Column::Third,
    })
}

pub fn half_of(pocket: Pocket) -> Option<Half> {
    pocket
        .numbered()
        .map(|n| if n <= 18 { Half::Low } else { Half::High })
}

/// Derive every attribute of a pocket at once
pub fn classify(pocket: Pocket) -> Classification {
    Classification {
        color: color_of(pocket),
        parity: parity_of(pocket),
        dozen: dozen_of(pocket),
        column: column_of(pocket),
        half: half_of(pocket),
    }
}
