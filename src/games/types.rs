//! Roulette domain types
//!
//! Pockets and their derived attributes, wagers as received and as
//! validated, and the per-spin settlement record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Player identifier as handed over by the (external) session layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One pocket of the American wheel: 0, "00" or 1-36
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pocket {
    Number(u8),
    DoubleZero,
}

impl Pocket {
    /// Number of pockets on the wheel
    pub const COUNT: usize = 38;

    /// Single-zero pocket
    pub const ZERO: Pocket = Pocket::Number(0);

    /// Checked constructor for 0-36
    pub fn number(n: u8) -> Option<Self> {
        (n <= 36).then_some(Pocket::Number(n))
    }

    /// Map a wheel index in `0..38` to its pocket: 0 is "00", then 0, 1, ..., 36
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Pocket::DoubleZero),
            1..=37 => Some(Pocket::Number((index - 1) as u8)),
            _ => None,
        }
    }

    /// Every pocket on the wheel, "00" first
    pub fn all() -> impl Iterator<Item = Pocket> {
        (0..Self::COUNT).filter_map(Self::from_index)
    }

    /// The green pockets (0 and "00")
    pub fn is_zero(&self) -> bool {
        matches!(self, Pocket::DoubleZero | Pocket::Number(0))
    }

    /// The pocket's number when it is one of 1-36
    pub fn numbered(&self) -> Option<u8> {
        match *self {
            Pocket::Number(n) if (1..=36).contains(&n) => Some(n),
            _ => None,
        }
    }

    /// Interpret a loosely typed JSON selector (`17`, `"17"`, `0`, `"00"`)
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .and_then(Pocket::number),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Pocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pocket::Number(n) => write!(f, "{}", n),
            Pocket::DoubleZero => write!(f, "00"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pocket '{0}' (expected 0-36 or \"00\")")]
pub struct PocketParseError(pub String);

impl FromStr for Pocket {
    type Err = PocketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "00" {
            return Ok(Pocket::DoubleZero);
        }
        trimmed
            .parse::<u8>()
            .ok()
            .and_then(Pocket::number)
            .ok_or_else(|| PocketParseError(s.to_string()))
    }
}

impl Serialize for Pocket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Pocket::Number(n) => serializer.serialize_u8(*n),
            Pocket::DoubleZero => serializer.serialize_str("00"),
        }
    }
}

impl<'de> Deserialize<'de> for Pocket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PocketVisitor;

        impl<'de> de::Visitor<'de> for PocketVisitor {
            type Value = Pocket;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer 0-36 or the string \"00\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Pocket, E> {
                u8::try_from(v)
                    .ok()
                    .and_then(Pocket::number)
                    .ok_or_else(|| E::custom(PocketParseError(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Pocket, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(PocketParseError(v.to_string())))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Pocket, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PocketVisitor)
    }
}

/// Pocket color
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Dozen {
    #[serde(rename = "1st12")]
    First,
    #[serde(rename = "2nd12")]
    Second,
    #[serde(rename = "3rd12")]
    Third,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Column {
    #[serde(rename = "col1")]
    First,
    #[serde(rename = "col2")]
    Second,
    #[serde(rename = "col3")]
    Third,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Half {
    #[serde(rename = "1to18")]
    Low,
    #[serde(rename = "19to36")]
    High,
}

/// Attributes derived from a pocket. `None` for 0 and "00".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Classification {
    pub color: Color,
    pub parity: Option<Parity>,
    pub dozen: Option<Dozen>,
    pub column: Option<Column>,
    pub half: Option<Half>,
}

/// Wager kinds understood by the payout table.
///
/// Anything else lands in `Unknown` and always loses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WagerKind {
    Straight,
    Red,
    Black,
    Even,
    Odd,
    FirstDozen,
    SecondDozen,
    ThirdDozen,
    Column1,
    Column2,
    Column3,
    Low,
    High,
    Unknown(String),
}

impl WagerKind {
    /// The thirteen kinds with a payout entry
    pub const KNOWN: [WagerKind; 13] = [
        WagerKind::Straight,
        WagerKind::Red,
        WagerKind::Black,
        WagerKind::Even,
        WagerKind::Odd,
        WagerKind::FirstDozen,
        WagerKind::SecondDozen,
        WagerKind::ThirdDozen,
        WagerKind::Column1,
        WagerKind::Column2,
        WagerKind::Column3,
        WagerKind::Low,
        WagerKind::High,
    ];

    /// Parse a wire string; trims and ignores ASCII case
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "straight" => WagerKind::Straight,
            "red" => WagerKind::Red,
            "black" => WagerKind::Black,
            "even" => WagerKind::Even,
            "odd" => WagerKind::Odd,
            "1st12" => WagerKind::FirstDozen,
            "2nd12" => WagerKind::SecondDozen,
            "3rd12" => WagerKind::ThirdDozen,
            "col1" => WagerKind::Column1,
            "col2" => WagerKind::Column2,
            "col3" => WagerKind::Column3,
            "1to18" => WagerKind::Low,
            "19to36" => WagerKind::High,
            _ => WagerKind::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WagerKind::Straight => "straight",
            WagerKind::Red => "red",
            WagerKind::Black => "black",
            WagerKind::Even => "even",
            WagerKind::Odd => "odd",
            WagerKind::FirstDozen => "1st12",
            WagerKind::SecondDozen => "2nd12",
            WagerKind::ThirdDozen => "3rd12",
            WagerKind::Column1 => "col1",
            WagerKind::Column2 => "col2",
            WagerKind::Column3 => "col3",
            WagerKind::Low => "1to18",
            WagerKind::High => "19to36",
            WagerKind::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, WagerKind::Unknown(_))
    }
}

impl fmt::Display for WagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WagerKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WagerKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(WagerKind::parse(&raw))
    }
}

/// A validated bet. `selector` is only meaningful for `Straight`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    pub kind: WagerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Pocket>,
    pub stake: Decimal,
}

impl Wager {
    pub fn new(kind: WagerKind, stake: Decimal) -> Self {
        Self {
            kind,
            selector: None,
            stake,
        }
    }

    pub fn straight(pocket: Pocket, stake: Decimal) -> Self {
        Self {
            kind: WagerKind::Straight,
            selector: Some(pocket),
            stake,
        }
    }
}

/// Wager exactly as received on the wire, before validation.
///
/// Accepts both `kind`/`selector` and the older `type`/`value` spellings.
/// Deserialization never fails: an entry that is not a JSON object is kept
/// with `not_an_object` set so it can be reported as malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawWager {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<serde_json::Value>,
    /// The entry as sent, when it was not an object
    #[serde(skip)]
    pub not_an_object: Option<String>,
}

impl RawWager {
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(mut fields) => {
                let mut take = |name: &str, alias: &str| {
                    fields
                        .remove(name)
                        .filter(|v| !v.is_null())
                        .or_else(|| fields.remove(alias).filter(|v| !v.is_null()))
                };
                let kind = take("kind", "type");
                let selector = take("selector", "value");
                let amount = fields.remove("amount").filter(|v| !v.is_null());
                Self {
                    kind,
                    selector,
                    amount,
                    not_an_object: None,
                }
            }
            other => Self {
                not_an_object: Some(other.to_string()),
                ..Default::default()
            },
        }
    }
}

impl<'de> Deserialize<'de> for RawWager {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(RawWager::from_value)
    }
}

impl From<&Wager> for RawWager {
    fn from(wager: &Wager) -> Self {
        Self {
            kind: Some(serde_json::Value::String(wager.kind.as_str().to_string())),
            selector: wager.selector.map(|p| match p {
                Pocket::Number(n) => serde_json::Value::from(n),
                Pocket::DoubleZero => serde_json::Value::from("00"),
            }),
            amount: Some(serde_json::Value::String(wager.stake.to_string())),
            not_an_object: None,
        }
    }
}

/// Result of one wager in a spin, in request order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerOutcome {
    pub index: usize,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Pocket>,
    pub stake: Decimal,
    pub won: bool,
    /// Stake plus winnings when won, zero otherwise
    pub payout: Decimal,
    #[serde(default)]
    pub malformed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Everything the caller learns about a settled spin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResult {
    pub spin_id: Uuid,
    pub player_id: PlayerId,
    pub result: Pocket,
    #[serde(flatten)]
    pub classification: Classification,
    pub wagers: Vec<WagerOutcome>,
    pub total_stake: Decimal,
    pub total_win: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub settled_at: DateTime<Utc>,
}

impl SettlementResult {
    /// Net change applied to the balance by this spin
    pub fn net_result(&self) -> Decimal {
        self.total_win - self.total_stake
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pocket_index_mapping() {
        assert_eq!(Pocket::from_index(0), Some(Pocket::DoubleZero));
        assert_eq!(Pocket::from_index(1), Some(Pocket::ZERO));
        assert_eq!(Pocket::from_index(37), Some(Pocket::Number(36)));
        assert_eq!(Pocket::from_index(38), None);
        assert_eq!(Pocket::all().count(), Pocket::COUNT);
    }

    #[test]
    fn test_pocket_parsing_normalizes() {
        assert_eq!("00".parse::<Pocket>(), Ok(Pocket::DoubleZero));
        assert_eq!("0".parse::<Pocket>(), Ok(Pocket::ZERO));
        assert_eq!(" 17 ".parse::<Pocket>(), Ok(Pocket::Number(17)));
        assert!("37".parse::<Pocket>().is_err());
        assert!("000".parse::<Pocket>().is_err());
        assert!("red".parse::<Pocket>().is_err());
    }

    #[test]
    fn test_pocket_wire_format() {
        assert_eq!(serde_json::to_string(&Pocket::Number(17)).unwrap(), "17");
        assert_eq!(serde_json::to_string(&Pocket::DoubleZero).unwrap(), "\"00\"");

        let zero: Pocket = serde_json::from_str("0").unwrap();
        let double_zero: Pocket = serde_json::from_str("\"00\"").unwrap();
        assert_ne!(zero, double_zero);
        assert!(serde_json::from_str::<Pocket>("40").is_err());
        assert!(serde_json::from_str::<Pocket>("-1").is_err());
    }

    #[test]
    fn test_pocket_from_json_selector() {
        assert_eq!(Pocket::from_json(&serde_json::json!(17)), Some(Pocket::Number(17)));
        assert_eq!(Pocket::from_json(&serde_json::json!("17")), Some(Pocket::Number(17)));
        assert_eq!(Pocket::from_json(&serde_json::json!("00")), Some(Pocket::DoubleZero));
        assert_eq!(Pocket::from_json(&serde_json::json!(17.5)), None);
        assert_eq!(Pocket::from_json(&serde_json::json!(null)), None);
    }

    #[test]
    fn test_wager_kind_round_trip_strings() {
        for kind in WagerKind::KNOWN.iter() {
            assert_eq!(&WagerKind::parse(kind.as_str()), kind);
        }
        assert_eq!(WagerKind::parse(" RED "), WagerKind::Red);
        assert_eq!(
            WagerKind::parse("split"),
            WagerKind::Unknown("split".to_string())
        );
    }

    #[test]
    fn test_raw_wager_accepts_legacy_keys() {
        let raw: RawWager =
            serde_json::from_str(r#"{"type": "straight", "value": "00", "amount": 5}"#).unwrap();
        assert_eq!(raw.kind, Some(serde_json::json!("straight")));
        assert_eq!(raw.selector, Some(serde_json::json!("00")));
        assert_eq!(raw.amount, Some(serde_json::json!(5)));
    }

    #[test]
    fn test_raw_wager_accepts_any_json() {
        let entries: Vec<RawWager> =
            serde_json::from_str(r#"[null, "red", 7, {"kind": null, "type": "odd", "amount": 1}]"#).unwrap();

        assert_eq!(entries[0].not_an_object.as_deref(), Some("null"));
        assert_eq!(entries[1].not_an_object.as_deref(), Some("\"red\""));
        assert_eq!(entries[2].not_an_object.as_deref(), Some("7"));
        assert_eq!(entries[3].kind, Some(serde_json::json!("odd")));
        assert_eq!(entries[3].not_an_object, None);
    }

    #[test]
    fn test_classification_wire_names() {
        let classification = Classification {
            color: Color::Red,
            parity: Some(Parity::Odd),
            dozen: Some(Dozen::First),
            column: Some(Column::First),
            half: Some(Half::Low),
        };
        let json = serde_json::to_value(classification).unwrap();
        assert_eq!(json["color"], "red");
        assert_eq!(json["parity"], "odd");
        assert_eq!(json["dozen"], "1st12");
        assert_eq!(json["column"], "col1");
        assert_eq!(json["half"], "1to18");
    }
}
