use std::fmt;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Monetary amount as the backend delivers it: sometimes a raw number,
/// sometimes an Indonesian-formatted currency string such as `"Rp 1.500"`.
/// Both representations normalize to the same decimal value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(pub Decimal);

impl Money {
    pub fn parse(raw: &str) -> Option<Self> {
        parse_rupiah(raw).map(Money)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses an IDR-formatted amount: optional `Rp` prefix, `.` as the
/// thousands separator, `,` as the decimal separator.
pub fn parse_rupiah(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let without_symbol = trimmed
        .strip_prefix("Rp")
        .or_else(|| trimmed.strip_prefix("rp"))
        .or_else(|| trimmed.strip_prefix("RP"))
        .unwrap_or(trimmed);

    let mut normalized = String::with_capacity(without_symbol.len());
    for ch in without_symbol.chars() {
        match ch {
            '.' | ' ' | '\u{a0}' => {}
            ',' => normalized.push('.'),
            _ => normalized.push(ch),
        }
    }

    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<Decimal>().ok()
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // UFCS: `Decimal` has an inherent `serialize` that would shadow the
        // trait method.
        serde::Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number or a currency-formatted string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Money, E> {
        Ok(Money(Decimal::from(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Money, E> {
        Ok(Money(Decimal::from(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Money, E> {
        Decimal::try_from(value)
            .map(Money)
            .map_err(|_| E::custom(format!("unrepresentable amount `{value}`")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Money, E> {
        parse_rupiah(value)
            .map(Money)
            .ok_or_else(|| E::custom(format!("unparseable amount `{value}`")))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{parse_rupiah, Money};

    #[test]
    fn parses_formatted_rupiah_string() {
        assert_eq!(parse_rupiah("Rp 1.500"), Some(Decimal::from(1500)));
        assert_eq!(parse_rupiah("Rp 2.750.000"), Some(Decimal::from(2_750_000)));
    }

    #[test]
    fn parses_decimal_separator_as_comma() {
        assert_eq!(parse_rupiah("Rp 1.500,50"), Some(Decimal::new(150_050, 2)));
    }

    #[test]
    fn parses_bare_numeric_string() {
        assert_eq!(parse_rupiah("1500"), Some(Decimal::from(1500)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_rupiah("gratis"), None);
        assert_eq!(parse_rupiah(""), None);
        assert_eq!(parse_rupiah("Rp "), None);
    }

    #[test]
    fn serializes_through_the_wire_representation_and_back() {
        let money = Money::from(1500);
        let value = serde_json::to_value(money).expect("serializable amount");
        let back: Money = serde_json::from_value(value).expect("round trip");
        assert_eq!(back, money);
    }

    #[test]
    fn deserializes_from_number_and_string_identically() {
        let from_number: Money = serde_json::from_str("1500").expect("number form");
        let from_string: Money = serde_json::from_str("\"Rp 1.500\"").expect("string form");
        assert_eq!(from_number, from_string);
    }
}
