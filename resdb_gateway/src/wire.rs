//! Serde helpers for request payloads. Older clients send "" for "not set".

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Absent, `null` and all-whitespace strings decode to `None`
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountField {
    Number(u64),
    Text(String),
}

/// Amount as a number or decimal string; blank strings decode to `None`
pub fn amount_or_blank<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<AmountField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(AmountField::Number(n)) => Ok(Some(n)),
        Some(AmountField::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(AmountField::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid amount '{}'", s))),
    }
}
