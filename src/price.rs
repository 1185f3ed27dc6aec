// Price parsing and Free/Paid classification

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const CURRENCY_GLYPH: char = '₹';

/// A display price. Numeric prices start with [`CURRENCY_GLYPH`]; text labels
/// such as `Rs. 500` or `on request` are kept as given.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    pub fn from_amount(amount: f64) -> Self {
        if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
            Self(format!("{CURRENCY_GLYPH}{}", amount as i64))
        } else {
            Self(format!("{CURRENCY_GLYPH}{amount:.2}"))
        }
    }

    /// Normalizes free-form price text. Returns `None` for blank input or a
    /// bare glyph.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.eq_ignore_ascii_case("free") {
            return Some(Self::from_amount(0.0));
        }
        let body = text.trim_start_matches(CURRENCY_GLYPH).trim();
        if body.is_empty() {
            return None;
        }
        let numeric = body.starts_with(|c: char| c.is_ascii_digit() || c == '.');
        if numeric && !text.starts_with(CURRENCY_GLYPH) {
            Some(Self(format!("{CURRENCY_GLYPH}{text}")))
        } else {
            Some(Self(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn amount(&self) -> Option<f64> {
        parse_amount(&self.0)
    }

    pub fn is_free(&self) -> bool {
        self.amount().is_some_and(|a| a == 0.0)
    }

    pub fn tier(&self) -> PriceTier {
        if self.is_free() {
            PriceTier::Free
        } else {
            PriceTier::Paid
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips the glyph, thousands separators and a trailing `/-`, then parses.
pub fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("free") {
        return Some(0.0);
    }
    let text = text.trim_start_matches(CURRENCY_GLYPH);
    let text = text.trim_end_matches("/-");
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
        .collect();
    digits.parse::<f64>().ok().filter(|a| a.is_finite())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceTier {
    Free,
    Paid,
}

#[derive(Error, Debug)]
#[error("unknown price tier `{0}`")]
pub struct UnknownTier(String);

impl FromStr for PriceTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            t if t.eq_ignore_ascii_case("free") => Ok(PriceTier::Free),
            t if t.eq_ignore_ascii_case("paid") => Ok(PriceTier::Paid),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}
