use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d]").expect("valid digits regex"));

/// Whole-pound amount as edited in a money field, displayed with a leading
/// `£`. Empty (`£`) and an explicit zero (`£0`) are distinct: a flat fee of
/// zero is legal, an untouched fee is not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyAmount {
    value: Option<u64>,
}

impl CurrencyAmount {
    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn from_value(value: u64) -> Self {
        Self { value: Some(value) }
    }

    /// Sanitizes raw field input: everything but digits is stripped, and no
    /// digits at all leaves the amount empty.
    pub fn from_input(raw: &str) -> Self {
        let digits = NON_DIGITS_RE.replace_all(raw, "");
        Self {
            value: digits.parse::<u64>().ok(),
        }
    }

    pub fn value(&self) -> Option<u64> {
        self.value
    }

    pub fn value_or_zero(&self) -> u64 {
        self.value.unwrap_or(0)
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "£{value}"),
            None => write!(f, "£"),
        }
    }
}

impl From<String> for CurrencyAmount {
    fn from(raw: String) -> Self {
        Self::from_input(&raw)
    }
}

impl From<CurrencyAmount> for String {
    fn from(amount: CurrencyAmount) -> Self {
        amount.to_string()
    }
}

/// Sanitizes count-style input (capacity, slot count): strips non-digits,
/// empty means "not entered".
pub fn parse_count(raw: &str) -> Option<u32> {
    let digits = NON_DIGITS_RE.replace_all(raw, "");
    digits.parse::<u32>().ok()
}
