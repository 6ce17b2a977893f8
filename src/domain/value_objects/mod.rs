//! Value Objects for the storefront

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Product identifier, unique within one catalog snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }

    /// Identifier derived from the product's content rather than its list position,
    /// so reordering a business's product list never remaps cart entries.
    pub fn content_stable(name: &str, category: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.trim().to_lowercase().as_bytes());
        hasher.update([0u8]);
        hasher.update(category.trim().to_lowercase().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(format!("user-{}", &digest[..12]))
    }

    /// Suffixes the nth duplicate (`n >= 2`) of the same content.
    pub fn with_occurrence(&self, n: usize) -> Self {
        if n <= 1 { self.clone() } else { Self(format!("{}-{}", self.0, n)) }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self { Self(value) }
}

/// Parses a currency-formatted price such as `"$4.99"` or `"₦1,200.00"`.
///
/// Never fails: anything unparsable counts as zero.
pub fn parse_price(raw: &str) -> Decimal {
    let numeric: String = raw
        .trim()
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.'))
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    Decimal::from_str(&numeric).unwrap_or(Decimal::ZERO)
}

/// Renders an amount the way catalog prices are written.
pub fn format_price(amount: Decimal) -> String { format!("${:.2}", amount.round_dp(2)) }

/// Storage partition for one template instance, live or demo.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageScope {
    template: String,
    demo: bool,
}

impl StorageScope {
    pub fn live(template: impl Into<String>) -> Self { Self { template: template.into(), demo: false } }
    pub fn demo(template: impl Into<String>) -> Self { Self { template: template.into(), demo: true } }
    pub fn new(template: impl Into<String>, demo: bool) -> Self { Self { template: template.into(), demo } }
    pub fn template(&self) -> &str { &self.template }
    pub fn is_demo(&self) -> bool { self.demo }
    pub fn cart_key(&self) -> String { format!("cart:{self}") }
    pub fn setup_key(&self) -> String { format!("setup:{}", self.template) }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.demo { write!(f, "{}:demo", self.template) } else { write!(f, "{}", self.template) }
    }
}

/// Human-displayable order number, also used as the order's storage key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// `<prefix>-<last 8 digits of the epoch milliseconds>`.
    pub fn generate(prefix: &str, now: DateTime<Utc>) -> Self {
        let millis = now.timestamp_millis().to_string();
        let tail = &millis[millis.len().saturating_sub(8)..];
        Self(format!("{prefix}-{tail}"))
    }
    pub fn parse(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn storage_key(&self) -> String { format!("order:{}", self.0) }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}
