//! Card details as typed into the checkout form.
//!
//! The number and CVC are held as secrets: they never appear in `Debug`
//! output and have no `Serialize` impl, so they cannot reach a persisted
//! record. Only [`CardInfo::last4`] leaves this module.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const MIN_NAME_CHARS: usize = 2;
const MIN_CARD_DIGITS: usize = 13;
const MAX_CARD_DIGITS: usize = 19;
const MAX_EXPIRY_DIGITS: usize = 4;
const MAX_CVC_DIGITS: usize = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub cardholder_name: String,
    #[serde(deserialize_with = "secret")]
    pub card_number: SecretString,
    pub expiry: String,
    #[serde(deserialize_with = "secret")]
    pub cvc: SecretString,
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardField { CardholderName, Number, Expiry, Cvc }

/// Any invalid card field blocks submission with this one message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please enter valid card details (name, card number, expiry MM/YY, and CVC).")]
pub struct CardValidationError {
    pub fields: Vec<CardField>,
}

impl CardInfo {
    pub fn new(cardholder_name: impl Into<String>, card_number: impl Into<String>, expiry: impl Into<String>, cvc: impl Into<String>) -> Self {
        Self {
            cardholder_name: cardholder_name.into(),
            card_number: SecretString::from(card_number.into()),
            expiry: expiry.into(),
            cvc: SecretString::from(cvc.into()),
        }
    }

    pub fn validate(&self) -> Result<(), CardValidationError> {
        let mut fields = Vec::new();
        if self.cardholder_name.trim().chars().count() < MIN_NAME_CHARS { fields.push(CardField::CardholderName); }
        let number = digits_only(self.card_number.expose_secret());
        if !(MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&number.len()) { fields.push(CardField::Number); }
        if !is_valid_expiry(&self.expiry) { fields.push(CardField::Expiry); }
        let cvc = digits_only(self.cvc.expose_secret());
        if !(3..=MAX_CVC_DIGITS).contains(&cvc.len()) { fields.push(CardField::Cvc); }
        if fields.is_empty() { Ok(()) } else { Err(CardValidationError { fields }) }
    }

    /// Last four digits of the sanitized card number.
    pub fn last4(&self) -> String {
        let digits = digits_only(self.card_number.expose_secret());
        digits[digits.len().saturating_sub(4)..].to_string()
    }
}

/// `MM/YY` with a month between 01 and 12.
fn is_valid_expiry(raw: &str) -> bool {
    let Some((month, year)) = raw.trim().split_once('/') else { return false; };
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) { return false; }
    matches!(month.parse::<u8>(), Ok(1..=12))
}

pub fn digits_only(value: &str) -> String { value.chars().filter(char::is_ascii_digit).collect() }

/// Keeps up to 19 digits, grouped in blocks of four.
pub fn format_card_number(value: &str) -> String {
    let digits: Vec<char> = digits_only(value).chars().take(MAX_CARD_DIGITS).collect();
    digits.chunks(4).map(|c| c.iter().collect::<String>()).collect::<Vec<_>>().join(" ")
}

/// Keeps up to four digits and inserts `/` after the month.
pub fn format_expiry(value: &str) -> String {
    let digits: String = digits_only(value).chars().take(MAX_EXPIRY_DIGITS).collect();
    if digits.len() <= 2 { digits } else { format!("{}/{}", &digits[..2], &digits[2..]) }
}

pub fn format_cvc(value: &str) -> String { digits_only(value).chars().take(MAX_CVC_DIGITS).collect() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_card() {
        assert!(CardInfo::new("Al", "4111111111111111", "12/25", "123").validate().is_ok());
        assert!(CardInfo::new("  ", "4111111111111111", "12/25", "123").validate().is_err());
        let err = CardInfo::new(" A ", "4111111111111111", "12/25", "123").validate().unwrap_err();
        assert_eq!(err.fields, vec![CardField::CardholderName]);
        assert!(CardInfo::new("Ada", "4111 1111 1111 1111", "12/25", "1234").validate().is_ok());
    }

    #[test]
    fn test_short_number_rejected() {
        let err = CardInfo::new("Al", "123", "12/25", "123").validate().unwrap_err();
        assert_eq!(err.fields, vec![CardField::Number]);
    }

    #[test]
    fn test_invalid_month_rejected() {
        let err = CardInfo::new("Al", "4111111111111111", "13/25", "123").validate().unwrap_err();
        assert_eq!(err.fields, vec![CardField::Expiry]);
        assert!(CardInfo::new("Ada", "4111111111111111", "00/25", "123").validate().is_err());
        assert!(CardInfo::new("Ada", "4111111111111111", "1225", "123").validate().is_err());
    }

    #[test]
    fn test_single_combined_message() {
        let err = CardInfo::new("", "1", "99/99", "1").validate().unwrap_err();
        assert_eq!(err.fields.len(), 4);
        assert_eq!(err.to_string(), "Please enter valid card details (name, card number, expiry MM/YY, and CVC).");
    }

    #[test]
    fn test_last4() {
        assert_eq!(CardInfo::new("Ada", "4111 1111 1111 1111", "12/25", "123").last4(), "1111");
        assert_eq!(CardInfo::new("Ada", "4242-4242-4242-4299", "12/25", "123").last4(), "4299");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", CardInfo::new("Ada", "4111111111111111", "12/25", "987"));
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("987"));
    }

    #[test]
    fn test_formatters() {
        assert_eq!(format_card_number("4111111111111111"), "4111 1111 1111 1111");
        assert_eq!(format_card_number("4111-11"), "4111 11");
        assert_eq!(format_card_number("12345678901234567890123"), "1234 5678 9012 3456 789");
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12");
        assert_eq!(format_expiry("1225"), "12/25");
        assert_eq!(format_expiry("12/259"), "12/25");
        assert_eq!(format_cvc("12a345"), "1234");
        assert_eq!(format_card_number(""), "");
    }
}
