//! Card detail validation.
//!
//! The payment schema accepts the card fields as plain optional strings;
//! this module is their actual validator, run before the payment mutation
//! sequence starts.

use chrono::{Datelike, Utc};

use crate::address::FieldValues;
use crate::address::schema::FieldError;

pub const CARD_NUMBER: &str = "cardNumber";
pub const EXPIRY_DATE: &str = "expiryDate";
pub const CVC: &str = "cvc";

/// Validate the card number, expiry date and CVC fields.
#[must_use]
pub fn validate(values: &FieldValues) -> Vec<FieldError> {
    let now = Utc::now();
    validate_at(values, now.year(), now.month())
}

fn validate_at(values: &FieldValues, current_year: i32, current_month: u32) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let field = |name: &str| values.get(name).map(String::as_str).unwrap_or_default();

    let card_number = field(CARD_NUMBER);
    if card_number.trim().is_empty() {
        errors.push(FieldError::new(CARD_NUMBER, "Enter a card number"));
    } else if !valid_card_number(card_number) {
        errors.push(FieldError::new(CARD_NUMBER, "Card number is invalid"));
    }

    let expiry = field(EXPIRY_DATE);
    if expiry.trim().is_empty() {
        errors.push(FieldError::new(EXPIRY_DATE, "Enter an expiry date"));
    } else {
        match parse_expiry(expiry) {
            None => errors.push(FieldError::new(EXPIRY_DATE, "Expiry date is invalid")),
            Some((month, _)) if !(1..=12).contains(&month) => errors.push(FieldError::new(
                EXPIRY_DATE,
                "Expiry month must be between 01 and 12",
            )),
            Some((month, year)) if (year, month) < (current_year, current_month) => {
                errors.push(FieldError::new(
                    EXPIRY_DATE,
                    "Expiry date cannot be in the past",
                ));
            }
            Some(_) => {}
        }
    }

    let cvc = field(CVC);
    if cvc.trim().is_empty() {
        errors.push(FieldError::new(CVC, "Enter a CVC"));
    } else if !(cvc.len() == 3 || cvc.len() == 4) || !cvc.chars().all(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(CVC, "CVC is invalid"));
    }

    errors
}

/// Digits (spaces allowed), 12-19 of them, passing the Luhn check.
fn valid_card_number(value: &str) -> bool {
    let digits: Option<Vec<u32>> = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(10))
        .collect();

    let Some(digits) = digits else {
        return false;
    };
    if !(12..=19).contains(&digits.len()) {
        return false;
    }

    luhn(&digits)
}

fn luhn(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, &digit)| {
            if idx % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

/// Parse "MM/YY" (spaces around the slash tolerated) into month and full
/// year.
fn parse_expiry(value: &str) -> Option<(u32, i32)> {
    let (month, year) = value.split_once('/')?;
    let month: u32 = month.trim().parse().ok()?;
    let year = year.trim();
    if year.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    Some((month, 2000 + year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    fn valid_values() -> FieldValues {
        values(&[
            (CARD_NUMBER, "4111 1111 1111 1111"),
            (EXPIRY_DATE, "12/30"),
            (CVC, "123"),
        ])
    }

    #[test]
    fn test_valid_card_details() {
        assert!(validate_at(&valid_values(), 2026, 8).is_empty());
    }

    #[test]
    fn test_empty_fields() {
        let errors = validate_at(&values(&[]), 2026, 8);
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Enter a card number", "Enter an expiry date", "Enter a CVC"]
        );
    }

    #[test]
    fn test_luhn_rejects_bad_number() {
        let mut form = valid_values();
        form.insert(CARD_NUMBER.to_string(), "4111 1111 1111 1112".to_string());
        let errors = validate_at(&form, 2026, 8);
        assert_eq!(errors[0].message, "Card number is invalid");
    }

    #[test]
    fn test_non_digit_card_number() {
        let mut form = valid_values();
        form.insert(CARD_NUMBER.to_string(), "4111-1111".to_string());
        let errors = validate_at(&form, 2026, 8);
        assert_eq!(errors[0].field, CARD_NUMBER);
    }

    #[test]
    fn test_expiry_in_the_past() {
        let mut form = valid_values();
        form.insert(EXPIRY_DATE.to_string(), "07/26".to_string());
        let errors = validate_at(&form, 2026, 8);
        assert_eq!(errors[0].message, "Expiry date cannot be in the past");

        // Current month is still valid.
        form.insert(EXPIRY_DATE.to_string(), "08/26".to_string());
        assert!(validate_at(&form, 2026, 8).is_empty());
    }

    #[test]
    fn test_expiry_month_out_of_range() {
        let mut form = valid_values();
        form.insert(EXPIRY_DATE.to_string(), "13/30".to_string());
        let errors = validate_at(&form, 2026, 8);
        assert_eq!(errors[0].message, "Expiry month must be between 01 and 12");
    }

    #[test]
    fn test_expiry_malformed() {
        let mut form = valid_values();
        form.insert(EXPIRY_DATE.to_string(), "2030-12".to_string());
        let errors = validate_at(&form, 2026, 8);
        assert_eq!(errors[0].message, "Expiry date is invalid");
    }

    #[test]
    fn test_cvc_length() {
        let mut form = valid_values();
        form.insert(CVC.to_string(), "12".to_string());
        let errors = validate_at(&form, 2026, 8);
        assert_eq!(errors[0].message, "CVC is invalid");

        form.insert(CVC.to_string(), "1234".to_string());
        assert!(validate_at(&form, 2026, 8).is_empty());
    }
}
