//! Dynamic address validation schema.
//!
//! The schema is rebuilt from the resolved [`ValidationRules`] on every
//! render and every submit, so construction must be a pure function of the
//! rules: identical input produces an identical schema. Rules are folded
//! onto the base schema as an ordered list of `(field, rule)` pairs; setting
//! a field that already has a rule replaces it in place, which is what lets
//! the rule source escalate or widen base fields deterministically.

use regex::Regex;

use super::format::{FieldValues, autocomplete, autocomplete_key};
use crate::commerce::types::ValidationRules;

/// A validation failure attached to a single form field.
///
/// `field` is in autofill-key space, ready to attach to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Non-address fields carried by the payment form; the schema accepts them
/// as optional strings and their own validator checks them.
pub const PAYMENT_FIELDS: [&str; 4] = ["cardNumber", "expiryDate", "cvc", "paymentCountry"];

const INCORRECT_NUMBER: &str = "Incorrect number";

/// A compiled postal-code pattern.
///
/// Equality is defined on the pattern text and message so that schemas can
/// be compared for the determinism guarantee.
#[derive(Debug, Clone)]
pub struct PostalPattern {
    pattern: String,
    regex: Regex,
    message: String,
}

impl PostalPattern {
    fn compile(pattern: &str, message: String) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(regex) => Some(Self {
                pattern: pattern.to_string(),
                regex,
                message,
            }),
            Err(error) => {
                // The rule source guarantees valid patterns; a violation is
                // logged and the pattern rule skipped rather than failing
                // the whole section.
                tracing::warn!(%pattern, %error, "skipping uncompilable postal code pattern");
                None
            }
        }
    }

    /// The original pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The validation message shown on mismatch.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for PostalPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.message == other.message
    }
}

impl Eq for PostalPattern {}

/// Tagged per-field validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Non-empty string.
    RequiredString { message: String },
    /// Any string, including empty.
    OptionalString,
    /// Non-empty string parsing to a non-negative integer.
    RequiredNonNegativeInt {
        required_message: String,
        invalid_message: String,
    },
    /// Empty, or a string parsing to a non-negative integer.
    OptionalNonNegativeInt { invalid_message: String },
    /// String matching a postal-code pattern.
    PatternString(PostalPattern),
}

/// An ordered field-validation schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSchema {
    rules: Vec<(String, FieldRule)>,
}

impl AddressSchema {
    /// Set the rule for a field, replacing any existing rule in place.
    fn set(&mut self, field: &str, rule: FieldRule) {
        if let Some(entry) = self.rules.iter_mut().find(|(key, _)| key == field) {
            entry.1 = rule;
        } else {
            self.rules.push((field.to_string(), rule));
        }
    }

    /// The rule for a field, if the schema knows it.
    #[must_use]
    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.rules
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, rule)| rule)
    }

    /// Whether a field must be non-empty.
    #[must_use]
    pub fn is_required(&self, field: &str) -> bool {
        matches!(
            self.rule(field),
            Some(FieldRule::RequiredString { .. } | FieldRule::RequiredNonNegativeInt { .. })
        )
    }

    /// Validate form values against the schema in field order.
    ///
    /// Fields absent from `values` are validated as empty strings; keys in
    /// `values` the schema does not know are ignored.
    #[must_use]
    pub fn validate(&self, values: &FieldValues) -> Vec<FieldError> {
        let mut errors = Vec::new();

        for (field, rule) in &self.rules {
            let value = values.get(field).map(String::as_str).unwrap_or_default();
            let failure = match rule {
                FieldRule::RequiredString { message } => {
                    value.is_empty().then(|| message.clone())
                }
                FieldRule::OptionalString => None,
                FieldRule::RequiredNonNegativeInt {
                    required_message,
                    invalid_message,
                } => {
                    if value.is_empty() {
                        Some(required_message.clone())
                    } else {
                        invalid_number(value).then(|| invalid_message.clone())
                    }
                }
                FieldRule::OptionalNonNegativeInt { invalid_message } => {
                    if value.is_empty() {
                        None
                    } else {
                        invalid_number(value).then(|| invalid_message.clone())
                    }
                }
                FieldRule::PatternString(pattern) => {
                    (!pattern.regex.is_match(value)).then(|| pattern.message.clone())
                }
            };

            if let Some(message) = failure {
                errors.push(FieldError::new(field.clone(), message));
            }
        }

        errors
    }
}

fn invalid_number(value: &str) -> bool {
    !value.parse::<i64>().is_ok_and(|number| number >= 0)
}

/// Human labels for the fields that have one; other fields fall back to
/// their remote API name in messages.
fn field_display_name(api_field: &str) -> &str {
    match api_field {
        "city" => "City",
        "streetAddress1" => "Street Address",
        "countryArea" => "Country Area",
        other => other,
    }
}

/// Build the validation schema for the given rules.
///
/// With no rules, only `country` is mandatory. With rules, first and last
/// name become mandatory, every required field gets a required-string rule,
/// a required street address escalates the street number to a required
/// non-negative integer, remaining allowed fields widen to optional, and
/// the first postal-code matcher (if any) is applied with a message listing
/// every example value.
#[must_use]
pub fn build_schema(rules: Option<&ValidationRules>) -> AddressSchema {
    let mut schema = AddressSchema::default();

    for field in PAYMENT_FIELDS {
        schema.set(field, FieldRule::OptionalString);
    }
    schema.set(autocomplete::GIVEN_NAME, FieldRule::OptionalString);
    schema.set(autocomplete::FAMILY_NAME, FieldRule::OptionalString);
    schema.set(autocomplete::ORGANIZATION, FieldRule::OptionalString);
    schema.set(autocomplete::POSTAL_CODE, FieldRule::OptionalString);
    schema.set(autocomplete::STREET_ADDRESS, FieldRule::OptionalString);
    schema.set(
        autocomplete::STREET_NUMBER,
        FieldRule::OptionalNonNegativeInt {
            invalid_message: INCORRECT_NUMBER.to_string(),
        },
    );
    schema.set(autocomplete::CITY, FieldRule::OptionalString);
    schema.set(
        autocomplete::COUNTRY,
        FieldRule::RequiredString {
            message: "Country is required".to_string(),
        },
    );
    schema.set(autocomplete::COUNTRY_AREA, FieldRule::OptionalString);

    let Some(rules) = rules else {
        return schema;
    };

    // First and last name are a business rule layered on top of whatever the
    // remote marks required.
    schema.set(
        autocomplete::GIVEN_NAME,
        FieldRule::RequiredString {
            message: "First name is required".to_string(),
        },
    );
    schema.set(
        autocomplete::FAMILY_NAME,
        FieldRule::RequiredString {
            message: "Last name is required".to_string(),
        },
    );

    for field in &rules.required_fields {
        let Some(key) = autocomplete_key(field) else {
            continue;
        };
        schema.set(
            key,
            FieldRule::RequiredString {
                message: format!("{} is required", field_display_name(field)),
            },
        );

        if field == "streetAddress1" {
            schema.set(
                autocomplete::STREET_NUMBER,
                FieldRule::RequiredNonNegativeInt {
                    required_message: "Number is required".to_string(),
                    invalid_message: INCORRECT_NUMBER.to_string(),
                },
            );
        }
    }

    for field in &rules.allowed_fields {
        if rules.required_fields.contains(field) {
            continue;
        }
        let Some(key) = autocomplete_key(field) else {
            continue;
        };
        schema.set(key, FieldRule::OptionalString);
    }

    if let Some(pattern) = rules.postal_code_matchers.first() {
        let mut message = String::from("Invalid postal code. The following are examples: ");
        let count = rules.postal_code_examples.len();
        for (idx, example) in rules.postal_code_examples.iter().enumerate() {
            message.push_str(example);
            message.push_str(if idx + 1 == count { "." } else { ", " });
        }

        if let Some(compiled) = PostalPattern::compile(pattern, message) {
            schema.set(autocomplete::POSTAL_CODE, FieldRule::PatternString(compiled));
        }
    }

    schema
}
