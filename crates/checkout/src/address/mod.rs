//! Address handling: field-format translation and per-country validation.
//!
//! The remote commerce API validates addresses against country-specific
//! rules fetched at runtime; this module translates between the form's
//! autofill field names and the API's names, folds the smuggled metadata
//! fields, and builds the validation schema from the resolved rules.

pub mod format;
pub mod schema;

pub use format::{
    FALLBACK_COUNTRY, FieldValues, address_input_from_values, api_field, autocomplete,
    autocomplete_key, display, to_autocomplete_format, to_default_format,
};
pub use schema::{AddressSchema, FieldError, FieldRule, build_schema};
