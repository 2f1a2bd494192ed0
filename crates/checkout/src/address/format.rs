//! Address field-format translation.
//!
//! Forms identify address fields by the browser autofill convention
//! (`given-name`, `street-address`, ...) while the remote API uses its own
//! names (`firstName`, `streetAddress1`, ...). This module owns the mapping
//! between the two, the `US` country fallback, and the metadata folding for
//! the two fields the remote schema has no native column for.

use std::collections::BTreeMap;

use bramble_core::MetadataItem;
use bramble_core::types::metadata::keys;

use crate::commerce::types::{Address, AddressInput, CountryDisplay};

/// Country code used whenever an address has none.
pub const FALLBACK_COUNTRY: &str = "US";

/// Autofill key constants, for use wherever a field is referenced by name.
pub mod autocomplete {
    pub const GIVEN_NAME: &str = "given-name";
    pub const FAMILY_NAME: &str = "family-name";
    pub const ORGANIZATION: &str = "organization";
    pub const POSTAL_CODE: &str = "postal-code";
    pub const STREET_ADDRESS: &str = "street-address";
    pub const STREET_NUMBER: &str = "address-line1";
    pub const CITY: &str = "address-level2";
    pub const COUNTRY: &str = "country";
    pub const COUNTRY_AREA: &str = "address-level1";
}

/// The fixed, total mapping of `(api field, autofill key)` pairs.
///
/// Pair order is the canonical field order used for schema construction and
/// form rendering.
pub const FIELD_MAP: [(&str, &str); 9] = [
    ("firstName", autocomplete::GIVEN_NAME),
    ("lastName", autocomplete::FAMILY_NAME),
    ("companyName", autocomplete::ORGANIZATION),
    ("postalCode", autocomplete::POSTAL_CODE),
    ("streetAddress1", autocomplete::STREET_ADDRESS),
    ("streetNumber", autocomplete::STREET_NUMBER),
    ("city", autocomplete::CITY),
    ("country", autocomplete::COUNTRY),
    ("countryArea", autocomplete::COUNTRY_AREA),
];

/// Autofill key for a remote API field name.
#[must_use]
pub fn autocomplete_key(api_field: &str) -> Option<&'static str> {
    FIELD_MAP
        .iter()
        .find(|(api, _)| *api == api_field)
        .map(|(_, key)| *key)
}

/// Remote API field name for an autofill key.
#[must_use]
pub fn api_field(key: &str) -> Option<&'static str> {
    FIELD_MAP
        .iter()
        .find(|(_, candidate)| *candidate == key)
        .map(|(api, _)| *api)
}

/// Form values keyed by field name.
pub type FieldValues = BTreeMap<String, String>;

/// Map an address (or its absence) into autofill-keyed form values.
///
/// All nine keys are always present; fields the address does not carry map
/// to the empty string, except `country` which falls back to
/// [`FALLBACK_COUNTRY`]. The street number is read from metadata and the
/// country area falls back to its metadata entry when the native field is
/// empty.
#[must_use]
pub fn to_autocomplete_format(address: Option<&Address>) -> FieldValues {
    let text = |value: Option<&str>| value.unwrap_or_default().to_string();

    let country = address
        .and_then(|a| a.country.as_ref())
        .map(|c| c.code.as_str())
        .filter(|code| !code.is_empty())
        .unwrap_or(FALLBACK_COUNTRY)
        .to_string();

    let country_area = address.map_or_else(String::new, |a| {
        if a.country_area.is_empty() {
            text(a.metadata.get(keys::COUNTRY_AREA))
        } else {
            a.country_area.clone()
        }
    });

    let mut values = FieldValues::new();
    values.insert(
        autocomplete::GIVEN_NAME.to_string(),
        text(address.map(|a| a.first_name.as_str())),
    );
    values.insert(
        autocomplete::FAMILY_NAME.to_string(),
        text(address.map(|a| a.last_name.as_str())),
    );
    values.insert(
        autocomplete::ORGANIZATION.to_string(),
        text(address.map(|a| a.company_name.as_str())),
    );
    values.insert(
        autocomplete::POSTAL_CODE.to_string(),
        text(address.map(|a| a.postal_code.as_str())),
    );
    values.insert(
        autocomplete::STREET_ADDRESS.to_string(),
        text(address.map(|a| a.street_address1.as_str())),
    );
    values.insert(
        autocomplete::STREET_NUMBER.to_string(),
        text(address.and_then(|a| a.metadata.get(keys::STREET_NUMBER))),
    );
    values.insert(
        autocomplete::CITY.to_string(),
        text(address.map(|a| a.city.as_str())),
    );
    values.insert(autocomplete::COUNTRY.to_string(), country);
    values.insert(autocomplete::COUNTRY_AREA.to_string(), country_area);
    values
}

/// Map autofill-keyed values back to remote API field names.
///
/// Keys outside the nine-key mapping pass through unchanged, so non-address
/// form fields (card number, expiry, cvc, ...) survive the translation.
#[must_use]
pub fn to_default_format(values: &FieldValues) -> FieldValues {
    values
        .iter()
        .map(|(key, value)| {
            let field = api_field(key).unwrap_or(key.as_str());
            (field.to_string(), value.clone())
        })
        .collect()
}

/// Build the address-update input from autofill-keyed form values.
///
/// The street number and country area are folded into the metadata list
/// under their fixed keys; the country area is also written to its native
/// field so the two stay consistent.
#[must_use]
pub fn address_input_from_values(values: &FieldValues) -> AddressInput {
    let api = to_default_format(values);
    let field = |name: &str| api.get(name).cloned().unwrap_or_default();

    let country_area = field("countryArea");
    AddressInput {
        first_name: field("firstName"),
        last_name: field("lastName"),
        company_name: field("companyName"),
        street_address1: field("streetAddress1"),
        city: field("city"),
        postal_code: field("postalCode"),
        country: field("country"),
        country_area: country_area.clone(),
        metadata: vec![
            MetadataItem::new(keys::STREET_NUMBER, field("streetNumber")),
            MetadataItem::new(keys::COUNTRY_AREA, country_area),
        ],
    }
}

/// Render an address as a human-readable multi-line string.
///
/// Line 1: names and company. Line 2: city, street, street number and
/// country area. Line 3: the country display name resolved against
/// `countries`; silently omitted when the code has no match.
#[must_use]
pub fn display(address: &Address, countries: &[CountryDisplay]) -> String {
    let street_number = address.metadata.get(keys::STREET_NUMBER).unwrap_or_default();
    let country_area = if address.country_area.is_empty() {
        address.metadata.get(keys::COUNTRY_AREA).unwrap_or_default()
    } else {
        address.country_area.as_str()
    };
    let country_code = address
        .country
        .as_ref()
        .map(|c| c.code.as_str())
        .filter(|code| !code.is_empty())
        .unwrap_or(FALLBACK_COUNTRY);

    let mut lines = Vec::new();

    let name_line = join_words(&[
        &address.first_name,
        &address.last_name,
        &address.company_name,
    ]);
    if !name_line.is_empty() {
        lines.push(name_line);
    }

    let street_part = join_words(&[&address.street_address1, street_number, country_area]);
    let street_line = if address.city.is_empty() {
        street_part
    } else if street_part.is_empty() {
        address.city.clone()
    } else {
        format!("{}, {street_part}", address.city)
    };
    if !street_line.is_empty() {
        lines.push(street_line);
    }

    if let Some(country) = countries.iter().find(|c| c.code == country_code) {
        lines.push(country.country.clone());
    }

    lines.join("\n")
}

fn join_words(words: &[&str]) -> String {
    words
        .iter()
        .filter(|word| !word.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
