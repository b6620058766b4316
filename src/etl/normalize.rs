use std::collections::HashMap;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::data::record::RESERVED_KEYS;
use crate::errors::Result;

const ADDRESS_PREFIX: &str = "addr:";

/// Abbreviations found at the end of street and city name tokens, with their expansion.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Ave", "Avenue"), ("Ave.", "Avenue"), ("ave", "Avenue"),
    ("Blvd", "Boulevard"), ("Blvd.", "Boulevard"),
    ("Com", "Common"), ("Com.", "Common"),
    ("Concrs", "Concourse"), ("Concrs.", "Concourse"),
    ("Cir", "Circle"), ("Cir.", "Circle"),
    ("Cres", "Crescent"), ("Cres.", "Crescent"),
    ("Ct", "Court"), ("Ct.", "Court"),
    ("Ctr", "Center"), ("Ctr.", "Center"),
    ("Dr", "Drive"), ("Dr.", "Drive"),
    ("E", "East"),
    ("Hts", "Heights"), ("Hts.", "Heights"),
    ("I", "Interstate"),
    ("Ln", "Lane"), ("Ln.", "Lane"),
    ("Pl", "Place"), ("Pl.", "Place"),
    ("Plz", "Plaza"), ("Plz.", "Plaza"),
    ("N", "North"),
    ("NW", "North West"),
    ("Pkwy", "Parkway"), ("Pkwy.", "Parkway"),
    ("Rd", "Road"), ("Rd.", "Road"),
    ("Rdg", "Ridge"), ("Rdg.", "Ridge"),
    ("S", "South"),
    ("SE", "South East"),
    ("Sq", "Square"), ("Sq.", "Square"),
    ("St", "Street"), ("St.", "Street"), ("st", "Street"),
    ("Trl", "Trail"), ("Trl.", "Trail"),
    ("W", "West"),
];

/// How an abbreviation is written back into a name once it has been recognised.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// Replace every occurrence of the abbreviation text anywhere in the name, so
    /// "S Main St" becomes "South Main Southt".
    #[default]
    Literal,
    /// Replace only whitespace-separated tokens equal to the abbreviation.
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ProblemKey,
    NonAsciiValue,
    NestedAddressKey,
    NestedNamespaceKey,
    InvalidPostcode,
    EmptyAddressValue,
    ReservedKey,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::ProblemKey => "problem_key",
            Rejection::NonAsciiValue => "non_ascii_value",
            Rejection::NestedAddressKey => "nested_address_key",
            Rejection::NestedNamespaceKey => "nested_namespace_key",
            Rejection::InvalidPostcode => "invalid_postcode",
            Rejection::EmptyAddressValue => "empty_address_value",
            Rejection::ReservedKey => "reserved_key",
        }
    }
}

/// Where a `<tag k v/>` pair ends up in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEntry<'a> {
    Address { subkey: &'a str, value: String },
    Namespaced { prefix: &'a str, subkey: &'a str, value: &'a str },
    TopLevel { key: &'a str, value: &'a str },
    Rejected(Rejection),
}

/// Cleaning rules for tag keys and values. Build it once and share it by reference.
#[derive(Debug)]
pub struct Normalizer {
    problem_chars: Regex,
    street_type: Regex,
    postcode: Regex,
    zip_plus_four: Regex,
    token: Regex,
    abbreviations: HashMap<&'static str, &'static str>,
    mode: SubstitutionMode,
}

impl Normalizer {
    pub fn new(mode: SubstitutionMode) -> Result<Normalizer> {
        Ok(Normalizer {
            problem_chars: Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#)?,
            street_type: Regex::new(r"\b\S+\.?$")?,
            postcode: Regex::new(r"^[0-9]{5}$")?,
            zip_plus_four: Regex::new(r"^([0-9]{5})-[0-9]{4}$")?,
            token: Regex::new(r"\S+")?,
            abbreviations: ABBREVIATIONS.iter().copied().collect(),
            mode,
        })
    }

    pub fn is_problem_key(&self, key: &str) -> bool {
        self.problem_chars.is_match(key)
    }

    /// The trailing street-type part of a single whitespace-free token, e.g. "Ave." for "Ave.".
    pub fn street_type<'a>(&self, token: &'a str) -> Option<&'a str> {
        self.street_type.find(token).map(|m| m.as_str())
    }

    pub fn expansion(&self, abbreviation: &str) -> Option<&'static str> {
        self.abbreviations.get(abbreviation).copied()
    }

    /// Expands abbreviated street types and directions in a street or city name.
    pub fn update_name(&self, name: &str) -> String {
        let mut updated = name.to_string();
        for token in name.split_whitespace() {
            let Some(street_type) = self.street_type(token) else {
                continue;
            };
            let Some(full) = self.expansion(street_type) else {
                continue;
            };
            updated = match self.mode {
                SubstitutionMode::Literal => updated.replace(street_type, full),
                SubstitutionMode::Token => self.token
                    .replace_all(&updated, |caps: &Captures| {
                        if &caps[0] == street_type { full.to_string() } else { caps[0].to_string() }
                    })
                    .into_owned(),
            };
        }
        updated
    }

    /// Five digit postcodes pass as they are, ZIP+4 is cut to its first five digits,
    /// anything else is `None`.
    pub fn update_postcode<'a>(&self, postcode: &'a str) -> Option<&'a str> {
        if self.postcode.is_match(postcode) {
            return Some(postcode);
        }
        self.zip_plus_four
            .captures(postcode)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
    }

    pub fn classify_and_clean<'a>(&self, key: &'a str, value: &'a str) -> TagEntry<'a> {
        if self.is_problem_key(key) {
            return TagEntry::Rejected(Rejection::ProblemKey);
        }
        if !value.is_ascii() {
            return TagEntry::Rejected(Rejection::NonAsciiValue);
        }

        if key.starts_with(ADDRESS_PREFIX) {
            return self.clean_address(key, value);
        }

        match key.split_once(':') {
            None if RESERVED_KEYS.contains(&key) => TagEntry::Rejected(Rejection::ReservedKey),
            None => TagEntry::TopLevel { key, value },
            Some((_, subkey)) if subkey.contains(':') => {
                TagEntry::Rejected(Rejection::NestedNamespaceKey)
            },
            Some((prefix, _)) if RESERVED_KEYS.contains(&prefix) => {
                TagEntry::Rejected(Rejection::ReservedKey)
            },
            Some((prefix, subkey)) => TagEntry::Namespaced { prefix, subkey, value },
        }
    }

    fn clean_address<'a>(&self, key: &'a str, value: &'a str) -> TagEntry<'a> {
        let subkey = &key[ADDRESS_PREFIX.len()..];
        if subkey.contains(':') {
            return TagEntry::Rejected(Rejection::NestedAddressKey);
        }

        let cleaned = match subkey {
            "street" | "city" => self.update_name(value),
            "postcode" => match self.update_postcode(value) {
                Some(postcode) => postcode.to_string(),
                None => return TagEntry::Rejected(Rejection::InvalidPostcode),
            },
            _ => value.to_string(),
        };

        if cleaned.is_empty() {
            TagEntry::Rejected(Rejection::EmptyAddressValue)
        } else {
            TagEntry::Address { subkey, value: cleaned }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(SubstitutionMode::Literal).unwrap()
    }

    #[test]
    fn expands_trailing_abbreviations() {
        let normalizer = normalizer();

        assert_eq!(normalizer.update_name("5th Ave."), "5th Avenue");
        assert_eq!(normalizer.update_name("Main St"), "Main Street");
        assert_eq!(normalizer.update_name("Ocean Pkwy"), "Ocean Parkway");
    }

    #[test]
    fn expands_direction_and_suffix_in_one_name() {
        assert_eq!(normalizer().update_name("N Lincoln Ave"), "North Lincoln Avenue");
        assert_eq!(normalizer().update_name("SE Park Rd."), "South East Park Road");
    }

    #[test]
    fn expanded_names_are_left_alone() {
        let normalizer = normalizer();
        let once = normalizer.update_name("North Lincoln Avenue");

        assert_eq!(once, "North Lincoln Avenue");
        assert_eq!(normalizer.update_name(&once), once);
    }

    #[test]
    fn unknown_suffix_passes_through() {
        assert_eq!(normalizer().update_name("Broadway"), "Broadway");
        assert_eq!(normalizer().update_name(""), "");
    }

    #[test]
    fn literal_mode_replaces_abbreviation_inside_other_words() {
        assert_eq!(normalizer().update_name("S Main St"), "South Main Southt");
    }

    #[test]
    fn token_mode_keeps_spacing_between_tokens() {
        let normalizer = Normalizer::new(SubstitutionMode::Token).unwrap();

        assert_eq!(normalizer.update_name("S  Main   St"), "South  Main   Street");
        assert_eq!(normalizer.update_name(" Broadway\tPlz "), " Broadway\tPlaza ");
    }

    #[test]
    fn token_mode_only_replaces_whole_tokens() {
        let normalizer = Normalizer::new(SubstitutionMode::Token).unwrap();

        assert_eq!(normalizer.update_name("S Main St"), "South Main Street");
        assert_eq!(normalizer.update_name("5th Ave."), "5th Avenue");
    }

    #[test]
    fn postcode_rules() {
        let normalizer = normalizer();

        assert_eq!(normalizer.update_postcode("10001"), Some("10001"));
        assert_eq!(normalizer.update_postcode("10001-1234"), Some("10001"));
        assert_eq!(normalizer.update_postcode("ABCDE"), None);
        assert_eq!(normalizer.update_postcode("1000"), None);
        assert_eq!(normalizer.update_postcode("100011"), None);
        assert_eq!(normalizer.update_postcode("NY 10001"), None);
        assert_eq!(normalizer.update_postcode("10001-12"), None);
    }

    #[test]
    fn rejects_keys_with_problem_chars() {
        let normalizer = normalizer();

        for key in ["a=b", "a+b", "a/b", "a&b", "a<b", "a>b", "a;b", "a'b", "a\"b", "a?b",
                    "a%b", "a#b", "a$b", "a@b", "a,b", "a.b", "a b", "a\tb", "a\rb", "a\nb"] {
            assert_eq!(
                normalizer.classify_and_clean(key, "x"),
                TagEntry::Rejected(Rejection::ProblemKey),
                "{key:?}"
            );
        }
    }

    #[test]
    fn rejects_non_ascii_values() {
        assert_eq!(
            normalizer().classify_and_clean("name", "Caf\u{e9}"),
            TagEntry::Rejected(Rejection::NonAsciiValue)
        );
        assert_eq!(
            normalizer().classify_and_clean("addr:street", "Stra\u{df}e"),
            TagEntry::Rejected(Rejection::NonAsciiValue)
        );
    }

    #[test]
    fn routes_address_keys() {
        let normalizer = normalizer();

        assert_eq!(
            normalizer.classify_and_clean("addr:street", "5th Ave."),
            TagEntry::Address { subkey: "street", value: "5th Avenue".into() }
        );
        assert_eq!(
            normalizer.classify_and_clean("addr:city", "New York Cty"),
            TagEntry::Address { subkey: "city", value: "New York Cty".into() }
        );
        assert_eq!(
            normalizer.classify_and_clean("addr:postcode", "10001-1234"),
            TagEntry::Address { subkey: "postcode", value: "10001".into() }
        );
        assert_eq!(
            normalizer.classify_and_clean("addr:housenumber", "5158"),
            TagEntry::Address { subkey: "housenumber", value: "5158".into() }
        );
    }

    #[test]
    fn drops_bad_address_values() {
        let normalizer = normalizer();

        assert_eq!(
            normalizer.classify_and_clean("addr:postcode", "ABCDE"),
            TagEntry::Rejected(Rejection::InvalidPostcode)
        );
        assert_eq!(
            normalizer.classify_and_clean("addr:street:type", "Avenue"),
            TagEntry::Rejected(Rejection::NestedAddressKey)
        );
        assert_eq!(
            normalizer.classify_and_clean("addr:housenumber", ""),
            TagEntry::Rejected(Rejection::EmptyAddressValue)
        );
    }

    #[test]
    fn routes_plain_and_namespaced_keys() {
        let normalizer = normalizer();

        assert_eq!(
            normalizer.classify_and_clean("amenity", "pharmacy"),
            TagEntry::TopLevel { key: "amenity", value: "pharmacy" }
        );
        assert_eq!(
            normalizer.classify_and_clean("name:en", "Central Park"),
            TagEntry::Namespaced { prefix: "name", subkey: "en", value: "Central Park" }
        );
        assert_eq!(
            normalizer.classify_and_clean("tiger:name_base:1", "Main"),
            TagEntry::Rejected(Rejection::NestedNamespaceKey)
        );
    }

    #[test]
    fn reserved_keys_cannot_be_overwritten() {
        let normalizer = normalizer();

        assert_eq!(
            normalizer.classify_and_clean("type", "multipolygon"),
            TagEntry::Rejected(Rejection::ReservedKey)
        );
        assert_eq!(
            normalizer.classify_and_clean("created:by", "JOSM"),
            TagEntry::Rejected(Rejection::ReservedKey)
        );
        assert_eq!(
            normalizer.classify_and_clean("created_by", "JOSM"),
            TagEntry::TopLevel { key: "created_by", value: "JOSM" }
        );
    }

    #[test]
    fn street_type_skips_leading_punctuation() {
        let normalizer = normalizer();

        assert_eq!(normalizer.street_type("Ave."), Some("Ave."));
        assert_eq!(normalizer.street_type("(Ave"), Some("Ave"));
        assert_eq!(normalizer.street_type("..."), None);
    }
}
