//! Component B: decode typed values out of the loosely-typed key/value map
//! that arrives with every request. Grounded on the case-sensitivity split
//! in `ascom-alpaca-rs`'s `server::params` (GET query strings compare
//! case-insensitively, PUT bodies compare case-sensitively) generalized
//! here into one map type parameterized by a [`Case`] rather than two
//! separate wrapper types.

use crate::error::{AlpacaResult, Error};
use indexmap::IndexMap;

/// Whether key lookups on an [`ArgumentMap`] are case-sensitive. GET uses
/// [`Case::Insensitive`] (query string); PUT uses [`Case::Sensitive`]
/// (form body) — see spec.md §3 "Argument map".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Sensitive,
    Insensitive,
}

/// An ordered key→string map decoded from a query string or form body.
/// Values are kept as raw strings until a handler asks for a typed value
/// via [`ArgumentMap::get`].
#[derive(Debug, Clone)]
pub struct ArgumentMap {
    case: Case,
    entries: IndexMap<String, String>,
}

impl ArgumentMap {
    pub fn new(case: Case) -> Self {
        ArgumentMap {
            case,
            entries: IndexMap::new(),
        }
    }

    /// Parse `k=v&k=v...` pairs (already split from a query string or a
    /// `application/x-www-form-urlencoded` body), URL-decoding both sides.
    pub fn parse(case: Case, raw: &str) -> Self {
        let mut map = Self::new(case);
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(key).map(|s| s.into_owned()).unwrap_or_else(|_| key.to_string());
            let value = urlencoding::decode(value).map(|s| s.into_owned()).unwrap_or_else(|_| value.to_string());
            map.insert(key, value);
        }
        map
    }

    pub fn insert(&mut self, key: String, value: String) {
        match self.case {
            Case::Sensitive => {
                self.entries.insert(key, value);
            }
            Case::Insensitive => {
                if let Some(existing) = self.find_key_insensitive(&key) {
                    self.entries.insert(existing, value);
                } else {
                    self.entries.insert(key, value);
                }
            }
        }
    }

    fn find_key_insensitive(&self, key: &str) -> Option<String> {
        self.entries
            .keys()
            .find(|k| k.eq_ignore_ascii_case(key))
            .cloned()
    }

    fn raw(&self, field: &str) -> Option<&str> {
        match self.case {
            Case::Sensitive => self.entries.get(field).map(String::as_str),
            Case::Insensitive => self
                .entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(field))
                .map(|(_, v)| v.as_str()),
        }
    }

    /// Decode field `name` as `T`. Missing → [`Error::field_not_found`];
    /// present but unparsable → [`Error::field_invalid`].
    pub fn get<T: FieldValue>(&self, name: &str) -> AlpacaResult<T> {
        let raw = self.raw(name).ok_or_else(|| Error::field_not_found(name))?;
        T::parse_field(raw).ok_or_else(|| Error::field_invalid(name))
    }

    /// Like [`ArgumentMap::get`] but a missing field yields `Ok(None)`
    /// instead of an error (used for optional fields like `ClientID`).
    pub fn get_opt<T: FieldValue>(&self, name: &str) -> AlpacaResult<Option<T>> {
        match self.raw(name) {
            None => Ok(None),
            Some(raw) => T::parse_field(raw).map(Some).ok_or_else(|| Error::field_invalid(name)),
        }
    }
}

/// A semantic type an [`ArgumentMap`] field can be decoded as.
pub trait FieldValue: Sized {
    fn parse_field(raw: &str) -> Option<Self>;
}

impl FieldValue for bool {
    fn parse_field(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl FieldValue for i32 {
    fn parse_field(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl FieldValue for u32 {
    fn parse_field(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl FieldValue for f64 {
    fn parse_field(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl FieldValue for String {
    fn parse_field(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl FieldValue for chrono::DateTime<chrono::Utc> {
    fn parse_field(raw: &str) -> Option<Self> {
        crate::nexstar::utc::parse_alpaca_utc(raw)
    }
}

/// Composite builder: decode N fields and construct `S` from the tuple,
/// short-circuiting on the first failure (spec.md §4.B). Implemented for
/// the arities the request types in [`crate::operations::telescope`]
/// actually use.
pub fn build2<A: FieldValue, B: FieldValue, S>(
    args: &ArgumentMap,
    name_a: &str,
    name_b: &str,
    f: impl FnOnce(A, B) -> S,
) -> AlpacaResult<S> {
    let a = args.get::<A>(name_a)?;
    let b = args.get::<B>(name_b)?;
    Ok(f(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_insensitive_query_matches_any_case() {
        let map = ArgumentMap::parse(Case::Insensitive, "ClientID=5&Action=foo");
        assert_eq!(map.get::<u32>("clientid").unwrap(), 5);
        assert_eq!(map.get::<String>("ACTION").unwrap(), "foo");
    }

    #[test]
    fn get_sensitive_body_requires_exact_case() {
        let map = ArgumentMap::parse(Case::Sensitive, "Connected=true");
        assert_eq!(map.get::<bool>("Connected").unwrap(), true);
        assert!(map.get::<bool>("connected").is_err());
    }

    #[test]
    fn missing_field_reports_name() {
        let map = ArgumentMap::new(Case::Sensitive);
        let err = map.get::<f64>("RightAscension").unwrap_err();
        assert!(err.message.contains("RightAscension"));
    }

    #[test]
    fn malformed_field_reports_name() {
        let map = ArgumentMap::parse(Case::Sensitive, "Rate=notanumber");
        let err = map.get::<f64>("Rate").unwrap_err();
        assert!(err.message.contains("Rate"));
    }

    #[test]
    fn build2_short_circuits_on_first_failure() {
        let map = ArgumentMap::parse(Case::Sensitive, "RightAscension=6.0");
        let err = build2(&map, "RightAscension", "Declination", |ra: f64, dec: f64| (ra, dec))
            .unwrap_err();
        assert!(err.message.contains("Declination"));
    }
}
