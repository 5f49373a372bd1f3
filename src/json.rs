//! A small recursive JSON value, per the "Sum type for JSON" design note:
//! deterministic key ordering (an [`indexmap::IndexMap`], not a `HashMap`)
//! so two envelopes built from the same handler output always serialize
//! identically. Printing the value to wire bytes is delegated to
//! `serde_json` (out of scope per spec.md §1) via [`serde::Serialize`].

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Json {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Json>),
    Map(IndexMap<String, Json>),
}

impl Json {
    pub fn array(items: impl IntoIterator<Item = Json>) -> Self {
        Json::List(items.into_iter().collect())
    }

    pub fn object(pairs: impl IntoIterator<Item = (&'static str, Json)>) -> Self {
        Json::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<bool> for Json {
    fn from(v: bool) -> Self {
        Json::Bool(v)
    }
}

impl From<i32> for Json {
    fn from(v: i32) -> Self {
        Json::Int(v as i64)
    }
}

impl From<u32> for Json {
    fn from(v: u32) -> Self {
        Json::Int(v as i64)
    }
}

impl From<f64> for Json {
    fn from(v: f64) -> Self {
        Json::Float(v)
    }
}

impl From<String> for Json {
    fn from(v: String) -> Self {
        Json::String(v)
    }
}

impl From<&str> for Json {
    fn from(v: &str) -> Self {
        Json::String(v.to_string())
    }
}

impl<T: Into<Json>> From<Vec<T>> for Json {
    fn from(v: Vec<T>) -> Self {
        Json::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Json>> From<Option<T>> for Json {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Json::Null,
        }
    }
}

impl Serialize for Json {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Json::Null => serializer.serialize_none(),
            Json::Bool(b) => serializer.serialize_bool(*b),
            Json::Int(i) => serializer.serialize_i64(*i),
            Json::Float(f) => serializer.serialize_f64(*f),
            Json::String(s) => serializer.serialize_str(s),
            Json::List(items) => items.serialize(serializer),
            Json::Map(map) => map.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_insertion_order() {
        let value = Json::object([("b", Json::Int(1)), ("a", Json::Int(2))]);
        let rendered = serde_json::to_string(&value).unwrap();
        assert_eq!(rendered, r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn null_round_trips_through_option() {
        let value: Json = Option::<bool>::None.into();
        assert_eq!(value, Json::Null);
    }
}
