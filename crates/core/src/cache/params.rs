//! Request parameter bags used for cache-key derivation.
//!
//! A `ParamBag` holds the filter, sort and pagination inputs that distinguish
//! one cached list view from another. Keys are kept sorted, so two bags with
//! the same pairs serialize identically no matter how they were built.
//! Absent values (`None`, JSON `null`, empty lists) are never stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::Error;

/// A scalar or list value in a parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    fn is_absent(&self) -> bool {
        matches!(self, ParamValue::List(items) if items.is_empty())
    }

    /// Append this value under `name` to a form-encoded serializer.
    ///
    /// Lists are flattened as `name[0]`, `name[1]`, ... recursively.
    fn append_to(&self, name: &str, out: &mut form_urlencoded::Serializer<'_, String>) {
        match self {
            ParamValue::Bool(b) => {
                out.append_pair(name, if *b { "1" } else { "0" });
            }
            ParamValue::Int(i) => {
                out.append_pair(name, &i.to_string());
            }
            ParamValue::Float(f) => {
                out.append_pair(name, &f.to_string());
            }
            ParamValue::Str(s) => {
                out.append_pair(name, s);
            }
            ParamValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    item.append_to(&format!("{name}[{index}]"), out);
                }
            }
        }
    }

    fn from_json(value: &serde_json::Value) -> Result<Option<Self>, Error> {
        use serde_json::Value;

        let converted = match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => ParamValue::Str(s.clone()),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = Self::from_json(item)? {
                        list.push(v);
                    }
                }
                ParamValue::List(list)
            }
            Value::Object(_) => {
                return Err(Error::InvalidInput("nested objects are not supported as filter values".into()));
            }
        };

        Ok(if converted.is_absent() { None } else { Some(converted) })
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| ParamValue::Str(value.to_string()), ParamValue::Int)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Order-independent mapping of parameter names to values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamBag {
    params: BTreeMap<String, ParamValue>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous one. Empty lists are dropped.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if value.is_absent() {
            self.params.remove(&key);
        } else {
            self.params.insert(key, value);
        }
        self
    }

    /// Insert only when `value` is present.
    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Insert only when `key` is not already set.
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        let key = key.into();
        if !self.params.contains_key(&key) {
            self.insert(key, value);
        }
        self
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style `insert_opt`.
    pub fn with_opt<V: Into<ParamValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Build a bag from a JSON object, skipping `null` members.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `value` is not an object or holds
    /// nested objects.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, Error> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("filter parameters must be a JSON object".into()))?;

        let mut bag = Self::new();
        for (key, value) in object {
            if let Some(v) = ParamValue::from_json(value)? {
                bag.params.insert(key.clone(), v);
            }
        }
        Ok(bag)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.params.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Iterate in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical form-encoded query string, keys ascending.
    ///
    /// Spaces encode as `+`, reserved characters are percent-encoded and list
    /// items are flattened as `key[0]=a&key[1]=b`.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            value.append_to(key, &mut out);
        }
        out.finish()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_sorted_by_key() {
        let bag = ParamBag::new().with("price", 100).with("category", "electronics");
        assert_eq!(bag.to_query_string(), "category=electronics&price=100");
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let a = ParamBag::new().with("page", 2).with("category_name", "Shoes");
        let b = ParamBag::new().with("category_name", "Shoes").with("page", 2);
        assert_eq!(a, b);
        assert_eq!(a.to_query_string(), b.to_query_string());
    }

    #[test]
    fn test_encoding() {
        let bag = ParamBag::new().with("q", "red shoes & socks");
        assert_eq!(bag.to_query_string(), "q=red+shoes+%26+socks");
    }

    #[test]
    fn test_list_flattening() {
        let bag = ParamBag::new().with("category_ids", vec![3, 1]);
        assert_eq!(bag.to_query_string(), "category_ids%5B0%5D=3&category_ids%5B1%5D=1");
    }

    #[test]
    fn test_scalar_formatting() {
        let bag = ParamBag::new().with("active", true).with("max_price", 99.5).with("min_price", 10.0);
        assert_eq!(bag.to_query_string(), "active=1&max_price=99.5&min_price=10");
    }

    #[test]
    fn test_absent_values_are_skipped() {
        let mut bag = ParamBag::new();
        bag.insert_opt("price", None::<f64>).insert("tags", Vec::<String>::new());
        assert!(bag.is_empty());
        assert_eq!(bag, ParamBag::new());
    }

    #[test]
    fn test_insert_default_keeps_caller_value() {
        let mut bag = ParamBag::new().with("page", 3);
        bag.insert_default("page", 1).insert_default("per_page", 20);
        assert_eq!(bag.get("page"), Some(&ParamValue::Int(3)));
        assert_eq!(bag.get("per_page"), Some(&ParamValue::Int(20)));
    }

    #[test]
    fn test_from_json_drops_nulls() {
        let bag = ParamBag::from_json(&json!({"q": "shoe", "min_price": null, "ids": [1, null, 2]})).unwrap();
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("ids"), Some(&ParamValue::List(vec![ParamValue::Int(1), ParamValue::Int(2)])));
        assert!(!bag.contains_key("min_price"));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(ParamBag::from_json(&json!([1, 2])).is_err());
        assert!(ParamBag::from_json(&json!({"nested": {"a": 1}})).is_err());
    }
}
