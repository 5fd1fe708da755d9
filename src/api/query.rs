//! Conversion of structured values into URL query items.
//!
//! Every value that ends up in a query string goes through [`Queryable`]:
//! top-level keys become parameter names, scalars become their textual form
//! and nested objects or arrays are carried as compact JSON strings.

use crate::error::{ClientError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single `name=value` pair of a URL query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryItem {
    pub name: String,
    pub value: Option<String>,
}

impl QueryItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A flag-style item without a value
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Types that can be turned into an ordered list of query items
pub trait Queryable {
    fn to_query_items(&self) -> Result<Vec<QueryItem>>;
}

impl Queryable for Vec<QueryItem> {
    fn to_query_items(&self) -> Result<Vec<QueryItem>> {
        Ok(self.clone())
    }
}

impl Queryable for [QueryItem] {
    fn to_query_items(&self) -> Result<Vec<QueryItem>> {
        Ok(self.to_vec())
    }
}

impl<K: AsRef<str>, V: AsRef<str>> Queryable for [(K, V)] {
    fn to_query_items(&self) -> Result<Vec<QueryItem>> {
        Ok(self
            .iter()
            .map(|(k, v)| QueryItem::new(k.as_ref(), v.as_ref()))
            .collect())
    }
}

impl<K: AsRef<str>, V: AsRef<str>, const N: usize> Queryable for [(K, V); N] {
    fn to_query_items(&self) -> Result<Vec<QueryItem>> {
        self.as_slice().to_query_items()
    }
}

impl Queryable for BTreeMap<String, String> {
    fn to_query_items(&self) -> Result<Vec<QueryItem>> {
        Ok(self
            .iter()
            .map(|(k, v)| QueryItem::new(k.clone(), v.clone()))
            .collect())
    }
}

impl Queryable for Value {
    fn to_query_items(&self) -> Result<Vec<QueryItem>> {
        match self {
            Value::Object(map) => flatten_object(map),
            other => Err(ClientError::invalid_json(format!(
                "Query data must be a JSON object, got: {}",
                other
            ))),
        }
    }
}

impl Queryable for Map<String, Value> {
    fn to_query_items(&self) -> Result<Vec<QueryItem>> {
        flatten_object(self)
    }
}

/// Flatten any serializable value whose JSON form is an object
pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Vec<QueryItem>> {
    serde_json::to_value(value)?.to_query_items()
}

/// Flatten raw JSON bytes whose top level is an object
pub fn from_json_bytes(bytes: &[u8]) -> Result<Vec<QueryItem>> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        ClientError::invalid_json(format!(
            "Data is not a valid JSON ({}): {}",
            e,
            String::from_utf8_lossy(bytes)
        ))
    })?;
    value.to_query_items()
}

fn flatten_object(map: &Map<String, Value>) -> Result<Vec<QueryItem>> {
    let mut items = Vec::with_capacity(map.len());
    for (key, value) in map {
        let rendered = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            nested @ (Value::Object(_) | Value::Array(_)) => serde_json::to_string(nested)?,
        };
        items.push(QueryItem::new(key.clone(), rendered));
    }
    Ok(items)
}
