//! Typed view of one `/_stats` document.
//!
//! CouchDB returns `{ category: { field: { "current": n, ... } } }`. A field
//! can be missing, or carry `"current": null`, when the feature behind it is
//! disabled or has not seen traffic yet. Both are valid and represented as
//! `None` here.

use ahash::AHashMap as HashMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TransportError;

/// One statistic as published by CouchDB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatRecord {
    pub description: Option<String>,
    pub current: Option<f64>,
    pub sum: Option<f64>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl StatRecord {
    pub fn with_current(current: f64) -> Self {
        Self {
            current: Some(current),
            ..Self::default()
        }
    }

    /// Reads a record from its JSON object. Each key is read on its own, so a
    /// mistyped side field never hides a valid `current`.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let number = |key: &str| fields.get(key).and_then(Value::as_f64);
        Self {
            description: fields
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            current: number("current"),
            sum: number("sum"),
            mean: number("mean"),
            stddev: number("stddev"),
            min: number("min"),
            max: number("max"),
        }
    }

    /// The value to report, or `None` when the record must be skipped.
    ///
    /// A missing current value and a current value of zero both mean "no
    /// data this cycle".
    pub fn reportable_value(&self) -> Option<f64> {
        self.current.filter(|v| *v != 0.0 && v.is_finite())
    }
}

pub type Category = HashMap<String, StatRecord>;

/// A point-in-time set of statistics.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    categories: HashMap<String, Category>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, TransportError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Builds a snapshot from a decoded JSON document.
    ///
    /// The top level must be an object. Below it, non-object categories and
    /// fields are dropped instead of failing the whole document. A
    /// non-numeric `current` reads as `None`.
    pub fn from_value(value: Value) -> Result<Self, TransportError> {
        let Value::Object(top) = value else {
            return Err(TransportError::NotAnObject);
        };

        let mut categories = HashMap::with_capacity(top.len());
        for (category_name, category_value) in top {
            let Value::Object(fields) = category_value else {
                debug!("Ignoring non-object stats category '{}'", category_name);
                continue;
            };

            let mut category = Category::with_capacity(fields.len());
            for (field_name, field_value) in fields {
                let Value::Object(record) = field_value else {
                    debug!("Ignoring stats field {}.{}", category_name, field_name);
                    continue;
                };
                category.insert(field_name, StatRecord::from_fields(&record));
            }
            categories.insert(category_name, category);
        }

        Ok(Self { categories })
    }

    /// Adds or replaces a record.
    pub fn insert(&mut self, category: &str, field: &str, record: StatRecord) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(field.to_string(), record);
    }

    pub fn category(&self, category: &str) -> Option<&Category> {
        self.categories.get(category)
    }

    pub fn get(&self, category: &str, field: &str) -> Option<&StatRecord> {
        self.category(category)?.get(field)
    }

    /// Shortcut for `get(..)` followed by [`StatRecord::reportable_value`].
    pub fn reportable_value(&self, category: &str, field: &str) -> Option<f64> {
        self.get(category, field)?.reportable_value()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
