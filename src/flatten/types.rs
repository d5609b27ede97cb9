use crate::value::Map;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// A one-level record with composite dotted keys, e.g. `pets.toys.name`
pub type FlatRow = Map;

/// Configuration for list flattening
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlattenOptions {
    /// Joins nested key names in output columns
    pub separator: String,

    /// Emit a row for a record whose unroll target is absent, null or empty
    pub return_incomplete_records: bool,

    /// Serialize list values not consumed by the unroll path to JSON strings
    pub jsonify_lists: bool,

    /// Output columns whose nested map is serialized to a JSON string instead of inlined
    pub jsonify_dicts: HashSet<String>,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        FlattenOptions {
            separator: String::from("."),
            return_incomplete_records: true,
            jsonify_lists: false,
            jsonify_dicts: HashSet::new(),
        }
    }
}

impl FlattenOptions {
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_incomplete_records(mut self, keep: bool) -> Self {
        self.return_incomplete_records = keep;
        self
    }

    pub fn with_jsonify_lists(mut self, jsonify: bool) -> Self {
        self.jsonify_lists = jsonify;
        self
    }

    pub fn with_jsonify_dict(mut self, column: impl Into<String>) -> Self {
        self.jsonify_dicts.insert(column.into());
        self
    }
}

/// Malformed input met while flattening
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlattenError {
    #[error("{path}: expected a list of records, found {found}")]
    NotAList { path: String, found: &'static str },

    #[error("{path}: expected a record, found {found}")]
    NotARecord { path: String, found: &'static str },
}

impl FlattenError {
    pub fn path(&self) -> &str {
        match self {
            FlattenError::NotAList { path, .. } | FlattenError::NotARecord { path, .. } => path,
        }
    }
}
