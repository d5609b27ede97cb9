//! Page body -> records -> (normalize) -> (flatten) -> output records

use crate::flatten::Flattener;
use crate::path::PathAccessor;
use crate::prototype::Normalizer;
use crate::value::Value;
use anyhow::{Context, Result};
use tracing::debug;

/// Chains the optional normalization and flattening steps over fetched pages
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    records_field: Option<String>,
    accessor: PathAccessor,
    normalizer: Option<Normalizer>,
    flattener: Option<Flattener>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take records from this (dotted) field of each page instead of the page itself
    pub fn with_records_field(mut self, field: impl Into<String>) -> Self {
        self.records_field = Some(field.into());
        self
    }

    pub fn with_accessor(mut self, accessor: PathAccessor) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_flattener(mut self, flattener: Flattener) -> Self {
        self.flattener = Some(flattener);
        self
    }

    /// Records carried by a page body.
    ///
    /// Without a records field a top-level list is the records and anything
    /// else is a single record.
    pub fn records(&self, page: Value) -> Result<Vec<Value>> {
        match &self.records_field {
            Some(field) => Ok(self.accessor.records_at(&page, field)?.to_vec()),
            None => match page {
                Value::List(items) => Ok(items),
                other => Ok(vec![other]),
            },
        }
    }

    /// Run one page through every configured step
    pub fn process_page(&self, page: Value) -> Result<Vec<Value>> {
        let mut records = self.records(page)?;

        if let Some(normalizer) = &self.normalizer {
            records = normalizer
                .normalize_all(&records)
                .context("Failed to normalize records")?;
        }

        if let Some(flattener) = &self.flattener {
            let rows = flattener
                .flatten(&records)
                .context("Failed to flatten records")?;
            records = rows.into_iter().map(Value::Map).collect();
        }

        debug!(records = records.len(), "processed page");
        Ok(records)
    }
}
