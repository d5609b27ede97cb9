use crate::flatten::types::{FlatRow, FlattenError, FlattenOptions};
use crate::value::{Map, Value};
use std::borrow::Cow;
use tracing::debug;

/// Unrolls nested record lists into flat rows
///
/// Walking `path` (e.g. `["pets", "toys"]`) yields one row per element reached
/// at the end of the path, each carrying the flattened fields of all its
/// ancestors.
#[derive(Debug, Clone)]
pub struct Flattener {
    path: Vec<String>,
    options: FlattenOptions,
}

impl Flattener {
    pub fn new<I, S>(path: I, options: FlattenOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Flattener {
            path: path.into_iter().map(Into::into).collect(),
            options,
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn options(&self) -> &FlattenOptions {
        &self.options
    }

    /// Flatten a list of records.
    ///
    /// An empty list yields no rows, even with `return_incomplete_records`
    /// set: incomplete rows are only produced for records whose unroll
    /// target is missing or empty.
    pub fn flatten(&self, records: &[Value]) -> Result<Vec<FlatRow>, FlattenError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.expand(records, &self.path, "")?;
        debug!(records = records.len(), rows = rows.len(), "flattened records");
        Ok(rows)
    }

    /// Flatten a value that must be a list of records (`null` counts as empty)
    pub fn flatten_value(&self, records: &Value) -> Result<Vec<FlatRow>, FlattenError> {
        match records {
            Value::List(items) => self.flatten(items),
            Value::Null => Ok(Vec::new()),
            other => Err(FlattenError::NotAList {
                path: "$".to_string(),
                found: other.kind(),
            }),
        }
    }

    fn expand(
        &self,
        records: &[Value],
        path: &[String],
        prefix: &str,
    ) -> Result<Vec<FlatRow>, FlattenError> {
        let mut rows = Vec::new();

        for record in records {
            let Value::Map(record) = record else {
                return Err(FlattenError::NotARecord {
                    path: self.display_prefix(prefix),
                    found: record.kind(),
                });
            };

            let head = path.first();
            let mut repeated = FlatRow::new();
            for (key, value) in record {
                if head == Some(key) {
                    continue;
                }
                self.unroll_into(&mut repeated, format!("{prefix}{key}"), value);
            }

            let Some((head, rest)) = path.split_first() else {
                rows.push(repeated);
                continue;
            };

            let child_prefix = format!("{prefix}{head}{}", self.options.separator);
            let children = self.children(record.get(head), &child_prefix)?;
            for child in self.expand(&children, rest, &child_prefix)? {
                let mut row = repeated.clone();
                row.extend(child);
                rows.push(row);
            }
        }

        Ok(rows)
    }

    /// Records under an unroll key. Absent, null and empty all mean "no children".
    fn children<'a>(
        &self,
        value: Option<&'a Value>,
        prefix: &str,
    ) -> Result<Cow<'a, [Value]>, FlattenError> {
        match value {
            Some(Value::List(items)) if !items.is_empty() => Ok(Cow::Borrowed(items)),
            None | Some(Value::Null) | Some(Value::List(_)) => {
                if self.options.return_incomplete_records {
                    Ok(Cow::Owned(vec![Value::Map(Map::new())]))
                } else {
                    Ok(Cow::Owned(Vec::new()))
                }
            }
            Some(other) => Err(FlattenError::NotAList {
                path: self.display_prefix(prefix),
                found: other.kind(),
            }),
        }
    }

    /// Write `value` under `column`, inlining nested maps with dotted keys
    fn unroll_into(&self, row: &mut FlatRow, column: String, value: &Value) {
        match value {
            Value::Map(_) if self.options.jsonify_dicts.contains(&column) => {
                row.insert(column, Value::String(value.to_json_string()));
            }
            Value::Map(inner) => {
                for (key, nested) in inner {
                    let nested_column = format!("{column}{}{key}", self.options.separator);
                    self.unroll_into(row, nested_column, nested);
                }
            }
            Value::List(_) if self.options.jsonify_lists => {
                row.insert(column, Value::String(value.to_json_string()));
            }
            _ => {
                row.insert(column, value.clone());
            }
        }
    }

    fn display_prefix(&self, prefix: &str) -> String {
        match prefix.strip_suffix(self.options.separator.as_str()) {
            Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
            _ if prefix.is_empty() => "$".to_string(),
            _ => prefix.to_string(),
        }
    }
}

/// Flatten `records` along `path` in one call.
///
/// An empty `records` list yields no rows whatever the options; see
/// [`Flattener::flatten`].
pub fn flatten<S: AsRef<str>>(
    records: &[Value],
    path: &[S],
    options: &FlattenOptions,
) -> Result<Vec<FlatRow>, FlattenError> {
    Flattener::new(path.iter().map(|s| s.as_ref()), options.clone()).flatten(records)
}
