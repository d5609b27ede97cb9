use crate::formats::{is_iso_date, is_iso_datetime};
use crate::prototype::error::{FieldPath, NormalizeError};
use crate::value::Value;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Expected type of a prototype leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Bool,
    Int,
    Float,
    Date,
    DateTime,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Date => "date",
            ScalarKind::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled prototype: the shape every normalized value must have
#[derive(Debug, Clone, PartialEq)]
pub enum Prototype {
    /// A map with declared fields. `catch_all` collects undeclared input keys
    /// as key/value pairs.
    Record {
        fields: Vec<(String, Prototype)>,
        catch_all: bool,
    },
    /// A list whose elements all follow the template. `None` only accepts empty lists.
    List(Option<Box<Prototype>>),
    Scalar(ScalarKind),
    /// A leaf whose runtime type can't drive normalization (e.g. `null`).
    /// Only fails when normalization actually reaches it.
    Unsupported(&'static str),
}

impl Prototype {
    /// Empty record, to be filled with [`Prototype::field`]
    pub fn record() -> Self {
        Prototype::Record {
            fields: Vec::new(),
            catch_all: false,
        }
    }

    pub fn list(template: Prototype) -> Self {
        Prototype::List(Some(Box::new(template)))
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        Prototype::Scalar(kind)
    }

    /// Add a declared field. No-op on non-record prototypes.
    pub fn field(mut self, name: impl Into<String>, prototype: Prototype) -> Self {
        if let Prototype::Record { fields, .. } = &mut self {
            fields.push((name.into(), prototype));
        }
        self
    }

    /// Capture undeclared keys. No-op on non-record prototypes.
    pub fn catch_all(mut self) -> Self {
        if let Prototype::Record { catch_all, .. } = &mut self {
            *catch_all = true;
        }
        self
    }

    /// Compile an example value into a prototype.
    ///
    /// The type of every leaf becomes the expected type, a map key `""` marks
    /// the map as catching undeclared keys, and a list contributes its only
    /// element as the template for all input elements.
    pub fn from_value(example: &Value) -> Result<Self, NormalizeError> {
        let mut path = FieldPath::root();
        Self::compile(example, &mut path, &|_: &str| None)
    }

    /// Like [`Prototype::from_value`] but for raw JSON prototypes (e.g. taken
    /// from API docs): string leaves that look like ISO dates or datetimes
    /// become date/datetime leaves.
    pub fn from_json(example: &serde_json::Value) -> Result<Self, NormalizeError> {
        let mut path = FieldPath::root();
        Self::compile(&Value::from(example), &mut path, &|text: &str| {
            if is_iso_datetime(text) {
                Some(ScalarKind::DateTime)
            } else if is_iso_date(text) {
                Some(ScalarKind::Date)
            } else {
                None
            }
        })
    }

    fn compile(
        example: &Value,
        path: &mut FieldPath,
        sniff: &dyn Fn(&str) -> Option<ScalarKind>,
    ) -> Result<Self, NormalizeError> {
        let prototype = match example {
            Value::Map(map) => {
                let mut fields = Vec::with_capacity(map.len());
                let mut catch_all = false;
                for (key, value) in map {
                    if key.is_empty() {
                        catch_all = true;
                        continue;
                    }
                    path.push_key(key);
                    fields.push((key.clone(), Self::compile(value, path, sniff)?));
                    path.pop();
                }
                Prototype::Record { fields, catch_all }
            }
            Value::List(items) => match items.as_slice() {
                [] => Prototype::List(None),
                [template] => {
                    path.push_index(0);
                    let template = Self::compile(template, path, sniff)?;
                    path.pop();
                    Prototype::list(template)
                }
                _ => {
                    return Err(NormalizeError::new(
                        path,
                        format!(
                            "prototype list must have at most one element, found {}",
                            items.len()
                        ),
                    ))
                }
            },
            Value::String(text) => Prototype::Scalar(sniff(text).unwrap_or(ScalarKind::String)),
            Value::Bool(_) => Prototype::Scalar(ScalarKind::Bool),
            Value::Int(_) => Prototype::Scalar(ScalarKind::Int),
            Value::Float(_) => Prototype::Scalar(ScalarKind::Float),
            Value::DateTime(_) => Prototype::Scalar(ScalarKind::DateTime),
            Value::Date(_) => Prototype::Scalar(ScalarKind::Date),
            Value::Null => Prototype::Unsupported("null"),
        };
        Ok(prototype)
    }
}

/// Hook run in lenient mode before the built-in cast of an int, float, date or
/// datetime leaf whose input type differs from the prototype's.
pub type TypeConverter =
    Arc<dyn Fn(ScalarKind, &Value, &FieldPath) -> anyhow::Result<Value> + Send + Sync>;

/// Configuration for prototype normalization
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Output key holding the captured undeclared fields
    pub freestyle_attrs_name: String,

    /// Prototype paths (dot-joined, list steps skipped) copied verbatim from the input
    pub pass_through_paths: HashSet<String>,

    /// Fail on any type mismatch instead of attempting a coercion
    pub strict_types: bool,

    #[serde(skip)]
    pub type_converter: Option<TypeConverter>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            freestyle_attrs_name: String::from("freestyle_attrs"),
            pass_through_paths: HashSet::new(),
            strict_types: true,
            type_converter: None,
        }
    }
}

impl fmt::Debug for NormalizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizeOptions")
            .field("freestyle_attrs_name", &self.freestyle_attrs_name)
            .field("pass_through_paths", &self.pass_through_paths)
            .field("strict_types", &self.strict_types)
            .field("type_converter", &self.type_converter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl NormalizeOptions {
    pub fn with_freestyle_attrs_name(mut self, name: impl Into<String>) -> Self {
        self.freestyle_attrs_name = name.into();
        self
    }

    pub fn with_pass_through_path(mut self, path: impl Into<String>) -> Self {
        self.pass_through_paths.insert(path.into());
        self
    }

    pub fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }

    /// Shorthand for `with_strict_types(false)`
    pub fn lenient(self) -> Self {
        self.with_strict_types(false)
    }

    pub fn with_type_converter<F>(mut self, converter: F) -> Self
    where
        F: Fn(ScalarKind, &Value, &FieldPath) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.type_converter = Some(Arc::new(converter));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_record_with_marker() {
        let proto = Prototype::from_json(&json!({"a": 0, "": "", "tags": [""]})).unwrap();

        let expected = Prototype::record()
            .field("a", Prototype::scalar(ScalarKind::Int))
            .field("tags", Prototype::list(Prototype::scalar(ScalarKind::String)))
            .catch_all();
        assert_eq!(proto, expected);
    }

    #[test]
    fn test_compile_detects_dates_in_json() {
        let proto = Prototype::from_json(&json!({
            "born": "1990-01-01",
            "seen": "2024-05-01T10:00:00Z",
            "name": "x"
        }))
        .unwrap();

        let Prototype::Record { fields, .. } = proto else {
            panic!("Expected record prototype");
        };
        assert_eq!(fields[0].1, Prototype::Scalar(ScalarKind::Date));
        assert_eq!(fields[1].1, Prototype::Scalar(ScalarKind::DateTime));
        assert_eq!(fields[2].1, Prototype::Scalar(ScalarKind::String));
    }

    #[test]
    fn test_from_value_does_not_sniff_strings() {
        let proto = Prototype::from_value(&Value::from("1990-01-01")).unwrap();
        assert_eq!(proto, Prototype::Scalar(ScalarKind::String));
    }

    #[test]
    fn test_compile_rejects_heterogeneous_lists() {
        let err = Prototype::from_json(&json!({"pets": [{"id": 0}, {"id": 0}]})).unwrap_err();
        assert_eq!(err.path.to_string(), "pets");
        assert!(err.message.contains("at most one element"));
    }

    #[test]
    fn test_null_leaf_is_deferred() {
        let proto = Prototype::from_json(&json!({"x": null})).unwrap();
        assert_eq!(
            proto,
            Prototype::record().field("x", Prototype::Unsupported("null"))
        );
    }

    #[test]
    fn test_options_from_json_config() {
        let options: NormalizeOptions = serde_json::from_value(json!({
            "strict_types": false,
            "pass_through_paths": ["blob"]
        }))
        .unwrap();

        assert!(!options.strict_types);
        assert_eq!(options.freestyle_attrs_name, "freestyle_attrs");
        assert!(options.pass_through_paths.contains("blob"));
        assert!(options.type_converter.is_none());
    }
}
