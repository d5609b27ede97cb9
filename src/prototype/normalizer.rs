use crate::prototype::coerce::{accept, coerce};
use crate::prototype::error::{FieldPath, NormalizeError};
use crate::prototype::types::{NormalizeOptions, Prototype, ScalarKind};
use crate::value::{Map, Value};
use tracing::{debug, trace};

/// Reshapes input values so they match a prototype exactly
#[derive(Debug, Clone)]
pub struct Normalizer {
    prototype: Prototype,
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(prototype: Prototype, options: NormalizeOptions) -> Self {
        Normalizer { prototype, options }
    }

    /// Compile an example value and build a normalizer around it
    pub fn from_value(prototype: &Value, options: NormalizeOptions) -> Result<Self, NormalizeError> {
        Ok(Self::new(Prototype::from_value(prototype)?, options))
    }

    pub fn prototype(&self) -> &Prototype {
        &self.prototype
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize a single value
    pub fn normalize(&self, input: &Value) -> Result<Value, NormalizeError> {
        normalize(&self.prototype, input, &self.options)
    }

    /// Normalize every record of a page. Error paths start with the record index.
    pub fn normalize_all(&self, inputs: &[Value]) -> Result<Vec<Value>, NormalizeError> {
        let walker = Walker { options: &self.options };
        let mut path = FieldPath::root();
        let mut out = Vec::with_capacity(inputs.len());
        for (idx, input) in inputs.iter().enumerate() {
            path.push_index(idx);
            out.push(walker.walk(&self.prototype, input, &mut path)?);
            path.pop();
        }
        debug!(records = out.len(), "normalized page");
        Ok(out)
    }
}

/// Normalize `input` against a compiled prototype.
///
/// The output has every field the prototype declares (missing ones as
/// `null`), no field it doesn't declare except the captured freestyle
/// attributes, and leaves of the prototype's types. Normalizing an output a
/// second time returns it unchanged.
pub fn normalize(
    prototype: &Prototype,
    input: &Value,
    options: &NormalizeOptions,
) -> Result<Value, NormalizeError> {
    let walker = Walker { options };
    let mut path = FieldPath::root();
    let out = walker.walk(prototype, input, &mut path)?;
    debug!(strict = options.strict_types, "normalized value");
    Ok(out)
}

/// Compile `prototype` (an example value) and normalize `input` against it
pub fn normalize_with_prototype(
    prototype: &Value,
    input: &Value,
    options: &NormalizeOptions,
) -> Result<Value, NormalizeError> {
    normalize(&Prototype::from_value(prototype)?, input, options)
}

struct Walker<'a> {
    options: &'a NormalizeOptions,
}

impl Walker<'_> {
    fn walk(
        &self,
        prototype: &Prototype,
        input: &Value,
        path: &mut FieldPath,
    ) -> Result<Value, NormalizeError> {
        if self.is_pass_through(path) {
            trace!(%path, "pass-through subtree");
            return Ok(input.clone());
        }

        match prototype {
            Prototype::Record { fields, catch_all } => {
                self.walk_record(fields, *catch_all, input, path)
            }
            Prototype::List(template) => self.walk_list(template.as_deref(), input, path),
            Prototype::Scalar(kind) => self.walk_scalar(*kind, input, path),
            Prototype::Unsupported(kind) => Err(NormalizeError::new(
                path,
                format!("prototype data type not supported: {kind}"),
            )),
        }
    }

    fn is_pass_through(&self, path: &FieldPath) -> bool {
        let paths = &self.options.pass_through_paths;
        !paths.is_empty() && paths.contains(&path.prototype_path())
    }

    fn walk_record(
        &self,
        fields: &[(String, Prototype)],
        catch_all: bool,
        input: &Value,
        path: &mut FieldPath,
    ) -> Result<Value, NormalizeError> {
        let empty = Map::new();
        let input = match input {
            Value::Null => &empty,
            Value::Map(map) => map,
            other => {
                return Err(NormalizeError::new(
                    path,
                    format!("expected a map, found {}", other.kind()),
                ))
            }
        };

        let mut out = Map::with_capacity(fields.len() + usize::from(catch_all));
        for (name, field) in fields {
            path.push_key(name);
            let value = self.walk(field, input.get(name).unwrap_or(&Value::Null), path)?;
            path.pop();
            out.insert(name.clone(), value);
        }

        if catch_all {
            let captured = self.capture_undeclared(fields, input);
            trace!(%path, captured = captured.len(), "captured freestyle attributes");
            out.insert(self.options.freestyle_attrs_name.clone(), Value::List(captured));
        }

        Ok(Value::Map(out))
    }

    /// Undeclared input keys as `{"key": k, "value": v}` pairs, in input order.
    ///
    /// A list of `{"key", "value"}` pairs already sitting under the freestyle key
    /// is a previous capture and is carried over as-is. Any other value under
    /// that key is an ordinary undeclared field.
    fn capture_undeclared(&self, fields: &[(String, Prototype)], input: &Map) -> Vec<Value> {
        let mut captured = Vec::new();
        for (key, value) in input {
            if fields.iter().any(|(name, _)| name == key) {
                continue;
            }
            match value {
                Value::List(previous)
                    if *key == self.options.freestyle_attrs_name
                        && previous.iter().all(is_captured_pair) =>
                {
                    captured.extend(previous.iter().cloned());
                }
                _ => {
                    let mut pair = Map::with_capacity(2);
                    pair.insert("key".to_string(), Value::String(key.clone()));
                    pair.insert("value".to_string(), value.clone());
                    captured.push(Value::Map(pair));
                }
            }
        }
        captured
    }

    fn walk_list(
        &self,
        template: Option<&Prototype>,
        input: &Value,
        path: &mut FieldPath,
    ) -> Result<Value, NormalizeError> {
        let items: &[Value] = match input {
            Value::Null => &[],
            Value::List(items) => items,
            other => {
                return Err(NormalizeError::new(
                    path,
                    format!("expected a list, found {}", other.kind()),
                ))
            }
        };

        let Some(template) = template else {
            if items.is_empty() {
                return Ok(Value::List(Vec::new()));
            }
            return Err(NormalizeError::new(path, "prototype list has no element template"));
        };

        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            path.push_index(idx);
            out.push(self.walk(template, item, path)?);
            path.pop();
        }
        Ok(Value::List(out))
    }

    fn walk_scalar(
        &self,
        kind: ScalarKind,
        input: &Value,
        path: &FieldPath,
    ) -> Result<Value, NormalizeError> {
        if input.is_null() {
            return Ok(Value::Null);
        }
        if let Some(value) = accept(kind, input) {
            return Ok(value);
        }
        if self.options.strict_types {
            return Err(NormalizeError::new(
                path,
                format!(
                    "type mismatch: prototype expects {kind}, found {} (of value {})",
                    input.kind(),
                    input.to_json_string()
                ),
            ));
        }
        coerce(kind, input, path, self.options.type_converter.as_ref())
    }
}

fn is_captured_pair(value: &Value) -> bool {
    match value {
        Value::Map(pair) => {
            pair.len() == 2
                && matches!(pair.get("key"), Some(Value::String(_)))
                && pair.contains_key("value")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::error::PathSegment;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(prototype: serde_json::Value, input: serde_json::Value) -> Result<Value, NormalizeError> {
        run_with(prototype, input, &NormalizeOptions::default())
    }

    fn run_with(
        prototype: serde_json::Value,
        input: serde_json::Value,
        options: &NormalizeOptions,
    ) -> Result<Value, NormalizeError> {
        let prototype = Prototype::from_json(&prototype)?;
        normalize(&prototype, &Value::from(input), options)
    }

    #[test]
    fn test_fills_missing_fields_and_drops_unknown_ones() {
        let prototype = json!({
            "id": 0,
            "name:": "",
            "country": "",
            "city": "",
            "pets": [{"id": 0, "type": "", "name": ""}]
        });
        let input = json!({
            "id": 123,
            "name:": "John",
            "country": "Poland",
            "pets": [
                {"id": 101, "type": "dog", "name": "Barky"},
                {"id": 102, "type": "snail"}
            ],
            "unspecifiedField": 123
        });

        let result = run(prototype.clone(), input).unwrap();
        let expected = json!({
            "id": 123,
            "name:": "John",
            "country": "Poland",
            "city": null,
            "pets": [
                {"id": 101, "type": "dog", "name": "Barky"},
                {"id": 102, "type": "snail", "name": null}
            ]
        });
        assert_eq!(result.to_json(), expected);

        let again = run(prototype, result.to_json()).unwrap();
        assert_eq!(again, result);
    }

    #[test]
    fn test_freestyle_capture() {
        let result = run(json!({"a": 0, "": ""}), json!({"a": 1, "b": 2, "c": 3})).unwrap();
        assert_eq!(
            result.to_json(),
            json!({
                "a": 1,
                "freestyle_attrs": [{"key": "b", "value": 2}, {"key": "c", "value": 3}]
            })
        );
    }

    #[test]
    fn test_freestyle_capture_is_idempotent() {
        let prototype = Prototype::from_json(&json!({"a": 0, "": ""})).unwrap();
        let options = NormalizeOptions::default().with_freestyle_attrs_name("extra");
        let input = Value::from(json!({"a": 1, "b": {"deep": true}}));

        let once = normalize(&prototype, &input, &options).unwrap();
        let twice = normalize(&prototype, &once, &options).unwrap();
        assert_eq!(once, twice);
        assert_eq!(
            once.to_json(),
            json!({"a": 1, "extra": [{"key": "b", "value": {"deep": true}}]})
        );
    }

    #[test]
    fn test_field_named_like_freestyle_key_is_wrapped() {
        let prototype = Prototype::from_json(&json!({"a": 0, "": ""})).unwrap();
        let input = Value::from(json!({"a": 1, "freestyle_attrs": [1, 2]}));
        let options = NormalizeOptions::default();

        let once = normalize(&prototype, &input, &options).unwrap();
        assert_eq!(
            once.to_json(),
            json!({"a": 1, "freestyle_attrs": [{"key": "freestyle_attrs", "value": [1, 2]}]})
        );
        assert_eq!(normalize(&prototype, &once, &options).unwrap(), once);
    }

    #[test]
    fn test_freestyle_on_missing_map_is_empty() {
        let result = run(json!({"meta": {"": ""}}), json!({})).unwrap();
        assert_eq!(result.to_json(), json!({"meta": {"freestyle_attrs": []}}));
    }

    #[test]
    fn test_null_input_expands_to_full_shape() {
        let result = run(json!({"a": {"b": 0, "c": [""]}}), json!(null)).unwrap();
        assert_eq!(result.to_json(), json!({"a": {"b": null, "c": []}}));
    }

    #[test]
    fn test_strict_type_mismatch_reports_path() {
        let err = run(
            json!({"pets": [{"age": 0}]}),
            json!({"pets": [{"age": 3}, {"age": "four"}]}),
        )
        .unwrap_err();

        assert_eq!(err.path.to_string(), "pets[1].age");
        assert_eq!(
            err.path.segments(),
            &[
                PathSegment::Key("pets".into()),
                PathSegment::Index(1),
                PathSegment::Key("age".into())
            ]
        );
        assert!(err.message.contains("prototype expects int, found string"));
    }

    #[test]
    fn test_structural_mismatch_fails_in_both_modes() {
        for options in [NormalizeOptions::default(), NormalizeOptions::default().lenient()] {
            let err = run_with(json!({"a": {"b": 0}}), json!({"a": 5}), &options).unwrap_err();
            assert_eq!(err.path.to_string(), "a");
            assert!(err.message.contains("expected a map"));

            let err = run_with(json!({"a": [0]}), json!({"a": "x"}), &options).unwrap_err();
            assert!(err.message.contains("expected a list"));
        }
    }

    #[test]
    fn test_lenient_numeric_coercion() {
        let options = NormalizeOptions::default().lenient();

        let err = run_with(json!({"n": 0}), json!({"n": "123.45"}), &options).unwrap_err();
        assert_eq!(err.path.to_string(), "n");

        let result = run_with(json!({"n": 0}), json!({"n": 123.9}), &options).unwrap();
        assert_eq!(result.to_json(), json!({"n": 123}));

        let result = run_with(json!({"x": 0.0}), json!({"x": "123.45"}), &options).unwrap();
        assert_eq!(result.to_json(), json!({"x": 123.45}));
    }

    #[test]
    fn test_float_leaf_accepts_ints_strictly() {
        let result = run(json!({"x": 0.5}), json!({"x": 2})).unwrap();
        assert_eq!(result, Value::from(json!({"x": 2.0})));
    }

    #[test]
    fn test_pass_through_keeps_subtree() {
        let options = NormalizeOptions::default().with_pass_through_path("blob");
        let input = json!({"id": 1, "blob": {"x": [1, 2, {"y": 3}]}});

        let result = run_with(json!({"id": 0, "blob": {}}), input.clone(), &options).unwrap();
        assert_eq!(result.to_json(), input);
    }

    #[test]
    fn test_pass_through_path_ignores_list_steps() {
        let options = NormalizeOptions::default().with_pass_through_path("items.payload");
        let input = json!({"items": [{"payload": "raw"}, {"payload": {"k": [1]}}]});

        let result = run_with(json!({"items": [{"payload": {}}]}), input.clone(), &options).unwrap();
        assert_eq!(result.to_json(), input);
    }

    #[test]
    fn test_unsupported_prototype_leaf() {
        let err = run(json!({"x": null}), json!({"x": 1})).unwrap_err();
        assert_eq!(err.path.to_string(), "x");
        assert_eq!(err.message, "prototype data type not supported: null");

        let options = NormalizeOptions::default().with_pass_through_path("x");
        let result = run_with(json!({"x": null}), json!({"x": 1}), &options).unwrap();
        assert_eq!(result.to_json(), json!({"x": 1}));
    }

    #[test]
    fn test_empty_prototype_list() {
        assert_eq!(run(json!({"l": []}), json!({"l": []})).unwrap().to_json(), json!({"l": []}));

        let err = run(json!({"l": []}), json!({"l": [1]})).unwrap_err();
        assert!(err.message.contains("no element template"));
    }

    #[test]
    fn test_date_leaves() {
        let prototype = json!({"born": "2000-01-01", "seen": "2000-01-01T00:00:00Z"});
        let input = json!({"born": "1987-06-05", "seen": "2023-03-04T05:06:07+01:00"});

        for options in [NormalizeOptions::default(), NormalizeOptions::default().lenient()] {
            let result = run_with(prototype.clone(), input.clone(), &options).unwrap();
            assert_eq!(
                result.to_json(),
                json!({"born": "1987-06-05", "seen": "2023-03-04T05:06:07+01:00"})
            );
            assert!(matches!(result.as_map().unwrap()["born"], Value::Date(_)));
            assert!(matches!(result.as_map().unwrap()["seen"], Value::DateTime(_)));
        }

        let err = run(prototype, json!({"born": "05/06/1987"})).unwrap_err();
        assert_eq!(err.path.to_string(), "born");
        assert!(err.message.contains("prototype expects date, found string"));
    }

    #[test]
    fn test_type_converter_only_runs_when_lenient() {
        let options = NormalizeOptions::default()
            .with_type_converter(|_, value, _| match value {
                Value::String(s) => Ok(Value::String(s.trim_end_matches(" PLN").to_string())),
                other => Ok(other.clone()),
            });
        let err = run_with(json!({"price": 0.0}), json!({"price": "10.5 PLN"}), &options).unwrap_err();
        assert!(err.message.contains("type mismatch"));

        let options = options.lenient();
        let result = run_with(json!({"price": 0.0}), json!({"price": "10.5 PLN"}), &options).unwrap();
        assert_eq!(result.to_json(), json!({"price": 10.5}));
    }

    #[test]
    fn test_normalize_all_prefixes_record_index() {
        let normalizer = Normalizer::from_value(&Value::from(json!({"id": 0})), NormalizeOptions::default())
            .unwrap();
        let records = vec![Value::from(json!({"id": 1})), Value::from(json!({"id": "2"}))];

        let err = normalizer.normalize_all(&records).unwrap_err();
        assert_eq!(err.path.to_string(), "[1].id");
    }

    #[test]
    fn test_output_does_not_alias_input() {
        let input = Value::from(json!({"blob": {"x": 1}}));
        let options = NormalizeOptions::default().with_pass_through_path("blob");
        let prototype = Prototype::from_json(&json!({"blob": {}})).unwrap();

        let mut out = normalize(&prototype, &input, &options).unwrap();
        out.as_map_mut().unwrap().insert("blob".into(), Value::Null);
        assert_eq!(input.to_json(), json!({"blob": {"x": 1}}));
    }
}
