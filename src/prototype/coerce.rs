//! Scalar leaf rules: what strict mode accepts and how lenient mode coerces

use crate::formats::parse_iso8601;
use crate::prototype::error::{FieldPath, NormalizeError};
use crate::prototype::types::{ScalarKind, TypeConverter};
use crate::value::Value;
use chrono::NaiveTime;

/// Value to emit when `input` already satisfies `kind`, `None` otherwise.
///
/// Ints widen into float leaves and datetimes narrow into date leaves. JSON
/// carries dates as text, so an ISO-8601 string satisfies a date or datetime
/// leaf and is emitted parsed.
pub(crate) fn accept(kind: ScalarKind, input: &Value) -> Option<Value> {
    match (kind, input) {
        (ScalarKind::String, Value::String(_))
        | (ScalarKind::Bool, Value::Bool(_))
        | (ScalarKind::Int, Value::Int(_))
        | (ScalarKind::Float, Value::Float(_)) => Some(input.clone()),
        (ScalarKind::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
        // DateTime first: a datetime also satisfies a date leaf, never the reverse.
        (ScalarKind::DateTime, Value::DateTime(_)) => Some(input.clone()),
        (ScalarKind::Date, Value::DateTime(dt)) => Some(Value::Date(dt.date_naive())),
        (ScalarKind::Date, Value::Date(_)) => Some(input.clone()),
        (ScalarKind::Date | ScalarKind::DateTime, Value::String(s)) => {
            accept(kind, &parse_iso8601(s)?)
        }
        _ => None,
    }
}

/// Lenient coercion of a mismatched leaf
pub(crate) fn coerce(
    kind: ScalarKind,
    input: &Value,
    path: &FieldPath,
    converter: Option<&TypeConverter>,
) -> Result<Value, NormalizeError> {
    match kind {
        ScalarKind::String => Ok(Value::String(input.to_text())),
        ScalarKind::Bool => Ok(parse_bool(input)),
        ScalarKind::Int | ScalarKind::Float | ScalarKind::Date | ScalarKind::DateTime => {
            if is_blank(input) {
                return Ok(Value::Null);
            }
            let converted = match converter {
                Some(convert) => convert(kind, input, path).map_err(|e| {
                    NormalizeError::new(path, format!("type converter failed: {e:#}"))
                })?,
                None => input.clone(),
            };
            cast(kind, converted).map_err(|message| NormalizeError::new(path, message))
        }
    }
}

/// Blank strings, and empty lists or maps, carry no value for a typed leaf
fn is_blank(input: &Value) -> bool {
    match input {
        Value::String(s) => s.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    }
}

fn parse_bool(input: &Value) -> Value {
    let text = match input {
        Value::String(s) => s.trim().to_lowercase(),
        Value::Int(_) | Value::Float(_) => input.to_text(),
        _ => return Value::Null,
    };
    match text.as_str() {
        "1" | "true" | "yes" => Value::Bool(true),
        "0" | "false" | "no" => Value::Bool(false),
        _ => Value::Null,
    }
}

fn cast(kind: ScalarKind, value: Value) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if let Some(accepted) = accept(kind, &value) {
        return Ok(accepted);
    }

    match (kind, &value) {
        (ScalarKind::Int, Value::Float(f)) => {
            if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(Value::Int(f.trunc() as i64))
            } else {
                Err(format!("can't cast float {f} to int"))
            }
        }
        (ScalarKind::Int, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| format!("can't parse int {s:?}: {e}")),
        (ScalarKind::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (ScalarKind::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("can't parse float {s:?}: {e}"))
            .and_then(|f| {
                if f.is_finite() {
                    Ok(Value::Float(f))
                } else {
                    Err(format!("can't parse float {s:?}: not a finite number"))
                }
            }),
        (ScalarKind::Float, Value::Bool(b)) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        (ScalarKind::Date | ScalarKind::DateTime, Value::String(s)) => match parse_iso8601(s) {
            Some(parsed) => cast(kind, parsed),
            None => Err(format!("can't parse {kind} {s:?}: not ISO-8601")),
        },
        (ScalarKind::DateTime, Value::Date(d)) => Ok(Value::DateTime(
            d.and_time(NaiveTime::MIN).and_utc().fixed_offset(),
        )),
        _ => Err(format!("can't convert {} to {kind}", value.kind())),
    }
}
