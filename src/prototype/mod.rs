//! Prototype-driven normalization
//!
//! A prototype is an example of the desired shape, typically lifted from an
//! API's docs. Normalizing an input against it:
//!
//! - adds every declared field that is missing (as `null`)
//! - drops undeclared fields, or captures them as key/value pairs when the
//!   prototype map carries the freestyle marker (an empty-string key)
//! - checks (strict) or coerces (lenient) every leaf to the prototype's type
//! - copies configured pass-through subtrees verbatim

pub mod coerce;
pub mod error;
pub mod normalizer;
pub mod types;

pub use error::{FieldPath, NormalizeError, PathSegment};
pub use normalizer::{normalize, normalize_with_prototype, Normalizer};
pub use types::{NormalizeOptions, Prototype, ScalarKind, TypeConverter};
