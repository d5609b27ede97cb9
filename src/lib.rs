//! # Anneal - reshaping loosely-typed API records
//!
//! Third-party APIs hand back JSON that is nested, sparse and only roughly
//! typed. This crate turns it into two canonical forms:
//!
//! - **prototype**: a tree that matches a caller-supplied example exactly (same
//!   keys, checked or coerced types, explicit nulls, captured extra fields)
//! - **flatten**: one-level rows, obtained by cross-joining nested record lists,
//!   ready for columnar storage
//!
//! Both engines are pure functions over in-memory [`Value`] trees.
//!
//! ## Quick Start
//!
//! ### Normalizing against a prototype
//!
//! ```rust
//! use anneal::{NormalizeOptions, Prototype, Value, normalize};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let prototype = Prototype::from_json(&json!({"id": 0, "city": "", "": ""}))?;
//! let input = Value::from(json!({"id": 7, "zip": "00-950"}));
//!
//! let normalized = normalize(&prototype, &input, &NormalizeOptions::default())?;
//! assert_eq!(
//!     normalized.to_json(),
//!     json!({"id": 7, "city": null, "freestyle_attrs": [{"key": "zip", "value": "00-950"}]})
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ### Flattening nested lists
//!
//! ```rust
//! use anneal::{FlattenOptions, Value, flatten};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let records = vec![Value::from(json!({
//!     "id": 1,
//!     "pets": [{"id": 101, "toys": [{"name": "t1"}, {"name": "t2"}]}]
//! }))];
//!
//! let rows = flatten(&records, &["pets", "toys"], &FlattenOptions::default())?;
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1]["pets.toys.name"], Value::from("t2"));
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::io::{Read, Write};

pub mod flatten;
pub mod formats;
pub mod input;
pub mod path;
pub mod pipeline;
pub mod prototype;
pub mod value;

// Re-export commonly used types for convenience
pub use flatten::{flatten, FlatRow, FlattenError, FlattenOptions, Flattener, RowWriter};
pub use path::{PageError, PathAccessor};
pub use pipeline::Pipeline;
pub use prototype::{
    normalize, normalize_with_prototype, FieldPath, NormalizeError, NormalizeOptions, Normalizer,
    PathSegment, Prototype, ScalarKind, TypeConverter,
};
pub use value::{Map, Value};

/// Main entry point: run every JSON page read from `reader` through the
/// pipeline and write the resulting records as JSON Lines.
///
/// Returns the number of records written.
pub fn process_json<R: Read, W: Write>(
    reader: R,
    ndjson: bool,
    writer: &mut RowWriter<W>,
    pipeline: &Pipeline,
) -> Result<usize> {
    let before = writer.written();
    for document in input::read_documents(reader, ndjson)? {
        let records = pipeline.process_page(Value::from(document))?;
        for record in &records {
            writer.write_record(record)?;
        }
    }
    writer.flush()?;
    Ok(writer.written() - before)
}
