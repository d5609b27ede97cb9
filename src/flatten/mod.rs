//! Nested-list flattening - unroll lists of records into flat rows
//!
//! Rows are meant for columnar storage: nested maps are inlined with dotted
//! column names and each list named in the unroll path multiplies its parent
//! record into one row per element (a cross join).

pub mod flattener;
pub mod types;
pub mod writer;

pub use flattener::{flatten, Flattener};
pub use types::{FlatRow, FlattenError, FlattenOptions};
pub use writer::RowWriter;
