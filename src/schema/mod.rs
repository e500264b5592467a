pub mod diff;
pub mod types;

pub use diff::{diff_headers, HeaderDiff};
pub use types::{SchemaSpec, NUMERIC_COLUMNS, REQUIRED_COLUMNS};
