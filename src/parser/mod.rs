//! Table location and row extraction over parsed HTML.

pub mod extract;
pub mod locator;

pub use extract::{clean_value, extract_generic_rows, extract_rows, strip_award_markers, ColumnMap};
pub use locator::{find_all_tables, find_table, LocatedTable, TableSource};
