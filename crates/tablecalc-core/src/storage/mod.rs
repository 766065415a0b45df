//! Loading table snapshots from files.

pub mod csv;

pub use csv::{parse_csv, parse_csv_str};
