//! Report envelopes and CSV export encoding.

pub mod report;
pub mod table;

pub use report::{Report, ReportKind, summarize};
pub use table::{CsvError, encode_csv};
