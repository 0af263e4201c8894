//! Output format writers for extracted tables.

mod csv;

pub use csv::CsvWriter;
