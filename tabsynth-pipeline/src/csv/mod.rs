//! CSV loading for raw datasets
//!
//! Raw data is a headed CSV file. Cells are typed according to the dataset
//! metadata, or inferred where the metadata is silent.

mod parser;
mod reader;

pub use parser::{infer_data_type, is_missing, parse_column, parse_timestamp, MISSING_MARKERS};
pub use reader::{CsvReader, CsvReaderOptions};
