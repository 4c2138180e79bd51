//! CSV reader producing typed frames

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, Trim};
use tabsynth_core::{ColumnKind, DataFrame, DataType, Field, Schema};
use tabsynth_transforms::DatasetMetadata;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::parser::{infer_data_type, parse_column};

/// Options for the CSV reader
#[derive(Debug, Clone)]
pub struct CsvReaderOptions {
    /// Delimiter character
    pub delimiter: u8,

    /// Whether to trim whitespace around cells
    pub trim: bool,

    /// Whether the first column is an index to be dropped
    pub index_col: bool,
}

impl Default for CsvReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
            index_col: false,
        }
    }
}

/// Reads a headed CSV file into a typed [`DataFrame`]
///
/// Column types come from the metadata where declared and are inferred from
/// the cells otherwise. A column with a `datetime_format` but no declared
/// type is read as a timestamp.
#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    options: CsvReaderOptions,
}

impl CsvReader {
    /// Create a reader
    pub fn new(options: CsvReaderOptions) -> Self {
        Self { options }
    }

    /// Get the reader options
    pub fn options(&self) -> &CsvReaderOptions {
        &self.options
    }

    /// Read and type the file at `path`
    pub fn read_path(&self, path: &Path, metadata: &DatasetMetadata) -> Result<DataFrame> {
        let frame = self.read(File::open(path)?, metadata)?;
        debug!(
            path = %path.display(),
            rows = frame.row_count(),
            columns = frame.column_count(),
            "Read CSV"
        );
        Ok(frame)
    }

    /// Read and type CSV data
    pub fn read<R: Read>(&self, reader: R, metadata: &DatasetMetadata) -> Result<DataFrame> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .trim(if self.options.trim { Trim::All } else { Trim::None })
            .from_reader(reader);

        let header = reader.headers()?.clone();
        let records = reader.records().collect::<std::result::Result<Vec<StringRecord>, _>>()?;

        let skip = usize::from(self.options.index_col);
        if header.len() <= skip {
            return Err(Error::Format("CSV has no data columns".into()));
        }

        for spec in &metadata.columns {
            if !header.iter().skip(skip).any(|name| name == spec.name) {
                warn!(column = %spec.name, "Metadata describes a column that is not in the data");
            }
        }

        let mut fields = Vec::with_capacity(header.len() - skip);
        let mut columns = Vec::with_capacity(header.len() - skip);
        for (index, name) in header.iter().enumerate().skip(skip) {
            let raw: Vec<&str> =
                records.iter().map(|record| record.get(index).unwrap_or("")).collect();

            let spec = metadata.get(name);
            let datetime_format = spec.and_then(|s| s.datetime_format.as_deref());
            let data_type = match spec.and_then(|s| s.dtype) {
                Some(declared) => declared,
                None if datetime_format.is_some() => DataType::Timestamp,
                None => infer_data_type(&raw),
            };
            let kind: ColumnKind =
                spec.and_then(|s| s.kind).unwrap_or_else(|| data_type.default_kind());

            let column = parse_column(name, &raw, data_type, datetime_format)?;
            fields.push(Field::with_kind(name, data_type, kind, column.has_nulls()));
            columns.push(column);
        }

        Ok(DataFrame::new(Arc::new(Schema::new(fields)), columns)?)
    }
}
