//! In-memory table of named, equally long columns

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema};

/// A collection of columns representing a table in columnar format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    /// Schema describing the data
    schema: Arc<Schema>,

    /// Columns in this frame
    columns: Vec<Column>,

    /// Number of rows in this frame
    row_count: usize,
}

impl DataFrame {
    /// Create a new frame with the given schema and columns
    pub fn new(schema: Arc<Schema>, columns: Vec<Column>) -> Result<Self> {
        if columns.len() != schema.fields().len() {
            return Err(Error::SchemaMismatch(format!(
                "{} columns supplied for a schema of {} fields",
                columns.len(),
                schema.fields().len()
            )));
        }

        // Verify columns match schema
        for (field, column) in schema.fields().iter().zip(&columns) {
            if column.name() != field.name() {
                return Err(Error::SchemaMismatch(format!(
                    "Column name mismatch: expected '{}', got '{}'",
                    field.name(),
                    column.name()
                )));
            }

            if column.data_type() != field.data_type() {
                return Err(Error::SchemaMismatch(format!(
                    "Column type mismatch for '{}': expected {}, got {}",
                    field.name(),
                    field.data_type(),
                    column.data_type()
                )));
            }
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(Error::SchemaMismatch(format!(
                    "Duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        // Verify all columns have the same length
        let row_count = columns.first().map_or(0, Column::len);
        if let Some(column) = columns.iter().find(|c| c.len() != row_count) {
            return Err(Error::SchemaMismatch(format!(
                "Column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                row_count
            )));
        }

        Ok(Self {
            schema,
            columns,
            row_count,
        })
    }

    /// Create a frame from columns, deriving each field from the column type
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let fields = columns
            .iter()
            .map(|c| Field::new(c.name(), c.data_type(), c.has_nulls()))
            .collect();
        Self::new(Arc::new(Schema::new(fields)), columns)
    }

    /// Get the schema of this frame
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Get the number of rows in this frame
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Get the number of columns in this frame
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if this frame has no rows
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Get a reference to a column by index
    pub fn column(&self, index: usize) -> Result<&Column> {
        self.columns.get(index).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "column index {index} out of bounds for {} columns",
                self.columns.len()
            ))
        })
    }

    /// Get a reference to a column by name
    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        let index = self.schema.index_of(name)?;
        self.column(index)
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Consume the frame and return its columns
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Create a frame holding only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let schema = self.schema.project_by_names(names)?;
        let columns = names
            .iter()
            .map(|&name| self.column_by_name(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Self::new(Arc::new(schema), columns)
    }

    /// Place the columns of several frames side by side
    pub fn concat(frames: Vec<DataFrame>) -> Result<Self> {
        let mut fields = Vec::new();
        let mut columns = Vec::new();
        for frame in frames {
            fields.extend(frame.schema.fields().iter().cloned());
            columns.extend(frame.columns);
        }
        Self::new(Arc::new(Schema::new(fields)), columns)
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DataFrame: {} rows x {} columns",
            self.row_count,
            self.columns.len()
        )?;
        for field in self.schema.fields() {
            writeln!(f, "  {field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn sample() -> DataFrame {
        DataFrame::from_columns(vec![
            Column::int64("id", vec![Some(1), Some(2), Some(3)]),
            Column::string("name", vec![Some("a".into()), None, Some("c".into())]),
            Column::float64("value", vec![Some(1.5), Some(2.5), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_validates_lengths_and_names() {
        let err = DataFrame::from_columns(vec![
            Column::int64("a", vec![Some(1)]),
            Column::int64("b", vec![Some(1), Some(2)]),
        ]);
        assert!(matches!(err, Err(Error::SchemaMismatch(_))));

        let err = DataFrame::from_columns(vec![
            Column::int64("a", vec![Some(1)]),
            Column::int64("a", vec![Some(2)]),
        ]);
        assert!(matches!(err, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_new_rejects_type_disagreement() {
        let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Float64, false)]));
        let err = DataFrame::new(schema, vec![Column::int64("a", vec![Some(1)])]);
        assert!(matches!(err, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_schema_without_columns_is_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int64, true)]));
        assert!(matches!(DataFrame::new(schema, Vec::new()), Err(Error::SchemaMismatch(_))));

        let empty = DataFrame::new(Arc::new(Schema::new(Vec::new())), Vec::new()).unwrap();
        assert_eq!(empty.row_count(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_select_and_concat() {
        let frame = sample();
        let left = frame.select(&["value", "id"]).unwrap();
        assert_eq!(left.column_names(), vec!["value", "id"]);

        let right = frame.select(&["name"]).unwrap();
        let joined = DataFrame::concat(vec![left, right]).unwrap();
        assert_eq!(joined.column_names(), vec!["value", "id", "name"]);
        assert_eq!(joined.row_count(), 3);
        assert!(frame.select(&["missing"]).is_err());
    }
}
