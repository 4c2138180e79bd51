//! Per-column metadata describing how a dataset is typed and transformed
//!
//! The metadata is plain serde data so it can be written to and read from the
//! YAML file that sits next to a dataset.

use std::fmt;

use serde::{Deserialize, Serialize};
use tabsynth_core::{ColumnKind, DataType, Schema};

/// Which transformer a column should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformerKind {
    /// Leave the column as it is
    Null,
    /// Standardize numeric values
    Continuous,
    /// Standardize timestamps
    Datetime,
    /// One indicator column per category
    OneHot,
}

impl fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformerKind::Null => "null",
            TransformerKind::Continuous => "continuous",
            TransformerKind::Datetime => "datetime",
            TransformerKind::OneHot => "one_hot",
        };
        write!(f, "{name}")
    }
}

/// How missing values in a column are carried through the transformation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingnessStrategy {
    /// Missing values stay missing in the transformed column
    #[default]
    None,
    /// A `<column>_missing` indicator column records which values were absent
    Augment,
}

impl MissingnessStrategy {
    /// Name of the indicator column for `column`, if this strategy creates one
    pub fn indicator_name(&self, column: &str) -> Option<String> {
        match self {
            MissingnessStrategy::None => None,
            MissingnessStrategy::Augment => Some(format!("{column}_missing")),
        }
    }
}

/// Declared properties of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,

    /// Physical type; inferred from the data when absent
    #[serde(default)]
    pub dtype: Option<DataType>,

    /// Semantic kind; follows from the physical type when absent
    #[serde(default)]
    pub kind: Option<ColumnKind>,

    /// Explicit transformer; the registry default for the kind when absent
    #[serde(default)]
    pub transformer: Option<TransformerKind>,

    /// Missingness handling
    #[serde(default)]
    pub missingness: MissingnessStrategy,

    /// chrono format string used to parse raw timestamps
    #[serde(default)]
    pub datetime_format: Option<String>,
}

impl ColumnSpec {
    /// A spec with nothing declared beyond the name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dtype: None,
            kind: None,
            transformer: None,
            missingness: MissingnessStrategy::None,
            datetime_format: None,
        }
    }

    /// Set the physical type
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Set the semantic kind
    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the transformer
    pub fn with_transformer(mut self, transformer: TransformerKind) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Set the missingness strategy
    pub fn with_missingness(mut self, missingness: MissingnessStrategy) -> Self {
        self.missingness = missingness;
        self
    }

    /// Set the timestamp parse format
    pub fn with_datetime_format(mut self, format: &str) -> Self {
        self.datetime_format = Some(format.to_string());
        self
    }
}

/// Ordered column specs for a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Column specs in declared order
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl DatasetMetadata {
    /// Create metadata from column specs
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Get the spec for a column
    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Complete this metadata against a typed schema
    ///
    /// Declared specs keep their settings; types and kinds left open are
    /// filled from the schema, and columns the metadata does not mention are
    /// appended in schema order.
    pub fn completed_for(&self, schema: &Schema) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                let mut spec = self
                    .get(field.name())
                    .cloned()
                    .unwrap_or_else(|| ColumnSpec::new(field.name()));
                spec.dtype.get_or_insert(field.data_type());
                spec.kind.get_or_insert(field.kind());
                spec
            })
            .collect();

        Self { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabsynth_core::Field;

    #[test]
    fn test_indicator_name() {
        assert_eq!(MissingnessStrategy::None.indicator_name("bmi"), None);
        assert_eq!(
            MissingnessStrategy::Augment.indicator_name("bmi").as_deref(),
            Some("bmi_missing")
        );
    }

    #[test]
    fn test_completed_for_fills_open_settings() {
        let metadata = DatasetMetadata::new(vec![ColumnSpec::new("code")
            .with_kind(ColumnKind::Categorical)
            .with_missingness(MissingnessStrategy::Augment)]);
        let schema = Schema::new(vec![
            Field::new("age", DataType::Int64, false),
            Field::new("code", DataType::Int64, true),
        ]);

        let completed = metadata.completed_for(&schema);
        assert_eq!(completed.columns.len(), 2);
        assert_eq!(completed.columns[0].name, "age");
        assert_eq!(completed.columns[0].kind, Some(ColumnKind::Continuous));

        let code = completed.get("code").unwrap();
        assert_eq!(code.kind, Some(ColumnKind::Categorical));
        assert_eq!(code.dtype, Some(DataType::Int64));
        assert_eq!(code.missingness, MissingnessStrategy::Augment);
    }
}
