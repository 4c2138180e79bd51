//! Identity transformer for columns that are passed through unchanged

use serde::{Deserialize, Serialize};
use tabsynth_core::transform::single_column;
use tabsynth_core::{Column, DataFrame, Result, Transformer, Value};

/// Passes a column through untouched
///
/// Round trips are exact. On revert, rows flagged by a missingness column
/// are replaced with the missing value placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullTransformer {
    column: String,
}

impl NullTransformer {
    /// Create a pass-through for `column`
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
        }
    }

    /// Name of the column this transformer handles
    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Transformer for NullTransformer {
    fn name(&self) -> &'static str {
        "NullTransformer"
    }

    fn apply(&self, data: &DataFrame, _missingness: Option<&Column>) -> Result<DataFrame> {
        let column = single_column(self.name(), data)?;
        DataFrame::from_columns(vec![column.with_name(&self.column)])
    }

    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        let column = single_column(self.name(), data)?;
        let restored = match missingness {
            Some(mask) => column.with_missing(mask, missing_value)?,
            None => column.clone(),
        };
        DataFrame::from_columns(vec![restored.with_name(&self.column)])
    }
}
