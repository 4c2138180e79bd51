//! Fitted transformer variants and the registry that selects them per column kind

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tabsynth_core::{Column, ColumnKind, DataFrame, DataType, Result, Transformer, Value};

use crate::categorical::OneHotTransformer;
use crate::metadata::TransformerKind;
use crate::null::NullTransformer;
use crate::numeric::{ContinuousTransformer, DatetimeTransformer};

/// A fitted transformer of any supported kind
///
/// This is the payload stored in a MetaTransformer assignment, so the enum
/// (and not a trait object) is what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnyTransformer {
    /// Pass-through
    Null(NullTransformer),
    /// Standardized numeric column
    Continuous(ContinuousTransformer),
    /// Standardized timestamp column
    Datetime(DatetimeTransformer),
    /// One-hot encoded categorical column
    OneHot(OneHotTransformer),
}

impl AnyTransformer {
    /// Which kind of transformer this is
    pub fn kind(&self) -> TransformerKind {
        match self {
            AnyTransformer::Null(_) => TransformerKind::Null,
            AnyTransformer::Continuous(_) => TransformerKind::Continuous,
            AnyTransformer::Datetime(_) => TransformerKind::Datetime,
            AnyTransformer::OneHot(_) => TransformerKind::OneHot,
        }
    }

    /// Names of the columns produced by `apply`, in order
    pub fn output_columns(&self) -> Vec<String> {
        match self {
            AnyTransformer::Null(t) => vec![t.column().to_string()],
            AnyTransformer::Continuous(t) => vec![t.column().to_string()],
            AnyTransformer::Datetime(t) => vec![t.column().to_string()],
            AnyTransformer::OneHot(t) => t.output_columns(),
        }
    }

    fn as_transformer(&self) -> &dyn Transformer {
        match self {
            AnyTransformer::Null(t) => t,
            AnyTransformer::Continuous(t) => t,
            AnyTransformer::Datetime(t) => t,
            AnyTransformer::OneHot(t) => t,
        }
    }
}

impl Transformer for AnyTransformer {
    fn name(&self) -> &'static str {
        self.as_transformer().name()
    }

    fn apply(&self, data: &DataFrame, missingness: Option<&Column>) -> Result<DataFrame> {
        self.as_transformer().apply(data, missingness)
    }

    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        self.as_transformer().revert(data, missingness, missing_value)
    }
}

/// Catalog of transformers keyed by column kind
#[derive(Debug, Clone)]
pub struct TransformerRegistry {
    defaults: HashMap<ColumnKind, TransformerKind>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        let defaults = HashMap::from([
            (ColumnKind::Categorical, TransformerKind::OneHot),
            (ColumnKind::Continuous, TransformerKind::Continuous),
            (ColumnKind::Datetime, TransformerKind::Datetime),
        ]);
        Self { defaults }
    }
}

impl TransformerRegistry {
    /// A registry with the standard defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the default for a kind; `None` leaves the kind without a default
    pub fn set_default(
        &mut self,
        kind: ColumnKind,
        transformer: Option<TransformerKind>,
    ) -> &mut Self {
        match transformer {
            Some(t) => self.defaults.insert(kind, t),
            None => self.defaults.remove(&kind),
        };
        self
    }

    /// The transformer used for `kind` when none is declared
    pub fn default_for(&self, kind: ColumnKind) -> Option<TransformerKind> {
        self.defaults.get(&kind).copied()
    }

    /// Whether `transformer` can encode columns of physical type `dtype`
    pub fn is_compatible(transformer: TransformerKind, dtype: DataType) -> bool {
        match transformer {
            TransformerKind::Null => true,
            TransformerKind::Continuous => dtype.is_numeric(),
            TransformerKind::Datetime => dtype == DataType::Timestamp,
            TransformerKind::OneHot => dtype != DataType::Timestamp,
        }
    }

    /// Fit a transformer of the given kind on `column`
    pub fn build(&self, transformer: TransformerKind, column: &Column) -> Result<AnyTransformer> {
        Ok(match transformer {
            TransformerKind::Null => AnyTransformer::Null(NullTransformer::new(column.name())),
            TransformerKind::Continuous => {
                AnyTransformer::Continuous(ContinuousTransformer::fit(column)?)
            }
            TransformerKind::Datetime => {
                AnyTransformer::Datetime(DatetimeTransformer::fit(column)?)
            }
            TransformerKind::OneHot => AnyTransformer::OneHot(OneHotTransformer::fit(column)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(TransformerKind::Continuous, DataType::Int64, true)]
    #[test_case(TransformerKind::Continuous, DataType::String, false)]
    #[test_case(TransformerKind::Datetime, DataType::Timestamp, true)]
    #[test_case(TransformerKind::Datetime, DataType::Float64, false)]
    #[test_case(TransformerKind::OneHot, DataType::Boolean, true)]
    #[test_case(TransformerKind::OneHot, DataType::Timestamp, false)]
    #[test_case(TransformerKind::Null, DataType::String, true)]
    fn test_compatibility(transformer: TransformerKind, dtype: DataType, expected: bool) {
        assert_eq!(TransformerRegistry::is_compatible(transformer, dtype), expected);
    }

    #[test]
    fn test_defaults() {
        let mut registry = TransformerRegistry::new();
        assert_eq!(registry.default_for(ColumnKind::Categorical), Some(TransformerKind::OneHot));
        assert_eq!(registry.default_for(ColumnKind::Other), None);

        registry.set_default(ColumnKind::Other, Some(TransformerKind::Null));
        assert_eq!(registry.default_for(ColumnKind::Other), Some(TransformerKind::Null));
    }

    #[test]
    fn test_build_dispatches_by_kind() {
        let registry = TransformerRegistry::new();
        let column = Column::boolean("smoker", vec![Some(true), Some(false)]);

        let fitted = registry.build(TransformerKind::OneHot, &column).unwrap();
        assert_eq!(fitted.kind(), TransformerKind::OneHot);
        assert_eq!(fitted.name(), "OneHotTransformer");
        assert_eq!(fitted.output_columns(), vec!["smoker_0", "smoker_1"]);

        let frame = DataFrame::from_columns(vec![column.clone()]).unwrap();
        let reverted = fitted.revert(&fitted.apply(&frame, None).unwrap(), None, None).unwrap();
        assert_eq!(reverted.column(0).unwrap(), &column);
    }
}
