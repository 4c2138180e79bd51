//! The reversible transformer contract and its single-column adapter

use serde::{Deserialize, Serialize};

use crate::column::{Column, Value};
use crate::error::{Error, Result};
use crate::frame::DataFrame;

/// A reversible encoding of tabular data
///
/// Implementations never mutate their input and are deterministic for a
/// given configuration. For every frame `x` accepted by [`apply`],
/// `revert(apply(x))` must reproduce `x` under the semantic equality of the
/// encoded columns; numeric tolerances are documented per implementation.
///
/// [`apply`]: Transformer::apply
pub trait Transformer: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Encode `data`
    ///
    /// `missingness` flags rows whose original value was absent, letting the
    /// encoding treat them separately from present values.
    fn apply(&self, data: &DataFrame, missingness: Option<&Column>) -> Result<DataFrame>;

    /// Decode `data` back to the pre-transform representation
    ///
    /// Rows flagged by `missingness` are restored as `missing_value`, or as
    /// nulls when no placeholder is given.
    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame>;
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&self, data: &DataFrame, missingness: Option<&Column>) -> Result<DataFrame> {
        (**self).apply(data, missingness)
    }

    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        (**self).revert(data, missingness, missing_value)
    }
}

/// Adapts a frame-level transformer to operate on a single column
///
/// Calls are delegated verbatim, so wrapped and unwrapped transformers share
/// one capability surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerWrapper<T> {
    /// The transformer doing the work
    wrapped: T,
}

impl<T: Transformer> TransformerWrapper<T> {
    /// Wrap a transformer
    pub fn new(wrapped: T) -> Self {
        Self { wrapped }
    }

    /// Get the wrapped transformer
    pub fn inner(&self) -> &T {
        &self.wrapped
    }

    /// Consume the wrapper and return the wrapped transformer
    pub fn into_inner(self) -> T {
        self.wrapped
    }

    /// Encode one column
    pub fn apply_column(&self, column: &Column, missingness: Option<&Column>) -> Result<DataFrame> {
        let frame = DataFrame::from_columns(vec![column.clone()])?;
        self.wrapped.apply(&frame, missingness)
    }

    /// Decode the encoded representation of one column back into that column
    pub fn revert_column(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<Column> {
        let reverted = self.wrapped.revert(data, missingness, missing_value)?;
        let mut columns = reverted.into_columns();
        if columns.len() != 1 {
            return Err(Error::TransformationError(format!(
                "{} reverted to {} columns, expected exactly one",
                self.wrapped.name(),
                columns.len()
            )));
        }
        Ok(columns.remove(0))
    }
}

impl<T: Transformer> Transformer for TransformerWrapper<T> {
    fn name(&self) -> &'static str {
        self.wrapped.name()
    }

    fn apply(&self, data: &DataFrame, missingness: Option<&Column>) -> Result<DataFrame> {
        self.wrapped.apply(data, missingness)
    }

    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        self.wrapped.revert(data, missingness, missing_value)
    }
}

/// The only column of a frame handed to a single-column transformer
pub fn single_column<'a>(transformer: &str, data: &'a DataFrame) -> Result<&'a Column> {
    match data.columns() {
        [column] => Ok(column),
        columns => Err(Error::TransformationError(format!(
            "{transformer} expects a single column, got {}",
            columns.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Negates integers; reverting restores flagged rows
    struct Negate;

    impl Transformer for Negate {
        fn name(&self) -> &'static str {
            "Negate"
        }

        fn apply(&self, data: &DataFrame, _missingness: Option<&Column>) -> Result<DataFrame> {
            let column = single_column(self.name(), data)?;
            let values = column
                .values()
                .into_iter()
                .map(|v| match v {
                    Some(Value::Int64(i)) => Some(-i),
                    _ => None,
                })
                .collect();
            DataFrame::from_columns(vec![Column::int64(column.name(), values)])
        }

        fn revert(
            &self,
            data: &DataFrame,
            missingness: Option<&Column>,
            missing_value: Option<&Value>,
        ) -> Result<DataFrame> {
            let restored = self.apply(data, None)?;
            match missingness {
                Some(mask) => {
                    let column = single_column(self.name(), &restored)?;
                    DataFrame::from_columns(vec![column.with_missing(mask, missing_value)?])
                }
                None => Ok(restored),
            }
        }
    }

    #[test]
    fn test_wrapper_round_trips_a_column() {
        let wrapper = TransformerWrapper::new(Negate);
        let column = Column::int64("x", vec![Some(3), Some(-7)]);

        let encoded = wrapper.apply_column(&column, None).unwrap();
        assert_eq!(encoded.column(0).unwrap().value(0), Some(Value::Int64(-3)));

        let restored = wrapper.revert_column(&encoded, None, None).unwrap();
        assert_eq!(restored, column);
    }

    #[test]
    fn test_wrapper_delegates_missing_value() {
        let wrapper = TransformerWrapper::new(Negate);
        let column = Column::int64("x", vec![Some(1), Some(2)]);
        let mask = Column::boolean("x_missing", vec![Some(true), Some(false)]);

        let encoded = wrapper.apply_column(&column, Some(&mask)).unwrap();
        let restored = wrapper
            .revert_column(&encoded, Some(&mask), Some(&Value::Int64(0)))
            .unwrap();
        assert_eq!(restored.values(), vec![Some(Value::Int64(0)), Some(Value::Int64(2))]);
        assert_eq!(wrapper.name(), "Negate");
    }

    #[test]
    fn test_single_column_rejects_wider_frames() {
        let frame = DataFrame::from_columns(vec![
            Column::int64("a", vec![Some(1)]),
            Column::int64("b", vec![Some(1)]),
        ])
        .unwrap();
        assert!(single_column("Negate", &frame).is_err());
    }
}
