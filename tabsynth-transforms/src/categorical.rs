//! One-hot encoding for categorical columns

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tabsynth_core::transform::single_column;
use tabsynth_core::{Column, DataFrame, DataType, Error, Result, Transformer, Value};

/// Encodes a categorical column as one `Float64` indicator column per category
///
/// Categories are learned in order of first appearance and the indicator for
/// category `i` is named `<column>_<i>`. Null and flagged rows encode as all
/// zeros. On revert each row takes the category with the largest entry, and a
/// row without any positive entry becomes null. Round trips are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotTransformer {
    column: String,
    source_type: DataType,
    categories: Vec<Value>,
}

impl OneHotTransformer {
    /// Learn the categories of `column`
    pub fn fit(column: &Column) -> Result<Self> {
        if column.data_type() == DataType::Timestamp {
            return Err(Error::TypeMismatch(format!(
                "one-hot encoding does not apply to timestamp column '{}'",
                column.name()
            )));
        }

        let mut categories = Vec::new();
        let mut seen = HashSet::new();
        for value in column.values().into_iter().flatten() {
            if seen.insert(value.clone()) {
                categories.push(value);
            }
        }

        if categories.is_empty() {
            return Err(Error::UnassignableColumn {
                column: column.name().to_string(),
                reason: "no categories observed".into(),
            });
        }

        Ok(Self {
            column: column.name().to_string(),
            source_type: column.data_type(),
            categories,
        })
    }

    /// Name of the column this transformer handles
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Learned categories, in output column order
    pub fn categories(&self) -> &[Value] {
        &self.categories
    }

    /// Names of the indicator columns produced by [`apply`](Transformer::apply)
    pub fn output_columns(&self) -> Vec<String> {
        (0..self.categories.len())
            .map(|i| format!("{}_{i}", self.column))
            .collect()
    }

    fn category_index(&self) -> HashMap<&Value, usize> {
        self.categories.iter().enumerate().map(|(i, v)| (v, i)).collect()
    }
}

impl Transformer for OneHotTransformer {
    fn name(&self) -> &'static str {
        "OneHotTransformer"
    }

    fn apply(&self, data: &DataFrame, missingness: Option<&Column>) -> Result<DataFrame> {
        let column = single_column(self.name(), data)?;
        if column.data_type() != self.source_type {
            return Err(Error::TypeMismatch(format!(
                "{} for '{}' was fitted on {}, got {}",
                self.name(),
                self.column,
                self.source_type,
                column.data_type()
            )));
        }

        let flags = match missingness {
            Some(mask) => mask.as_mask()?,
            None => vec![false; column.len()],
        };
        if flags.len() != column.len() {
            return Err(Error::InvalidArgument(format!(
                "missingness column has {} rows, column '{}' has {}",
                flags.len(),
                self.column,
                column.len()
            )));
        }

        let index = self.category_index();
        let mut indicators = vec![vec![Some(0.0); column.len()]; self.categories.len()];
        for (row, (value, missing)) in column.values().into_iter().zip(flags).enumerate() {
            let Some(value) = value.filter(|_| !missing) else {
                continue;
            };
            let category = index.get(&value).ok_or_else(|| {
                Error::TransformationError(format!(
                    "unknown category '{value}' in column '{}'",
                    self.column
                ))
            })?;
            indicators[*category][row] = Some(1.0);
        }

        let columns = self
            .output_columns()
            .iter()
            .zip(indicators)
            .map(|(name, values)| Column::float64(name, values))
            .collect();
        DataFrame::from_columns(columns)
    }

    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        let names = self.output_columns();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let encoded = data
            .select(&names)?
            .columns()
            .iter()
            .map(Column::to_f64)
            .collect::<Result<Vec<_>>>()?;

        let values = (0..data.row_count())
            .map(|row| {
                let mut best: Option<(usize, f64)> = None;
                for (i, column) in encoded.iter().enumerate() {
                    if let Some(x) = column[row] {
                        if x > 0.0 && best.map_or(true, |(_, b)| x > b) {
                            best = Some((i, x));
                        }
                    }
                }
                best.map(|(i, _)| self.categories[i].clone())
            })
            .collect();

        let mut restored = Column::from_values(&self.column, self.source_type, values)?;
        if let Some(mask) = missingness {
            restored = restored.with_missing(mask, missing_value)?;
        }
        DataFrame::from_columns(vec![restored])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Column {
        Column::string(
            "color",
            vec![
                Some("red".into()),
                Some("blue".into()),
                None,
                Some("red".into()),
            ],
        )
    }

    #[test]
    fn test_categories_in_first_appearance_order() {
        let transformer = OneHotTransformer::fit(&colors()).unwrap();
        assert_eq!(
            transformer.categories(),
            &[Value::String("red".into()), Value::String("blue".into())]
        );
        assert_eq!(transformer.output_columns(), vec!["color_0", "color_1"]);
    }

    #[test]
    fn test_round_trip_keeps_nulls() {
        let column = colors();
        let transformer = OneHotTransformer::fit(&column).unwrap();
        let frame = DataFrame::from_columns(vec![column.clone()]).unwrap();

        let encoded = transformer.apply(&frame, None).unwrap();
        assert_eq!(encoded.column_names(), vec!["color_0", "color_1"]);
        assert_eq!(encoded.column(0).unwrap().value(0), Some(Value::Float64(1.0)));
        assert_eq!(encoded.column(1).unwrap().value(2), Some(Value::Float64(0.0)));

        let reverted = transformer.revert(&encoded, None, None).unwrap();
        assert_eq!(reverted.column(0).unwrap(), &column);
    }

    #[test]
    fn test_round_trip_with_indicator() {
        let column = Column::int64("code", vec![Some(7), None, Some(3)]);
        let mask = column.missingness("code_missing");
        let transformer = OneHotTransformer::fit(&column).unwrap();
        let frame = DataFrame::from_columns(vec![column.clone()]).unwrap();

        let encoded = transformer.apply(&frame, Some(&mask)).unwrap();
        let reverted = transformer.revert(&encoded, Some(&mask), None).unwrap();
        assert_eq!(reverted.column(0).unwrap(), &column);
    }

    #[test]
    fn test_revert_takes_arg_max() {
        let transformer = OneHotTransformer::fit(&colors()).unwrap();
        let sampled = DataFrame::from_columns(vec![
            Column::float64("color_0", vec![Some(0.2), Some(0.0)]),
            Column::float64("color_1", vec![Some(0.7), Some(-0.1)]),
        ])
        .unwrap();

        let reverted = transformer.revert(&sampled, None, None).unwrap();
        assert_eq!(
            reverted.column(0).unwrap().values(),
            vec![Some(Value::String("blue".into())), None]
        );
    }

    #[test]
    fn test_unknown_category_fails() {
        let transformer = OneHotTransformer::fit(&colors()).unwrap();
        let frame =
            DataFrame::from_columns(vec![Column::string("color", vec![Some("green".into())])])
                .unwrap();
        assert!(matches!(
            transformer.apply(&frame, None),
            Err(Error::TransformationError(_))
        ));
    }

    #[test]
    fn test_all_null_column_is_unassignable() {
        let column = Column::string("empty", vec![None, None]);
        assert!(matches!(
            OneHotTransformer::fit(&column),
            Err(Error::UnassignableColumn { .. })
        ));
    }
}
