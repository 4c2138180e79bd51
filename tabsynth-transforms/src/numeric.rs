//! Standardizing transformers for continuous and datetime columns
//!
//! Both encode one source column as a single `Float64` column of the same
//! name holding `(x - mean) / std`. Rows flagged by a missingness column are
//! encoded as `0.0`, the standardized mean, so downstream models never see a
//! null in an augmented column.
//!
//! Tolerance: `Int64` and `Timestamp` sources round back to the exact value
//! on revert as long as they fit the 53-bit mantissa of an `f64`; fitting
//! on larger magnitudes logs a warning. `Float64`
//! sources come back within `1e-9` relative to the larger of the value and
//! the column mean.

use serde::{Deserialize, Serialize};
use tabsynth_core::transform::single_column;
use tabsynth_core::{Column, ColumnData, DataFrame, DataType, Error, Result, Transformer, Value};
use tracing::warn;

/// Largest magnitude below which every integer is exact in an `f64`
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Fitted location and scale of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    mean: f64,
    std: f64,
}

impl Standardizer {
    const IDENTITY: Self = Self { mean: 0.0, std: 1.0 };

    /// Fit on the present, finite values
    ///
    /// Uses the population standard deviation, accumulated one value at a
    /// time so that large magnitudes do not overflow a running sum. A column
    /// with no spread gets a scale of 1. A column with no usable values, or
    /// whose moments still overflow, is left unscaled (mean 0, scale 1).
    pub fn fit(values: &[Option<f64>]) -> Self {
        let mut count = 0.0;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for &x in values.iter().flatten().filter(|x| x.is_finite()) {
            count += 1.0;
            let delta = x - mean;
            mean += delta / count;
            m2 += delta * (x - mean);
        }

        let std = if count > 0.0 { (m2 / count).sqrt() } else { 0.0 };
        if !mean.is_finite() || !std.is_finite() {
            return Self::IDENTITY;
        }

        Self {
            mean,
            std: if std > 0.0 { std } else { 1.0 },
        }
    }

    /// Mean of the fitted values
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation used as the scale
    pub fn std(&self) -> f64 {
        self.std
    }

    /// Standardize one value
    pub fn encode(&self, x: f64) -> f64 {
        (x - self.mean) / self.std
    }

    /// Undo [`encode`](Self::encode)
    pub fn decode(&self, z: f64) -> f64 {
        z * self.std + self.mean
    }
}

/// Numeric column of a known source type, encoded through a [`Standardizer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Standardized {
    column: String,
    source_type: DataType,
    standardizer: Standardizer,
}

impl Standardized {
    fn fit(column: &Column) -> Result<Self> {
        let values = column.to_f64()?;
        if let Some(largest) = inexact_magnitude(column.data_type(), &values) {
            warn!(
                column = column.name(),
                largest,
                "Integer values beyond 2^53 will not revert exactly"
            );
        }

        Ok(Self {
            column: column.name().to_string(),
            source_type: column.data_type(),
            standardizer: Standardizer::fit(&values),
        })
    }

    fn apply(
        &self,
        transformer: &str,
        data: &DataFrame,
        missingness: Option<&Column>,
    ) -> Result<DataFrame> {
        let column = single_column(transformer, data)?;
        if column.data_type() != self.source_type {
            return Err(Error::TypeMismatch(format!(
                "{transformer} for '{}' was fitted on {}, got {}",
                self.column,
                self.source_type,
                column.data_type()
            )));
        }

        let flags = flags_for(column, missingness)?;
        let encoded = column
            .to_f64()?
            .into_iter()
            .zip(flags)
            .map(|(value, missing)| {
                if missing {
                    Some(0.0)
                } else {
                    value.map(|x| self.standardizer.encode(x))
                }
            })
            .collect();

        DataFrame::from_columns(vec![Column::float64(&self.column, encoded)])
    }

    #[allow(clippy::cast_possible_truncation)]
    fn revert(
        &self,
        transformer: &str,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        let column = single_column(transformer, data)?;
        let decoded = column
            .to_f64()?
            .into_iter()
            .map(|z| z.map(|z| self.standardizer.decode(z)));

        let rounded =
            |decoded: Option<f64>| decoded.filter(|x| x.is_finite()).map(|x| x.round() as i64);
        let data = match self.source_type {
            DataType::Float64 => ColumnData::Float64(decoded.collect()),
            DataType::Int64 => ColumnData::Int64(decoded.map(rounded).collect()),
            DataType::Timestamp => ColumnData::Timestamp(decoded.map(rounded).collect()),
            other => {
                return Err(Error::TypeMismatch(format!(
                    "{transformer} cannot restore a {other} column"
                )))
            }
        };

        let mut restored = Column::new(&self.column, data);
        if let Some(mask) = missingness {
            restored = restored.with_missing(mask, missing_value)?;
        }
        DataFrame::from_columns(vec![restored])
    }
}

/// Largest magnitude of an integer-valued column if it is past the exact `f64` range
fn inexact_magnitude(source_type: DataType, values: &[Option<f64>]) -> Option<f64> {
    if !matches!(source_type, DataType::Int64 | DataType::Timestamp) {
        return None;
    }
    let largest = values.iter().flatten().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    (largest > MAX_EXACT_INTEGER).then_some(largest)
}

/// Row flags from an optional missingness column, all false when absent
fn flags_for(column: &Column, missingness: Option<&Column>) -> Result<Vec<bool>> {
    match missingness {
        Some(mask) => {
            let flags = mask.as_mask()?;
            if flags.len() == column.len() {
                Ok(flags)
            } else {
                Err(Error::InvalidArgument(format!(
                    "missingness column '{}' has {} rows, column '{}' has {}",
                    mask.name(),
                    flags.len(),
                    column.name(),
                    column.len()
                )))
            }
        }
        None => Ok(vec![false; column.len()]),
    }
}

/// Standardizes an `Int64` or `Float64` column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousTransformer {
    inner: Standardized,
}

impl ContinuousTransformer {
    /// Fit on a numeric column
    pub fn fit(column: &Column) -> Result<Self> {
        if !column.data_type().is_numeric() {
            return Err(Error::TypeMismatch(format!(
                "continuous transformer needs a numeric column, '{}' is {}",
                column.name(),
                column.data_type()
            )));
        }
        Ok(Self {
            inner: Standardized::fit(column)?,
        })
    }

    /// Name of the column this transformer handles
    pub fn column(&self) -> &str {
        &self.inner.column
    }

    /// The fitted standardizer
    pub fn standardizer(&self) -> &Standardizer {
        &self.inner.standardizer
    }
}

impl Transformer for ContinuousTransformer {
    fn name(&self) -> &'static str {
        "ContinuousTransformer"
    }

    fn apply(&self, data: &DataFrame, missingness: Option<&Column>) -> Result<DataFrame> {
        self.inner.apply(self.name(), data, missingness)
    }

    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        self.inner.revert(self.name(), data, missingness, missing_value)
    }
}

/// Standardizes a `Timestamp` column on its millisecond values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimeTransformer {
    inner: Standardized,
}

impl DatetimeTransformer {
    /// Fit on a timestamp column
    pub fn fit(column: &Column) -> Result<Self> {
        if column.data_type() != DataType::Timestamp {
            return Err(Error::TypeMismatch(format!(
                "datetime transformer needs a timestamp column, '{}' is {}",
                column.name(),
                column.data_type()
            )));
        }
        Ok(Self {
            inner: Standardized::fit(column)?,
        })
    }

    /// Name of the column this transformer handles
    pub fn column(&self) -> &str {
        &self.inner.column
    }
}

impl Transformer for DatetimeTransformer {
    fn name(&self) -> &'static str {
        "DatetimeTransformer"
    }

    fn apply(&self, data: &DataFrame, missingness: Option<&Column>) -> Result<DataFrame> {
        self.inner.apply(self.name(), data, missingness)
    }

    fn revert(
        &self,
        data: &DataFrame,
        missingness: Option<&Column>,
        missing_value: Option<&Value>,
    ) -> Result<DataFrame> {
        self.inner.revert(self.name(), data, missingness, missing_value)
    }
}
