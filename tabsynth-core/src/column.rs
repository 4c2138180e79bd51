//! Column implementation for storing typed, nullable vectors of data

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DataType;

/// A single typed value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer value
    Int64(i64),
    /// 64-bit floating point value
    Float64(f64),
    /// UTF-8 string value
    String(String),
    /// Milliseconds since the UNIX epoch
    Timestamp(i64),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::String(_) => DataType::String,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }
}

// Floats compare by bit pattern so values can key a category table.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) | (Value::Timestamp(a), Value::Timestamp(b)) => {
                a == b
            }
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Boolean(v) => v.hash(state),
            Value::Int64(v) | Value::Timestamp(v) => v.hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int64(v) | Value::Timestamp(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

/// Storage for a column's cells; `None` marks a missing value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    /// Boolean cells
    Boolean(Vec<Option<bool>>),
    /// Integer cells
    Int64(Vec<Option<i64>>),
    /// Floating point cells
    Float64(Vec<Option<f64>>),
    /// String cells
    String(Vec<Option<String>>),
    /// Timestamp cells (milliseconds since the UNIX epoch)
    Timestamp(Vec<Option<i64>>),
}

impl ColumnData {
    /// Get the data type of this storage
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::String(_) => DataType::String,
            ColumnData::Timestamp(_) => DataType::Timestamp,
        }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Int64(v) | ColumnData::Timestamp(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::String(v) => v.len(),
        }
    }

    /// Check if there are no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named column of data with a specific type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Name of the column
    name: String,

    /// Cell values
    data: ColumnData,
}

impl Column {
    /// Create a new column with the given name and data
    pub fn new(name: &str, data: ColumnData) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }

    /// Create a boolean column
    pub fn boolean(name: &str, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    /// Create an integer column
    pub fn int64(name: &str, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Int64(values))
    }

    /// Create a floating point column
    pub fn float64(name: &str, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float64(values))
    }

    /// Create a string column
    pub fn string(name: &str, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::String(values))
    }

    /// Create a timestamp column
    pub fn timestamp(name: &str, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Timestamp(values))
    }

    /// Build a column of the given type from loosely typed values
    pub fn from_values(
        name: &str,
        data_type: DataType,
        values: Vec<Option<Value>>,
    ) -> Result<Self> {
        fn cast<T>(
            name: &str,
            values: Vec<Option<Value>>,
            extract: impl Fn(Value) -> Option<T>,
        ) -> Result<Vec<Option<T>>> {
            values
                .into_iter()
                .map(|value| match value {
                    None => Ok(None),
                    Some(v) => {
                        let shown = v.to_string();
                        extract(v).map(Some).ok_or_else(|| {
                            Error::TypeMismatch(format!(
                                "value '{shown}' does not fit column '{name}'"
                            ))
                        })
                    }
                })
                .collect()
        }

        let data = match data_type {
            DataType::Boolean => ColumnData::Boolean(cast(name, values, |v| match v {
                Value::Boolean(b) => Some(b),
                _ => None,
            })?),
            DataType::Int64 => ColumnData::Int64(cast(name, values, |v| match v {
                Value::Int64(i) => Some(i),
                _ => None,
            })?),
            DataType::Float64 => ColumnData::Float64(cast(name, values, |v| match v {
                Value::Float64(x) => Some(x),
                #[allow(clippy::cast_precision_loss)]
                Value::Int64(i) => Some(i as f64),
                _ => None,
            })?),
            DataType::String => ColumnData::String(cast(name, values, |v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })?),
            DataType::Timestamp => ColumnData::Timestamp(cast(name, values, |v| match v {
                Value::Timestamp(t) => Some(t),
                _ => None,
            })?),
        };

        Ok(Self::new(name, data))
    }

    /// Get the name of this column
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the data type of this column
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Get the underlying cell storage
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Get the length of this column (number of values)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if this column is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a copy of this column under a different name
    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: self.data.clone(),
        }
    }

    /// Check if a specific value is null
    pub fn is_null(&self, index: usize) -> bool {
        match &self.data {
            ColumnData::Boolean(v) => v.get(index).is_some_and(Option::is_none),
            ColumnData::Int64(v) | ColumnData::Timestamp(v) => {
                v.get(index).is_some_and(Option::is_none)
            }
            ColumnData::Float64(v) => v.get(index).is_some_and(Option::is_none),
            ColumnData::String(v) => v.get(index).is_some_and(Option::is_none),
        }
    }

    /// Get the number of null values in this column
    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_null(i)).count()
    }

    /// Check if this column has any null values
    pub fn has_nulls(&self) -> bool {
        (0..self.len()).any(|i| self.is_null(i))
    }

    /// Get the value at `index`, `None` when null or out of bounds
    pub fn value(&self, index: usize) -> Option<Value> {
        match &self.data {
            ColumnData::Boolean(v) => v.get(index).copied().flatten().map(Value::Boolean),
            ColumnData::Int64(v) => v.get(index).copied().flatten().map(Value::Int64),
            ColumnData::Float64(v) => v.get(index).copied().flatten().map(Value::Float64),
            ColumnData::String(v) => v.get(index).cloned().flatten().map(Value::String),
            ColumnData::Timestamp(v) => v.get(index).copied().flatten().map(Value::Timestamp),
        }
    }

    /// All values in order
    pub fn values(&self) -> Vec<Option<Value>> {
        (0..self.len()).map(|i| self.value(i)).collect()
    }

    /// Numeric view of the column; timestamps and booleans map onto the real line
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> Result<Vec<Option<f64>>> {
        match &self.data {
            ColumnData::Float64(v) => Ok(v.clone()),
            ColumnData::Int64(v) | ColumnData::Timestamp(v) => {
                Ok(v.iter().map(|x| x.map(|i| i as f64)).collect())
            }
            ColumnData::Boolean(v) => {
                Ok(v.iter().map(|x| x.map(|b| f64::from(u8::from(b)))).collect())
            }
            ColumnData::String(_) => Err(Error::TypeMismatch(format!(
                "column '{}' of type String has no numeric view",
                self.name
            ))),
        }
    }

    /// Build a boolean indicator column, true where this column is null
    pub fn missingness(&self, name: &str) -> Self {
        Self::boolean(name, (0..self.len()).map(|i| Some(self.is_null(i))).collect())
    }

    /// Replace every cell flagged by `mask` with `placeholder`, or null when none is given
    pub fn with_missing(&self, mask: &Column, placeholder: Option<&Value>) -> Result<Self> {
        let flags = mask.as_mask()?;
        if flags.len() != self.len() {
            return Err(Error::InvalidArgument(format!(
                "missingness column '{}' has {} rows, column '{}' has {}",
                mask.name(),
                flags.len(),
                self.name,
                self.len()
            )));
        }

        let mut values = self.values();
        for (value, &missing) in values.iter_mut().zip(&flags) {
            if missing {
                *value = placeholder.cloned();
            }
        }

        Self::from_values(&self.name, self.data_type(), values)
    }

    /// Interpret this column as a row mask; nulls count as unset
    pub fn as_mask(&self) -> Result<Vec<bool>> {
        match &self.data {
            ColumnData::Boolean(v) => Ok(v.iter().map(|b| b.unwrap_or(false)).collect()),
            ColumnData::Float64(v) => Ok(v.iter().map(|x| x.is_some_and(|x| x >= 0.5)).collect()),
            ColumnData::Int64(v) => Ok(v.iter().map(|x| x.is_some_and(|x| x != 0)).collect()),
            other => Err(Error::TypeMismatch(format!(
                "column '{}' of type {} cannot be used as a mask",
                self.name,
                other.data_type()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_missingness_mask_restores_nulls(
            values in prop::collection::vec(prop::option::of(any::<i64>()), 0..64)
        ) {
            let column = Column::int64("age", values.clone());
            let mask = column.missingness("age_missing");
            let filled = Column::int64(
                "age",
                values.iter().map(|v| Some(v.unwrap_or(0))).collect(),
            );

            prop_assert_eq!(filled.with_missing(&mask, None).unwrap(), column);
        }
    }

    #[test]
    fn test_missingness_indicator() {
        let column = Column::float64("bmi", vec![Some(21.0), None, Some(30.5), None]);

        assert_eq!(column.null_count(), 2);
        let indicator = column.missingness("bmi_missing");
        assert_eq!(indicator.name(), "bmi_missing");
        assert_eq!(
            indicator.as_mask().unwrap(),
            vec![false, true, false, true]
        );
    }

    #[test]
    fn test_with_missing_uses_placeholder() {
        let column = Column::int64("age", vec![Some(40), Some(0), Some(52)]);
        let mask = Column::boolean("age_missing", vec![Some(false), Some(true), Some(false)]);

        let nulled = column.with_missing(&mask, None).unwrap();
        assert_eq!(nulled.values(), vec![Some(Value::Int64(40)), None, Some(Value::Int64(52))]);

        let filled = column.with_missing(&mask, Some(&Value::Int64(-1))).unwrap();
        assert_eq!(filled.value(1), Some(Value::Int64(-1)));
    }

    #[test]
    fn test_from_values_rejects_wrong_type() {
        let err = Column::from_values("x", DataType::Int64, vec![Some(Value::String("a".into()))]);
        assert!(matches!(err, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_value_equality_for_floats_is_bitwise() {
        assert_eq!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_ne!(Value::Float64(0.0), Value::Float64(-0.0));
        assert_ne!(Value::Int64(1), Value::Timestamp(1));
    }
}
