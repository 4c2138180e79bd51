//! Schema definition for typed tabular data

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Physical data type for column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Boolean type
    Boolean,

    /// 64-bit signed integer
    Int64,

    /// 64-bit floating point
    Float64,

    /// UTF-8 encoded string
    String,

    /// Timestamp in milliseconds since the UNIX epoch, no timezone
    Timestamp,
}

impl DataType {
    /// Check if this type is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// The semantic kind a column of this type gets when nothing else is declared
    pub fn default_kind(&self) -> ColumnKind {
        match self {
            DataType::Int64 | DataType::Float64 => ColumnKind::Continuous,
            DataType::Boolean | DataType::String => ColumnKind::Categorical,
            DataType::Timestamp => ColumnKind::Datetime,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "Boolean"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::Float64 => write!(f, "Float64"),
            DataType::String => write!(f, "String"),
            DataType::Timestamp => write!(f, "Timestamp"),
        }
    }
}

/// Semantic type of a column, used to pick its transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Discrete values drawn from a finite set
    Categorical,

    /// Real-valued measurements
    Continuous,

    /// Points in time
    Datetime,

    /// Free text or anything without a reversible encoding
    Other,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Continuous => write!(f, "continuous"),
            ColumnKind::Datetime => write!(f, "datetime"),
            ColumnKind::Other => write!(f, "other"),
        }
    }
}

/// A field in a schema, with a name, data type, semantic kind and nullability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Name of the field
    pub name: String,

    /// Data type of the field
    pub data_type: DataType,

    /// Semantic kind of the field
    pub kind: ColumnKind,

    /// Whether the field can be null
    pub nullable: bool,
}

impl Field {
    /// Create a new field whose kind follows from its data type
    pub fn new(name: &str, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            kind: data_type.default_kind(),
            nullable,
        }
    }

    /// Create a new field with an explicit semantic kind
    pub fn with_kind(name: &str, data_type: DataType, kind: ColumnKind, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            kind,
            nullable,
        }
    }

    /// Get the name of this field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the data type of this field
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Get the semantic kind of this field
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Check if this field is nullable
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}: {} [{}] (nullable)", self.name, self.data_type, self.kind)
        } else {
            write!(f, "{}: {} [{}] (non-nullable)", self.name, self.data_type, self.kind)
        }
    }
}

/// A schema describing a table's structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SchemaParts")]
pub struct Schema {
    /// Fields in this schema
    fields: Vec<Field>,

    /// Field indices by name for faster lookup
    #[serde(skip)]
    field_indices: HashMap<String, usize>,
}

/// Serialized form of a schema; lookup indices are rebuilt on load
#[derive(Deserialize)]
struct SchemaParts {
    fields: Vec<Field>,
}

impl From<SchemaParts> for Schema {
    fn from(parts: SchemaParts) -> Self {
        Schema::new(parts.fields)
    }
}

impl Schema {
    /// Create a new schema with the given fields
    pub fn new(fields: Vec<Field>) -> Self {
        let mut field_indices = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            field_indices.insert(field.name.clone(), i);
        }

        Self {
            fields,
            field_indices,
        }
    }

    /// Get all fields in this schema
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Get a field by name
    pub fn field_by_name(&self, name: &str) -> Result<&Field> {
        let index = self.index_of(name)?;
        Ok(&self.fields[index])
    }

    /// Get the index of a field by name
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.field_indices
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("Field not found: {name}")))
    }

    /// Check whether a field with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.field_indices.contains_key(name)
    }

    /// Field names in declared order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::name)
    }

    /// Get the number of fields in this schema
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if this schema is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a projection of this schema with only the specified field names
    pub fn project_by_names(&self, names: &[&str]) -> Result<Self> {
        let fields = names
            .iter()
            .map(|&name| self.field_by_name(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(fields))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schema: {} fields", self.fields.len())?;
        for field in &self.fields {
            writeln!(f, "  {field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(DataType::Int64, ColumnKind::Continuous ; "integers")]
    #[test_case(DataType::Float64, ColumnKind::Continuous ; "floats")]
    #[test_case(DataType::Boolean, ColumnKind::Categorical ; "booleans")]
    #[test_case(DataType::String, ColumnKind::Categorical ; "strings")]
    #[test_case(DataType::Timestamp, ColumnKind::Datetime ; "timestamps")]
    fn test_field_kind_defaults_from_type(data_type: DataType, expected: ColumnKind) {
        assert_eq!(Field::new("x", data_type, true).kind(), expected);
    }

    #[test]
    fn test_schema_lookup_survives_serialization() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Float64, false),
            Field::new("b", DataType::String, true),
        ]);

        let bytes = bincode::serialize(&schema).unwrap();
        let restored: Schema = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored, schema);
        assert_eq!(restored.index_of("b").unwrap(), 1);
    }

    #[test]
    fn test_project_by_names_keeps_requested_order() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Float64, false),
            Field::new("b", DataType::String, true),
            Field::new("c", DataType::Boolean, false),
        ]);

        let projected = schema.project_by_names(&["c", "a"]).unwrap();
        assert_eq!(projected.names().collect::<Vec<_>>(), vec!["c", "a"]);
        assert!(schema.project_by_names(&["z"]).is_err());
    }
}
