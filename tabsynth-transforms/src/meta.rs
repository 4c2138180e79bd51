//! Whole-dataset reversible encoding
//!
//! A [`MetaTransformer`] is fitted once on the typed data, persisted, and
//! loaded unchanged by every later stage that needs to move between the
//! typed and the transformed representation.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabsynth_core::{
    Column, DataFrame, Error, Field, Result, Schema, Transformer, TransformerWrapper,
};
use tracing::{debug, info, warn};

use crate::metadata::{ColumnSpec, DatasetMetadata, TransformerKind};
use crate::registry::{AnyTransformer, TransformerRegistry};

/// Options controlling how transformers are assigned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTransformerConfig {
    /// Permit pass-through assignments, whether declared or used as a fallback
    pub allow_null_transformers: bool,
}

/// The transformer fitted for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerAssignment {
    column: String,
    transformer: TransformerWrapper<AnyTransformer>,
    missingness_column: Option<String>,
    output_columns: Vec<String>,
}

impl TransformerAssignment {
    /// Source column name
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The fitted transformer
    pub fn transformer(&self) -> &AnyTransformer {
        self.transformer.inner()
    }

    /// Kind of the fitted transformer
    pub fn kind(&self) -> TransformerKind {
        self.transformer.inner().kind()
    }

    /// Name of the missingness indicator column, if the column is augmented
    pub fn missingness_column(&self) -> Option<&str> {
        self.missingness_column.as_deref()
    }

    /// Encoded column names, not counting the indicator
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }
}

/// Column-wise reversible encoder for an entire dataset
///
/// Deserializing checks the same invariants as fitting, so a loaded
/// artifact whose assignments do not line up with its schema is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MetaTransformerParts")]
pub struct MetaTransformer {
    schema: Arc<Schema>,
    metadata: DatasetMetadata,
    config: MetaTransformerConfig,
    assignments: Vec<TransformerAssignment>,
}

/// Field-for-field mirror of [`MetaTransformer`] before validation
#[derive(Deserialize)]
struct MetaTransformerParts {
    schema: Arc<Schema>,
    metadata: DatasetMetadata,
    config: MetaTransformerConfig,
    assignments: Vec<TransformerAssignment>,
}

impl TryFrom<MetaTransformerParts> for MetaTransformer {
    type Error = Error;

    fn try_from(parts: MetaTransformerParts) -> Result<Self> {
        let meta = Self {
            schema: parts.schema,
            metadata: parts.metadata,
            config: parts.config,
            assignments: parts.assignments,
        };
        meta.validate()?;
        Ok(meta)
    }
}

impl MetaTransformer {
    /// Fit on typed data with the default registry
    pub fn fit(
        typed: &DataFrame,
        metadata: &DatasetMetadata,
        config: MetaTransformerConfig,
    ) -> Result<Self> {
        Self::fit_with_registry(typed, metadata, config, &TransformerRegistry::default())
    }

    /// Fit on typed data, choosing defaults from `registry`
    pub fn fit_with_registry(
        typed: &DataFrame,
        metadata: &DatasetMetadata,
        config: MetaTransformerConfig,
        registry: &TransformerRegistry,
    ) -> Result<Self> {
        let metadata = metadata.completed_for(typed.schema());

        let mut assignments = Vec::with_capacity(typed.column_count());
        for column in typed.columns() {
            let spec = metadata
                .get(column.name())
                .cloned()
                .unwrap_or_else(|| ColumnSpec::new(column.name()));
            let transformer = assign(registry, column, &spec, config)?;

            debug!(
                column = column.name(),
                transformer = transformer.name(),
                missingness = ?spec.missingness,
                "Assigned transformer"
            );

            assignments.push(TransformerAssignment {
                column: column.name().to_string(),
                output_columns: transformer.output_columns(),
                missingness_column: spec.missingness.indicator_name(column.name()),
                transformer: TransformerWrapper::new(transformer),
            });
        }

        let fitted = Self {
            schema: typed.schema().clone(),
            metadata,
            config,
            assignments,
        };
        fitted.validate()?;

        info!(
            columns = fitted.assignments.len(),
            outputs = fitted.transformed_columns().len(),
            "Fitted metatransformer"
        );
        Ok(fitted)
    }

    /// Schema of the typed data this was fitted on
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Column metadata, completed against the typed schema
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Assignment options used at fit time
    pub fn config(&self) -> MetaTransformerConfig {
        self.config
    }

    /// Assignments in column order
    pub fn assignments(&self) -> &[TransformerAssignment] {
        &self.assignments
    }

    /// Get the assignment for a column
    pub fn assignment(&self, column: &str) -> Option<&TransformerAssignment> {
        self.assignments.iter().find(|a| a.column == column)
    }

    /// Column names of the transformed representation, in order
    pub fn transformed_columns(&self) -> Vec<String> {
        self.assignments
            .iter()
            .flat_map(|a| a.output_columns.iter().cloned().chain(a.missingness_column.clone()))
            .collect()
    }

    /// Encode typed data
    ///
    /// The input must hold exactly the fitted columns with their fitted
    /// types; order does not matter. Each column's encoding is followed by
    /// its missingness indicator when the column is augmented.
    pub fn apply(&self, typed: &DataFrame) -> Result<DataFrame> {
        self.check_columns(typed)?;

        let mut parts = Vec::with_capacity(self.assignments.len());
        for (assignment, field) in self.assignments.iter().zip(self.schema.fields()) {
            let column = typed.column_by_name(&assignment.column)?;
            check_type(field, column)?;

            let mask = assignment
                .missingness_column
                .as_deref()
                .map(|name| column.missingness(name));
            parts.push(assignment.transformer.apply_column(column, mask.as_ref())?);
            if let Some(mask) = mask {
                parts.push(DataFrame::from_columns(vec![mask])?);
            }
        }

        let transformed = DataFrame::concat(parts)?;
        debug!(
            rows = transformed.row_count(),
            columns = transformed.column_count(),
            "Applied metatransformer"
        );
        Ok(transformed)
    }

    /// Decode transformed data back to the typed representation
    ///
    /// Every encoded column and indicator must be present; extra columns are
    /// ignored. The result has the fitted schema.
    pub fn revert(&self, transformed: &DataFrame) -> Result<DataFrame> {
        let expected = self.transformed_columns();
        let missing: Vec<&str> = expected
            .iter()
            .map(String::as_str)
            .filter(|name| !transformed.schema().contains(name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::SchemaMismatch(format!(
                "transformed data lacks columns [{}]",
                missing.join(", ")
            )));
        }

        let known: HashSet<&str> = expected.iter().map(String::as_str).collect();
        let extra: Vec<&str> = transformed
            .column_names()
            .into_iter()
            .filter(|name| !known.contains(name))
            .collect();
        if !extra.is_empty() {
            warn!(columns = ?extra, "Ignoring columns unknown to the metatransformer");
        }

        let mut columns = Vec::with_capacity(self.assignments.len());
        for (assignment, field) in self.assignments.iter().zip(self.schema.fields()) {
            let names: Vec<&str> = assignment.output_columns.iter().map(String::as_str).collect();
            let encoded = transformed.select(&names)?;
            let mask = match assignment.missingness_column.as_deref() {
                Some(name) => Some(transformed.column_by_name(name)?),
                None => None,
            };

            let restored = assignment.transformer.revert_column(&encoded, mask, None)?;
            check_type(field, &restored)?;
            columns.push(restored.with_name(field.name()));
        }

        DataFrame::new(self.schema.clone(), columns)
    }

    fn check_columns(&self, typed: &DataFrame) -> Result<()> {
        let missing: Vec<&str> = self
            .schema
            .names()
            .filter(|name| !typed.schema().contains(name))
            .collect();
        let unexpected: Vec<&str> = typed
            .column_names()
            .into_iter()
            .filter(|name| !self.schema.contains(name))
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }
        Err(Error::SchemaMismatch(format!(
            "metatransformer was fitted on [{}]; missing [{}], unexpected [{}]",
            self.schema.names().collect::<Vec<_>>().join(", "),
            missing.join(", "),
            unexpected.join(", ")
        )))
    }

    /// Check that there is one assignment per schema field, in schema order,
    /// and that no transformed column name is produced twice
    pub fn validate(&self) -> Result<()> {
        if self.assignments.len() != self.schema.len() {
            return Err(Error::SchemaMismatch(format!(
                "{} assignments for {} fitted columns",
                self.assignments.len(),
                self.schema.len()
            )));
        }
        for (assignment, field) in self.assignments.iter().zip(self.schema.fields()) {
            if assignment.column != field.name() {
                return Err(Error::SchemaMismatch(format!(
                    "assignment for '{}' is where '{}' should be",
                    assignment.column,
                    field.name()
                )));
            }
        }

        let mut seen = HashSet::new();
        for name in self.transformed_columns() {
            if !seen.insert(name.clone()) {
                return Err(Error::SchemaMismatch(format!(
                    "transformed column '{name}' would be produced more than once"
                )));
            }
        }
        Ok(())
    }
}

fn check_type(field: &Field, column: &Column) -> Result<()> {
    if field.data_type() == column.data_type() {
        return Ok(());
    }
    Err(Error::SchemaMismatch(format!(
        "column '{}' should be {}, found {}",
        field.name(),
        field.data_type(),
        column.data_type()
    )))
}

/// Pick and fit the transformer for one column
fn assign(
    registry: &TransformerRegistry,
    column: &Column,
    spec: &ColumnSpec,
    config: MetaTransformerConfig,
) -> Result<AnyTransformer> {
    let dtype = column.data_type();
    let kind = spec.kind.unwrap_or_else(|| dtype.default_kind());
    let unassignable = |reason: String| Error::UnassignableColumn {
        column: column.name().to_string(),
        reason,
    };

    let fallback = |reason: String| {
        if config.allow_null_transformers {
            warn!(column = column.name(), %reason, "Falling back to a null transformer");
            Ok(TransformerKind::Null)
        } else {
            Err(unassignable(reason))
        }
    };

    let chosen = match spec.transformer {
        Some(explicit) if !TransformerRegistry::is_compatible(explicit, dtype) => {
            return Err(unassignable(format!(
                "{explicit} transformer cannot encode {dtype} values"
            )));
        }
        Some(TransformerKind::Null) if !config.allow_null_transformers => {
            return Err(unassignable("null transformers are not allowed".into()));
        }
        Some(explicit) => explicit,
        None => match registry.default_for(kind) {
            Some(TransformerKind::Null) => fallback(format!(
                "the registered default for {kind} columns is a null transformer"
            ))?,
            Some(default) if TransformerRegistry::is_compatible(default, dtype) => default,
            Some(default) => fallback(format!(
                "the {default} transformer for {kind} columns cannot encode {dtype} values"
            ))?,
            None => fallback(format!("no transformer is registered for {kind} columns"))?,
        },
    };

    match registry.build(chosen, column) {
        Err(Error::UnassignableColumn { reason, .. }) if config.allow_null_transformers => {
            registry.build(fallback(reason)?, column)
        }
        built => built,
    }
}
