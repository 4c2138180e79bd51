//! Reversible column transformers for tabsynth
//!
//! Each column of a typed dataset is assigned a transformer according to its
//! [`ColumnSpec`]; the [`MetaTransformer`] applies and reverts all of them
//! together and is the artifact handed from the dataloader to every later
//! stage.

#![warn(missing_docs)]

pub mod categorical;
pub mod meta;
pub mod metadata;
pub mod null;
pub mod numeric;
pub mod registry;

pub use categorical::OneHotTransformer;
pub use meta::{MetaTransformer, MetaTransformerConfig, TransformerAssignment};
pub use metadata::{ColumnSpec, DatasetMetadata, MissingnessStrategy, TransformerKind};
pub use null::NullTransformer;
pub use numeric::{ContinuousTransformer, DatetimeTransformer, Standardizer};
pub use registry::{AnyTransformer, TransformerRegistry};
