//! Canonical form-field models and the schema normalizer.
//!
//! Backends describe forms in two shapes: explicit field records, or a
//! JSON-Schema `properties` map. [`normalize`] folds either into one ordered
//! list of [`FieldModel`]s that renderers and the submission pipeline share.

mod field;
mod normalize;

pub use field::{FieldConfig, FieldKind, FieldModel};
pub use normalize::normalize;
