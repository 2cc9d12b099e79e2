//! Main module for css-grammar library functionality

pub mod compat;
pub mod data_types;
pub mod dataset;
pub mod reconcile;
pub mod syntax;
pub mod testing;
pub mod typing;
pub mod validation;

pub use compat::{CompatCategory, CompatibilityProvider, CompatibilityRecord, StaticCompatibility};
pub use data_types::{
    create_property_data_type_resolver, has_type, resolve_data_types, DataTypeResolver,
    DepthLimit, GrammarError, TypeSet,
};
pub use dataset::{
    DatasetError, Layers, LayersLoader, PatchData, PatchEntry, RawProperty, RawSyntax, SourceData,
};
pub use reconcile::{CssData, PatchReport, PatchStatus, PropertyDefinition, SyntaxDefinition};
pub use syntax::{parse, SyntaxError, SyntaxErrorKind, SyntaxNode};
pub use typing::typing;
pub use validation::{assess_patch, validate_patch, validate_patch_with_depth, PatchVerdict};
