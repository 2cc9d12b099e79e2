//! Patch validation
//!
//! A patch replaces a source grammar. Both grammars are dissolved under the same
//! compatibility context and the resulting type sets compared:
//!
//! - nothing the source reaches may be lost (non-regression),
//! - the patch must reach at least one type the source does not (improvement).
//!
//! The verdict is advisory. Callers log a failing verdict and apply the patch anyway.

use std::fmt;

use crate::css::compat::{CompatibilityProvider, CompatibilityRecord};
use crate::css::data_types::{
    create_property_data_type_resolver, has_type, resolve_data_types, DepthLimit, GrammarError,
    TypeSet,
};
use crate::css::syntax::parse;
use crate::css::typing::typing;

/// Outcome of comparing a patch with its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchVerdict {
    /// Keeps every source type and adds these
    Improves { added: Vec<String> },
    /// Loses these source types
    Regresses { missing: Vec<String> },
    /// Reaches exactly the source types
    Redundant,
}

impl PatchVerdict {
    /// Compare the dissolved type sets of a source and its patch
    pub fn compare(source: &TypeSet, patch: &TypeSet) -> Self {
        let missing: Vec<String> = source
            .iter()
            .filter(|name| !has_type(patch, name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return PatchVerdict::Regresses { missing };
        }

        let added: Vec<String> = patch.difference(source).cloned().collect();
        if added.is_empty() {
            PatchVerdict::Redundant
        } else {
            PatchVerdict::Improves { added }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, PatchVerdict::Improves { .. })
    }
}

impl fmt::Display for PatchVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchVerdict::Improves { added } => write!(f, "adds {}", added.join(", ")),
            PatchVerdict::Regresses { missing } => write!(f, "misses {}", missing.join(", ")),
            PatchVerdict::Redundant => write!(f, "adds nothing"),
        }
    }
}

/// Dissolve source and patch with an explicit depth limit and compare them
pub async fn assess_patch<P>(
    provider: &P,
    record: &CompatibilityRecord,
    source: &str,
    patch: &str,
    max_depth: DepthLimit,
) -> Result<PatchVerdict, GrammarError>
where
    P: CompatibilityProvider + ?Sized,
{
    let source_usages = typing(&parse(source)?);
    let patch_usages = typing(&parse(patch)?);

    let resolver = create_property_data_type_resolver(provider, record, max_depth);
    let source_types = resolve_data_types(&source_usages, &resolver, max_depth).await?;
    let patch_types = resolve_data_types(&patch_usages, &resolver, max_depth).await?;

    Ok(PatchVerdict::compare(&source_types, &patch_types))
}

/// Whether `patch` keeps everything `source` reaches and adds at least one type.
/// Dissolution is unbounded; cycles end on the visited set.
pub async fn validate_patch<P>(
    provider: &P,
    record: &CompatibilityRecord,
    source: &str,
    patch: &str,
) -> Result<bool, GrammarError>
where
    P: CompatibilityProvider + ?Sized,
{
    validate_patch_with_depth(provider, record, source, patch, DepthLimit::Unbounded).await
}

/// [validate_patch] with a depth limit. A bounded dissolution is an approximation:
/// types only reachable past the limit are not compared.
pub async fn validate_patch_with_depth<P>(
    provider: &P,
    record: &CompatibilityRecord,
    source: &str,
    patch: &str,
    max_depth: DepthLimit,
) -> Result<bool, GrammarError>
where
    P: CompatibilityProvider + ?Sized,
{
    let verdict = assess_patch(provider, record, source, patch, max_depth).await?;
    Ok(verdict.is_valid())
}
