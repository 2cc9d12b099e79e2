//! Data type resolution ("dissolving")
//!
//! A grammar references data types (`<length-percentage>`) that have grammars of
//! their own. Dissolving a set of type names expands every name into the names its
//! grammar references, level by level, until nothing new turns up or the depth
//! limit is consumed. The result holds every name reached, including the ones that
//! turned out to have no grammar (terminal types).
//!
//! Termination never depends on the depth limit: a name is only ever expanded once,
//! so self-referential and mutually referential definitions end on their own.
//! A finite limit only truncates, silently, the set of names reached.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::collections::btree_set;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::css::compat::{CompatCategory, CompatibilityProvider, CompatibilityRecord};
use crate::css::syntax::{parse, SyntaxError};
use crate::css::typing::typing;

/// A set of type names, ordered and without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeSet(BTreeSet<String>);

impl TypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the name was newly added
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    pub fn is_superset(&self, other: &TypeSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Names in this set that are missing from `other`
    pub fn difference<'a>(&'a self, other: &'a TypeSet) -> impl Iterator<Item = &'a String> {
        self.0.difference(&other.0)
    }
}

impl<S: Into<String>> FromIterator<S> for TypeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for TypeSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TypeSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Exact-match membership test
pub fn has_type(types: &TypeSet, name: &str) -> bool {
    types.contains(name)
}

/// How many levels of names are expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthLimit {
    /// At most this many levels; `Bounded(0)` expands nothing
    Bounded(usize),
    /// Until no new name turns up. The visited set ends cycles.
    Unbounded,
}

impl DepthLimit {
    /// Whether the level with this index (starting at 0) may be expanded
    pub fn allows(self, level: usize) -> bool {
        match self {
            DepthLimit::Bounded(max) => level < max,
            DepthLimit::Unbounded => true,
        }
    }

    /// The tighter of two limits
    pub fn min(self, other: DepthLimit) -> DepthLimit {
        match (self, other) {
            (DepthLimit::Bounded(a), DepthLimit::Bounded(b)) => DepthLimit::Bounded(a.min(b)),
            (DepthLimit::Bounded(a), DepthLimit::Unbounded)
            | (DepthLimit::Unbounded, DepthLimit::Bounded(a)) => DepthLimit::Bounded(a),
            (DepthLimit::Unbounded, DepthLimit::Unbounded) => DepthLimit::Unbounded,
        }
    }
}

impl From<Option<usize>> for DepthLimit {
    fn from(max_depth: Option<usize>) -> Self {
        max_depth.map_or(DepthLimit::Unbounded, DepthLimit::Bounded)
    }
}

impl fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthLimit::Bounded(max) => write!(f, "{}", max),
            DepthLimit::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Errors that can occur while dissolving grammars
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A grammar given by the caller is malformed
    Syntax(SyntaxError),
    /// The sub-grammar found for a data type is malformed
    DataType { name: String, error: SyntaxError },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Syntax(error) => write!(f, "Invalid grammar: {}", error),
            GrammarError::DataType { name, error } => {
                write!(f, "Invalid grammar for data type `{}`: {}", name, error)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

impl From<SyntaxError> for GrammarError {
    fn from(error: SyntaxError) -> Self {
        GrammarError::Syntax(error)
    }
}

/// Looks up the sub-grammar of a data type
#[async_trait]
pub trait DataTypeResolver: Send + Sync {
    /// The grammar of `name`, or `None` if it is terminal
    async fn resolve(&self, name: &str) -> Option<String>;

    /// Cap applied on top of the limit given to [resolve_data_types]
    fn depth_limit(&self) -> DepthLimit {
        DepthLimit::Unbounded
    }
}

/// A plain table of grammars
#[async_trait]
impl DataTypeResolver for BTreeMap<String, String> {
    async fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Dissolve `usages` into every type name they reach
pub async fn resolve_data_types<R>(
    usages: &TypeSet,
    resolver: &R,
    max_depth: DepthLimit,
) -> Result<TypeSet, GrammarError>
where
    R: DataTypeResolver + ?Sized,
{
    let max_depth = max_depth.min(resolver.depth_limit());
    let mut visited = TypeSet::new();
    let mut frontier: Vec<String> = usages.iter().cloned().collect();
    let mut level = 0;

    while !frontier.is_empty() && max_depth.allows(level) {
        let pending: Vec<String> = frontier
            .drain(..)
            .filter(|name| visited.insert(name.clone()))
            .collect();

        // Names of one level are independent, resolve them together
        let grammars = join_all(pending.iter().map(|name| resolver.resolve(name))).await;

        let mut discovered = BTreeSet::new();
        for (name, grammar) in pending.iter().zip(grammars) {
            let Some(grammar) = grammar else {
                continue;
            };
            let tree = parse(&grammar).map_err(|error| GrammarError::DataType {
                name: name.clone(),
                error,
            })?;
            for found in typing(&tree) {
                if !visited.contains(&found) {
                    discovered.insert(found);
                }
            }
        }

        tracing::trace!(
            depth = level,
            resolved = pending.len(),
            discovered = discovered.len(),
            "dissolved data type level"
        );
        frontier = discovered.into_iter().collect();
        level += 1;
    }

    Ok(visited)
}

/// Resolver bound to the compatibility context of one property or syntax
pub struct PropertyDataTypeResolver<'a, P: ?Sized> {
    provider: &'a P,
    record: &'a CompatibilityRecord,
    max_depth: DepthLimit,
}

/// Bind a resolver to `record`, falling back to `provider` for types the record
/// does not describe. `max_depth` caps every dissolution made through it.
pub fn create_property_data_type_resolver<'a, P>(
    provider: &'a P,
    record: &'a CompatibilityRecord,
    max_depth: DepthLimit,
) -> PropertyDataTypeResolver<'a, P>
where
    P: CompatibilityProvider + ?Sized,
{
    PropertyDataTypeResolver {
        provider,
        record,
        max_depth,
    }
}

#[async_trait]
impl<'a, P> DataTypeResolver for PropertyDataTypeResolver<'a, P>
where
    P: CompatibilityProvider + ?Sized,
{
    async fn resolve(&self, name: &str) -> Option<String> {
        if let Some(syntax) = self.record.types.get(name).and_then(|r| r.syntax.clone()) {
            return Some(syntax);
        }
        self.provider
            .lookup(CompatCategory::Type, name)
            .await
            .and_then(|record| record.syntax)
    }

    fn depth_limit(&self) -> DepthLimit {
        self.max_depth
    }
}
