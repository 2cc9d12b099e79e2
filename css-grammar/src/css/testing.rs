//! Testing utilities
//!
//!     Grammars are easy to get slightly wrong when made up on the spot, and a
//!     reconciler test built on a hand-typed dataset tends to test the typo rather
//!     than the merge. Tests that need layers or compatibility data should read
//!     the curated fixtures under `tests/fixtures` through [Fixtures] instead of
//!     assembling ad-hoc maps:
//!
//!         - `properties.json` / `syntaxes.json`: baseline, mdn-data shaped
//!         - `svg.json`: supplemental layer
//!         - `patches.json`: curated overrides, including one that regresses
//!         - `compat.json`: compatibility data with a per-property type record
//!
//!     ```rust,ignore
//!     use css_grammar::css::testing::{CountingProvider, Fixtures};
//!
//!     let layers = Fixtures::layers().unwrap();
//!     let compat = CountingProvider::new(Fixtures::compat().unwrap());
//!     let data = CssData::new(layers, compat);
//!     ```
//!
//!     [CountingProvider] wraps any provider and counts lookups, which is how
//!     tests observe that memoized work is not repeated.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::css::compat::{
    CompatCategory, CompatibilityProvider, CompatibilityRecord, StaticCompatibility,
};
use crate::css::dataset::{DatasetError, Layers, LayersLoader};

/// Access to the curated fixture files
pub struct Fixtures;

impl Fixtures {
    /// Directory holding the fixture files
    pub fn dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
    }

    pub fn path(file: &str) -> PathBuf {
        Self::dir().join(file)
    }

    /// Baseline, supplemental and patch layers
    pub fn layers() -> Result<Layers, DatasetError> {
        Ok(LayersLoader::new()
            .baseline_properties(Self::path("properties.json"))?
            .baseline_syntaxes(Self::path("syntaxes.json"))?
            .supplemental(Self::path("svg.json"))?
            .patches(Self::path("patches.json"))?
            .build())
    }

    /// Compatibility data from `compat.json`
    pub fn compat() -> Result<StaticCompatibility, DatasetError> {
        StaticCompatibility::from_path(Self::path("compat.json"))
    }
}

/// Provider wrapper that counts lookups
pub struct CountingProvider<P = StaticCompatibility> {
    inner: P,
    lookups: AtomicUsize,
}

impl<P> CountingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Lookups made so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P: CompatibilityProvider> CompatibilityProvider for CountingProvider<P> {
    async fn lookup(&self, category: CompatCategory, name: &str) -> Option<CompatibilityRecord> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(category, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_load() {
        let layers = Fixtures::layers().unwrap();
        assert!(layers.baseline.properties.contains_key("width"));
        assert!(layers.baseline.syntaxes.contains_key("length-percentage"));
        assert!(layers.supplemental.properties.contains_key("fill"));
        assert!(layers.patches.syntaxes.contains_key("dasharray"));

        let compat = Fixtures::compat().unwrap();
        assert!(compat.properties["width"].types.contains_key("calc-size()"));
    }

    #[tokio::test]
    async fn test_counting_provider() {
        let provider = CountingProvider::new(StaticCompatibility::new());
        assert_eq!(provider.lookups(), 0);
        assert!(provider.lookup(CompatCategory::Type, "length").await.is_none());
        assert!(provider.lookup(CompatCategory::Property, "width").await.is_none());
        assert_eq!(provider.lookups(), 2);
    }
}
