//! Dataset reconciliation
//!
//! [CssData] merges the baseline, supplemental and patch layers into the
//! effective property and syntax tables. For a single name the effective syntax is
//!
//!     patch syntax  >  supplemental syntax  >  baseline syntax
//!
//! Where the supplemental layer (SVG definitions) has a syntax, the generated
//! baseline is not consulted.
//!
//! Whenever a patch replaces an existing syntax it is checked with
//! [assess_patch]: the patch must keep every data type the source reaches and add
//! at least one. The check is advisory. A failing patch is reported with
//! `tracing::error!` and applied anyway. Each name is checked at most once per
//! [CssData], however many tasks ask for it concurrently.
//!
//! The full tables are built on first access and shared from then on.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, warn};

use crate::css::compat::{CompatCategory, CompatibilityProvider};
use crate::css::data_types::{DepthLimit, GrammarError};
use crate::css::dataset::{Layers, PatchEntry, RawProperty};
use crate::css::validation::{assess_patch, PatchVerdict};

/// A property as it appears in the effective table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    pub shorthand: bool,
    /// Source metadata overlaid with the patch metadata
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// A syntax as it appears in the effective table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
}

/// What checking a patch against its source found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
    /// No compatibility record, nothing to check against
    Unchecked,
    Valid(PatchVerdict),
    Invalid(PatchVerdict),
    /// A grammar involved could not be parsed
    Failed(GrammarError),
}

impl PatchStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, PatchStatus::Valid(_))
    }
}

/// One entry of [CssData::check_patches]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub category: CompatCategory,
    pub name: String,
    pub status: PatchStatus,
}

/// Per-name single-flight registry of patch checks
#[derive(Default)]
struct CheckedPatches {
    cells: Mutex<BTreeMap<String, Arc<OnceCell<PatchStatus>>>>,
}

impl CheckedPatches {
    async fn cell(&self, name: &str) -> Arc<OnceCell<PatchStatus>> {
        let mut cells = self.cells.lock().await;
        cells.entry(name.to_string()).or_default().clone()
    }

    async fn snapshot(&self) -> BTreeMap<String, PatchStatus> {
        let cells = self.cells.lock().await;
        cells
            .iter()
            .filter_map(|(name, cell)| cell.get().map(|status| (name.clone(), status.clone())))
            .collect()
    }
}

/// The effective CSS grammar tables
pub struct CssData<P> {
    layers: Layers,
    compat: P,
    max_depth: DepthLimit,
    properties: OnceCell<BTreeMap<String, PropertyDefinition>>,
    syntaxes: OnceCell<BTreeMap<String, SyntaxDefinition>>,
    checked_properties: CheckedPatches,
    checked_syntaxes: CheckedPatches,
}

impl<P: CompatibilityProvider> CssData<P> {
    pub fn new(layers: Layers, compat: P) -> Self {
        Self {
            layers,
            compat,
            max_depth: DepthLimit::Unbounded,
            properties: OnceCell::new(),
            syntaxes: OnceCell::new(),
            checked_properties: CheckedPatches::default(),
            checked_syntaxes: CheckedPatches::default(),
        }
    }

    /// Limit how deep patch checks dissolve data types
    pub fn with_depth_limit(mut self, max_depth: DepthLimit) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn compat(&self) -> &P {
        &self.compat
    }

    pub fn depth_limit(&self) -> DepthLimit {
        self.max_depth
    }

    pub fn is_property(&self, name: &str) -> bool {
        self.layers.baseline.properties.contains_key(name)
            || self.layers.supplemental.properties.contains_key(name)
            || self
                .layers
                .patches
                .properties
                .get(name)
                .and_then(PatchEntry::syntax)
                .is_some()
    }

    pub fn is_syntax(&self, name: &str) -> bool {
        self.layers.baseline.syntaxes.contains_key(name)
            || self.layers.supplemental.syntaxes.contains_key(name)
            || self
                .layers
                .patches
                .syntaxes
                .get(name)
                .and_then(PatchEntry::syntax)
                .is_some()
    }

    /// Syntax of the property before patching
    pub fn source_property_syntax(&self, name: &str) -> Option<&str> {
        fn from<'a>(properties: &'a BTreeMap<String, RawProperty>, name: &str) -> Option<&'a str> {
            properties.get(name).and_then(|p| p.syntax.as_deref())
        }
        from(&self.layers.supplemental.properties, name)
            .or_else(|| from(&self.layers.baseline.properties, name))
    }

    /// Syntax of the data type before patching
    pub fn source_syntax(&self, name: &str) -> Option<&str> {
        self.layers
            .supplemental
            .syntaxes
            .get(name)
            .and_then(|s| s.syntax.as_deref())
            .or_else(|| {
                self.layers
                    .baseline
                    .syntaxes
                    .get(name)
                    .and_then(|s| s.syntax.as_deref())
            })
    }

    /// Effective syntax of a property
    pub async fn get_property_syntax(&self, name: &str) -> Option<String> {
        let patch = self.layers.patches.properties.get(name).and_then(PatchEntry::syntax);
        let source = self.source_property_syntax(name);

        match (patch, source) {
            (Some(patch), Some(source)) => {
                self.check_once(CompatCategory::Property, name, source, patch).await;
                Some(patch.to_string())
            }
            (Some(patch), None) => Some(patch.to_string()),
            (None, Some(source)) => Some(source.to_string()),
            (None, None) => {
                warn!(property = name, "syntax for property is missing");
                None
            }
        }
    }

    /// Effective syntax of a data type
    pub async fn get_syntax(&self, name: &str) -> Option<String> {
        let patch = self.layers.patches.syntaxes.get(name).and_then(PatchEntry::syntax);
        let source = self.source_syntax(name);

        match (patch, source) {
            (Some(patch), Some(source)) => {
                self.check_once(CompatCategory::Type, name, source, patch).await;
                Some(patch.to_string())
            }
            (Some(patch), None) => Some(patch.to_string()),
            (None, Some(source)) => Some(source.to_string()),
            (None, None) => {
                warn!(syntax = name, "syntax is missing");
                None
            }
        }
    }

    /// Every property with its effective syntax, built once
    pub async fn get_properties(&self) -> &BTreeMap<String, PropertyDefinition> {
        self.properties
            .get_or_init(|| async { self.build_properties().await })
            .await
    }

    /// Every data type with its effective syntax, built once
    pub async fn get_syntaxes(&self) -> &BTreeMap<String, SyntaxDefinition> {
        self.syntaxes
            .get_or_init(|| async { self.build_syntaxes().await })
            .await
    }

    /// Properties whose patch has been checked so far
    pub async fn validated_properties(&self) -> BTreeMap<String, PatchStatus> {
        self.checked_properties.snapshot().await
    }

    /// Data types whose patch has been checked so far
    pub async fn validated_syntaxes(&self) -> BTreeMap<String, PatchStatus> {
        self.checked_syntaxes.snapshot().await
    }

    /// Check every patch that replaces an existing syntax
    pub async fn check_patches(&self) -> Vec<PatchReport> {
        let mut reports = Vec::new();
        for (name, patch) in &self.layers.patches.properties {
            let (Some(patch), Some(source)) = (patch.syntax(), self.source_property_syntax(name))
            else {
                continue;
            };
            let status = self.check_once(CompatCategory::Property, name, source, patch).await;
            reports.push(PatchReport {
                category: CompatCategory::Property,
                name: name.clone(),
                status,
            });
        }
        for (name, patch) in &self.layers.patches.syntaxes {
            let (Some(patch), Some(source)) = (patch.syntax(), self.source_syntax(name)) else {
                continue;
            };
            let status = self.check_once(CompatCategory::Type, name, source, patch).await;
            reports.push(PatchReport {
                category: CompatCategory::Type,
                name: name.clone(),
                status,
            });
        }
        reports
    }

    async fn check_once(
        &self,
        category: CompatCategory,
        name: &str,
        source: &str,
        patch: &str,
    ) -> PatchStatus {
        let registry = match category {
            CompatCategory::Property => &self.checked_properties,
            CompatCategory::Type => &self.checked_syntaxes,
        };
        let cell = registry.cell(name).await;
        cell.get_or_init(|| self.check(category, name, source, patch))
            .await
            .clone()
    }

    async fn check(
        &self,
        category: CompatCategory,
        name: &str,
        source: &str,
        patch: &str,
    ) -> PatchStatus {
        let Some(record) = self.compat.lookup(category, name).await else {
            debug!(name, ?category, "no compatibility data, patch not checked");
            return PatchStatus::Unchecked;
        };

        match assess_patch(&self.compat, &record, source, patch, self.max_depth).await {
            Ok(verdict) if verdict.is_valid() => {
                debug!(name, ?category, %verdict, "patch checked");
                PatchStatus::Valid(verdict)
            }
            Ok(verdict) => {
                error!(
                    name,
                    ?category,
                    %verdict,
                    "patch did not add anything to the source or was incomplete compared to it"
                );
                PatchStatus::Invalid(verdict)
            }
            Err(err) => {
                error!(name, ?category, error = %err, "patch could not be checked");
                PatchStatus::Failed(err)
            }
        }
    }

    /// Baseline entry overlaid with the supplemental one
    fn source_property(&self, name: &str) -> RawProperty {
        let mut source = self
            .layers
            .baseline
            .properties
            .get(name)
            .cloned()
            .unwrap_or_default();
        if let Some(supplemental) = self.layers.supplemental.properties.get(name) {
            if supplemental.syntax.is_some() {
                source.syntax = supplemental.syntax.clone();
            }
            source.metadata.extend(supplemental.metadata.clone());
        }
        source
    }

    async fn build_properties(&self) -> BTreeMap<String, PropertyDefinition> {
        let patches = &self.layers.patches.properties;
        let mut properties = BTreeMap::new();

        let names: BTreeSet<&String> = self
            .layers
            .baseline
            .properties
            .keys()
            .chain(self.layers.supplemental.properties.keys())
            .collect();

        for name in names {
            let source = self.source_property(name);
            let patch = patches.get(name);
            let mut metadata = source.metadata.clone();
            if let Some(patch) = patch {
                metadata.extend(patch.metadata.clone());
            }
            let definition = PropertyDefinition {
                name: name.clone(),
                syntax: self.get_property_syntax(name).await,
                shorthand: patch
                    .and_then(|patch| patch.shorthand)
                    .unwrap_or_else(|| source.computed_is_list()),
                metadata,
            };
            properties.insert(name.clone(), definition);
        }

        for (name, patch) in patches {
            if properties.contains_key(name) {
                continue;
            }
            let definition = PropertyDefinition {
                name: name.clone(),
                syntax: patch.syntax.clone(),
                shorthand: patch.shorthand.unwrap_or(false),
                metadata: patch.metadata.clone(),
            };
            properties.insert(name.clone(), definition);
        }

        debug!(count = properties.len(), "built property table");
        properties
    }

    async fn build_syntaxes(&self) -> BTreeMap<String, SyntaxDefinition> {
        let names: BTreeSet<&String> = self
            .layers
            .supplemental
            .syntaxes
            .keys()
            .chain(self.layers.baseline.syntaxes.keys())
            .collect();

        let mut syntaxes = BTreeMap::new();
        for name in names {
            let definition = SyntaxDefinition {
                name: name.clone(),
                syntax: self.get_syntax(name).await,
            };
            syntaxes.insert(name.clone(), definition);
        }

        for (name, patch) in &self.layers.patches.syntaxes {
            if syntaxes.contains_key(name) {
                continue;
            }
            let definition = SyntaxDefinition {
                name: name.clone(),
                syntax: patch.syntax.clone(),
            };
            syntaxes.insert(name.clone(), definition);
        }

        debug!(count = syntaxes.len(), "built syntax table");
        syntaxes
    }
}
