//! Compatibility data
//!
//! Compatibility records are consulted for one thing only: whether a name has a
//! further sub-grammar, and what it is. A provider is asked by category
//! (property or data type) and name; an absent record means the name is unknown
//! and therefore terminal.
//!
//! [StaticCompatibility] is the in-memory provider. It is loaded from a JSON
//! document shaped as
//!
//!     { "properties": { "<name>": <record> }, "types": { "<name>": <record> } }
//!
//! where a record is `{ "syntax": "...", "types": { "<name>": <record> } }`, both
//! keys optional. It can also be derived from the dataset layers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::css::dataset::{DatasetError, Layers};

/// Which table a compatibility lookup goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompatCategory {
    Property,
    Type,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRecord {
    /// Sub-grammar of the name this record describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    /// Records for data types as they apply in the context of this record
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, CompatibilityRecord>,
}

impl CompatibilityRecord {
    pub fn with_syntax(syntax: impl Into<String>) -> Self {
        Self {
            syntax: Some(syntax.into()),
            types: BTreeMap::new(),
        }
    }
}

/// Source of compatibility records
#[async_trait]
pub trait CompatibilityProvider: Send + Sync {
    async fn lookup(&self, category: CompatCategory, name: &str) -> Option<CompatibilityRecord>;
}

#[async_trait]
impl<P: CompatibilityProvider + ?Sized> CompatibilityProvider for Arc<P> {
    async fn lookup(&self, category: CompatCategory, name: &str) -> Option<CompatibilityRecord> {
        (**self).lookup(category, name).await
    }
}

/// In-memory compatibility data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCompatibility {
    #[serde(default)]
    pub properties: BTreeMap<String, CompatibilityRecord>,
    #[serde(default)]
    pub types: BTreeMap<String, CompatibilityRecord>,
}

impl StaticCompatibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, record: CompatibilityRecord) -> Self {
        self.properties.insert(name.into(), record);
        self
    }

    pub fn with_type(mut self, name: impl Into<String>, record: CompatibilityRecord) -> Self {
        self.types.insert(name.into(), record);
        self
    }

    /// Load compatibility data from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| DatasetError::io(path, err))?;
        serde_json::from_str(&content).map_err(|err| DatasetError::json(path, err))
    }

    /// Derive compatibility data from the source layers
    ///
    /// Every baseline and supplemental syntax becomes a type record carrying its
    /// grammar, every baseline and supplemental property a property record. The
    /// supplemental layer wins where both define a name, as it does for the
    /// effective tables. Patches are not used: they are what gets validated
    /// against this data.
    pub fn from_layers(layers: &Layers) -> Self {
        let mut compat = Self::new();
        for source in [&layers.baseline, &layers.supplemental] {
            for (name, syntax) in &source.syntaxes {
                if let Some(grammar) = &syntax.syntax {
                    compat
                        .types
                        .insert(name.clone(), CompatibilityRecord::with_syntax(grammar));
                }
            }
            for (name, property) in &source.properties {
                // A record without syntax never hides one from an earlier layer
                if property.syntax.is_none() && compat.properties.contains_key(name) {
                    continue;
                }
                let record = CompatibilityRecord {
                    syntax: property.syntax.clone(),
                    types: BTreeMap::new(),
                };
                compat.properties.insert(name.clone(), record);
            }
        }
        compat
    }
}

#[async_trait]
impl CompatibilityProvider for StaticCompatibility {
    async fn lookup(&self, category: CompatCategory, name: &str) -> Option<CompatibilityRecord> {
        match category {
            CompatCategory::Property => self.properties.get(name).cloned(),
            CompatCategory::Type => self.types.get(name).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::dataset::{RawProperty, RawSyntax};

    #[tokio::test]
    async fn test_lookup_by_category() {
        let compat = StaticCompatibility::new()
            .with_property("width", CompatibilityRecord::default())
            .with_type("length-percentage", CompatibilityRecord::with_syntax("<length> | <percentage>"));

        assert!(compat.lookup(CompatCategory::Property, "width").await.is_some());
        assert!(compat.lookup(CompatCategory::Type, "width").await.is_none());
        assert_eq!(
            compat
                .lookup(CompatCategory::Type, "length-percentage")
                .await
                .and_then(|record| record.syntax),
            Some("<length> | <percentage>".to_string())
        );
    }

    #[test]
    fn test_deserialize() {
        let compat: StaticCompatibility = serde_json::from_str(
            r#"{
                "properties": { "width": { "types": { "length": { "syntax": "<number>" } } } },
                "types": { "color": { "syntax": "<rgb()> | <hex-color>" } }
            }"#,
        )
        .unwrap();
        assert_eq!(
            compat.properties["width"].types["length"].syntax.as_deref(),
            Some("<number>")
        );
        assert_eq!(
            compat.types["color"].syntax.as_deref(),
            Some("<rgb()> | <hex-color>")
        );
    }

    #[test]
    fn test_from_layers_prefers_supplemental() {
        let mut layers = Layers::default();
        layers.baseline.syntaxes.insert(
            "paint".into(),
            RawSyntax::new("none | <color>"),
        );
        layers.supplemental.syntaxes.insert(
            "paint".into(),
            RawSyntax::new("none | <color> | <url>"),
        );
        layers.supplemental.syntaxes.insert(
            "dasharray".into(),
            RawSyntax::new("[ <length> | <number> ]#"),
        );
        layers
            .baseline
            .properties
            .insert("fill".into(), RawProperty::new("<paint>"));

        let compat = StaticCompatibility::from_layers(&layers);
        assert_eq!(
            compat.types["paint"].syntax.as_deref(),
            Some("none | <color> | <url>")
        );
        assert!(compat.types.contains_key("dasharray"));
        assert_eq!(compat.properties["fill"].syntax.as_deref(), Some("<paint>"));
    }

    #[test]
    fn test_from_layers_keeps_baseline_property_syntax() {
        let mut layers = Layers::default();
        layers
            .baseline
            .properties
            .insert("fill".into(), RawProperty::new("<paint>"));
        layers
            .supplemental
            .properties
            .insert("fill".into(), RawProperty::default());
        layers
            .supplemental
            .properties
            .insert("zoom".into(), RawProperty::default());

        let compat = StaticCompatibility::from_layers(&layers);
        assert_eq!(compat.properties["fill"].syntax.as_deref(), Some("<paint>"));
        // Still known, just without a grammar
        assert_eq!(compat.properties["zoom"], CompatibilityRecord::default());
    }
}
