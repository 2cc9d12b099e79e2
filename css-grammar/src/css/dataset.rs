//! Dataset layers
//!
//! Three layers feed the effective tables:
//!
//! - the baseline, generated upstream and read from mdn-data shaped
//!   `properties.json` / `syntaxes.json` maps,
//! - the supplemental layer (SVG definitions the baseline does not carry),
//! - the curated patches.
//!
//! Supplemental and patch layers are single JSON documents:
//!
//!     { "properties": { "<name>": {...} }, "syntaxes": { "<name>": {...} } }
//!
//! Layers are read once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Error that can occur when loading a dataset file
#[derive(Debug, Clone)]
pub enum DatasetError {
    /// The file could not be read
    Io { path: String, message: String },
    /// The file is not the expected JSON
    Json { path: String, message: String },
}

impl DatasetError {
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn json(path: impl AsRef<Path>, err: serde_json::Error) -> Self {
        DatasetError::Json {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io { path, message } => write!(f, "IO error reading {}: {}", path, message),
            DatasetError::Json { path, message } => {
                write!(f, "Invalid dataset in {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for DatasetError {}

/// A property as the baseline or supplemental layer describes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    /// Everything else (`initial`, `computed`, `status`, ...)
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl RawProperty {
    pub fn new(syntax: impl Into<String>) -> Self {
        Self {
            syntax: Some(syntax.into()),
            metadata: Map::new(),
        }
    }

    /// Shorthands list the longhands their computed value comes from
    pub fn computed_is_list(&self) -> bool {
        matches!(self.metadata.get("computed"), Some(Value::Array(_)))
    }
}

/// A reusable syntax as the baseline or supplemental layer describes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSyntax {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
}

impl RawSyntax {
    pub fn new(syntax: impl Into<String>) -> Self {
        Self {
            syntax: Some(syntax.into()),
        }
    }
}

/// A curated override. Any subset of fields may be present; an absent `syntax`
/// means only the other fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shorthand: Option<bool>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl PatchEntry {
    pub fn with_syntax(syntax: impl Into<String>) -> Self {
        Self {
            syntax: Some(syntax.into()),
            ..Self::default()
        }
    }

    /// The grammar this patch overrides with, if any
    pub fn syntax(&self) -> Option<&str> {
        self.syntax.as_deref()
    }
}

/// Properties and syntaxes of one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset<P, S> {
    #[serde(default = "BTreeMap::new")]
    pub properties: BTreeMap<String, P>,
    #[serde(default = "BTreeMap::new")]
    pub syntaxes: BTreeMap<String, S>,
}

impl<P, S> Default for Dataset<P, S> {
    fn default() -> Self {
        Self {
            properties: BTreeMap::new(),
            syntaxes: BTreeMap::new(),
        }
    }
}

/// Baseline or supplemental layer
pub type SourceData = Dataset<RawProperty, RawSyntax>;

/// Patch layer
pub type PatchData = Dataset<PatchEntry, PatchEntry>;

/// All the layers the reconciler merges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layers {
    pub baseline: SourceData,
    pub supplemental: SourceData,
    pub patches: PatchData,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, DatasetError> {
    let content = fs::read_to_string(path).map_err(|err| DatasetError::io(path, err))?;
    serde_json::from_str(&content).map_err(|err| DatasetError::json(path, err))
}

/// Read an mdn-data style `properties.json`
pub fn load_properties(path: impl AsRef<Path>) -> Result<BTreeMap<String, RawProperty>, DatasetError> {
    read_json(path.as_ref())
}

/// Read an mdn-data style `syntaxes.json`
pub fn load_syntaxes(path: impl AsRef<Path>) -> Result<BTreeMap<String, RawSyntax>, DatasetError> {
    read_json(path.as_ref())
}

/// Read a combined `{ properties, syntaxes }` document
pub fn load_dataset<P, S>(path: impl AsRef<Path>) -> Result<Dataset<P, S>, DatasetError>
where
    P: for<'de> Deserialize<'de>,
    S: for<'de> Deserialize<'de>,
{
    read_json(path.as_ref())
}

/// Builder for [Layers]. Paths left unset yield empty layers.
#[derive(Debug, Clone, Default)]
pub struct LayersLoader {
    layers: Layers,
}

impl LayersLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline_properties(mut self, path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        self.layers.baseline.properties = load_properties(path)?;
        Ok(self)
    }

    pub fn baseline_syntaxes(mut self, path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        self.layers.baseline.syntaxes = load_syntaxes(path)?;
        Ok(self)
    }

    pub fn supplemental(mut self, path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        self.layers.supplemental = load_dataset(path)?;
        Ok(self)
    }

    pub fn patches(mut self, path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        self.layers.patches = load_dataset(path)?;
        Ok(self)
    }

    pub fn build(self) -> Layers {
        self.layers
    }
}
