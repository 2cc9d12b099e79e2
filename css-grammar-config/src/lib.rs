//! Shared configuration loader for the css-grammar toolchain.
//!
//! `defaults/css-grammar.default.toml` is embedded into every binary so that the
//! documented defaults and runtime behavior stay in sync. Applications layer
//! user-specific files on top of those defaults via [`Loader`] before
//! deserializing into [`CssGrammarConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use css_grammar::css::{DatasetError, DepthLimit, Layers, LayersLoader, StaticCompatibility};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/css-grammar.default.toml");

/// Top-level configuration consumed by css-grammar applications.
#[derive(Debug, Clone, Deserialize)]
pub struct CssGrammarConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    pub logging: LoggingConfig,
}

impl CssGrammarConfig {
    pub fn depth_limit(&self) -> DepthLimit {
        DepthLimit::from(self.resolution.max_depth)
    }
}

/// Where the dataset layers are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    pub baseline_properties: Option<PathBuf>,
    pub baseline_syntaxes: Option<PathBuf>,
    pub supplemental: Option<PathBuf>,
    pub patches: Option<PathBuf>,
    pub compat: Option<PathBuf>,
}

impl DataConfig {
    /// Read every configured layer. Unset layers stay empty.
    pub fn load_layers(&self) -> Result<Layers, DatasetError> {
        let mut loader = LayersLoader::new();
        if let Some(path) = &self.baseline_properties {
            loader = loader.baseline_properties(path)?;
        }
        if let Some(path) = &self.baseline_syntaxes {
            loader = loader.baseline_syntaxes(path)?;
        }
        if let Some(path) = &self.supplemental {
            loader = loader.supplemental(path)?;
        }
        if let Some(path) = &self.patches {
            loader = loader.patches(path)?;
        }
        Ok(loader.build())
    }

    /// Read the compatibility file, or derive the data from `layers` when none is set.
    pub fn load_compat(&self, layers: &Layers) -> Result<StaticCompatibility, DatasetError> {
        match &self.compat {
            Some(path) => StaticCompatibility::from_path(path),
            None => Ok(StaticCompatibility::from_layers(layers)),
        }
    }
}

/// Data type resolution knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResolutionConfig {
    /// `None` resolves until no new type turns up
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub level: String,
}

/// Builds a [`CssGrammarConfig`] from the embedded defaults plus any number of
/// TOML files and per-key overrides, later sources winning.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file that must exist
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.add_file(path.as_ref(), true)
    }

    /// Layer a TOML file if it exists
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.add_file(path.as_ref(), false)
    }

    fn add_file(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one dotted key, e.g. `logging.level`
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Override `resolution.max_depth`; `None` leaves the configured value alone
    pub fn with_max_depth(self, max_depth: Option<usize>) -> Result<Self, ConfigError> {
        match max_depth {
            Some(depth) => {
                let depth = i64::try_from(depth).map_err(|_| {
                    ConfigError::Message(format!("max_depth {} is out of range", depth))
                })?;
                self.set_override("resolution.max_depth", depth)
            }
            None => Ok(self),
        }
    }

    pub fn build(self) -> Result<CssGrammarConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone
pub fn load_defaults() -> Result<CssGrammarConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture(file: &str) -> String {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../css-grammar/tests/fixtures")
            .join(file)
            .display()
            .to_string()
    }

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.data, DataConfig::default());
        assert_eq!(config.resolution.max_depth, None);
        assert_eq!(config.depth_limit(), DepthLimit::Unbounded);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("resolution.max_depth", 3i64)
            .expect("override to apply")
            .set_override("logging.level", "debug")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.depth_limit(), DepthLimit::Bounded(3));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn max_depth_overrides_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("css-grammar.toml");
        fs::write(&path, "[resolution]\nmax_depth = 5\n").expect("config to write");

        let config = Loader::new()
            .with_file(&path)
            .with_max_depth(Some(2))
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.depth_limit(), DepthLimit::Bounded(2));

        let config = Loader::new()
            .with_file(&path)
            .with_max_depth(None)
            .expect("nothing to override")
            .build()
            .expect("config to build");
        assert_eq!(config.depth_limit(), DepthLimit::Bounded(5));
    }

    #[test]
    fn layers_user_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("css-grammar.toml");
        fs::write(
            &path,
            "[data]\npatches = \"patches.json\"\n\n[resolution]\nmax_depth = 5\n",
        )
        .expect("config to write");

        let config = Loader::new().with_file(&path).build().expect("config to build");
        assert_eq!(config.data.patches, Some(PathBuf::from("patches.json")));
        assert_eq!(config.data.baseline_properties, None);
        assert_eq!(config.resolution.max_depth, Some(5));
        // Untouched keys keep their default
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn missing_required_file_fails() {
        let result = Loader::new().with_file("does/not/exist.toml").build();
        assert!(result.is_err());
        assert!(Loader::new()
            .with_optional_file("does/not/exist.toml")
            .build()
            .is_ok());
    }

    #[test]
    fn loads_configured_data() {
        let config = Loader::new()
            .set_override("data.baseline_properties", fixture("properties.json"))
            .expect("override to apply")
            .set_override("data.supplemental", fixture("svg.json"))
            .expect("override to apply")
            .build()
            .expect("config to build");

        let layers = config.data.load_layers().expect("layers to load");
        assert!(layers.baseline.properties.contains_key("width"));
        assert!(layers.baseline.syntaxes.is_empty());
        assert!(layers.supplemental.syntaxes.contains_key("paint"));
        assert!(layers.patches.properties.is_empty());

        // No compat file: derived from the layers
        let compat = config.data.load_compat(&layers).expect("compat to load");
        assert!(compat.properties.contains_key("fill"));
        assert!(compat.types.contains_key("paint"));
    }

    #[test]
    fn reports_unreadable_data() {
        let config = Loader::new()
            .set_override("data.patches", "does/not/exist.json")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(matches!(
            config.data.load_layers(),
            Err(DatasetError::Io { .. })
        ));
    }
}
