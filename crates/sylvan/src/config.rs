//! Analyzer configuration.
//!
//! Read from `.sylvan/config.toml` under a project root:
//!
//! ```toml
//! strict_patterns = false
//!
//! [query]
//! match_limit = 1000
//! timeout_ms = 250
//!
//! [grammars]
//! search_paths = ["/opt/grammars"]
//!
//! [patterns.languages.python]
//! decorator = "(decorator) @decorator.def"
//! ```

use crate::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use sylvan_patterns::PatternOverrides;
use sylvan_syntax::QuerySettings;

/// Directory under a project root holding sylvan's config.
pub const CONFIG_DIR: &str = ".sylvan";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Fail on patterns that do not compile instead of skipping them.
    pub strict_patterns: bool,
    pub query: QuerySettings,
    pub grammars: GrammarConfig,
    /// Extra patterns layered over the built-in tables.
    pub patterns: PatternOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrammarConfig {
    /// Directories searched for grammar libraries, before the defaults.
    pub search_paths: Vec<PathBuf>,
}

impl AnalyzerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `<root>/.sylvan/config.toml`, or defaults when it does not exist.
    pub fn discover(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_DIR).join("config.toml");
        if !path.is_file() {
            tracing::trace!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading config");
        Self::load(&path)
    }
}
