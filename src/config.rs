//! Linker configuration
//!
//! Defaults reproduce the plain behaviour: every `.md` file under the vault,
//! matched case-sensitively, written back atomically. A YAML file can
//! override any field:
//!
//! ```yaml
//! extensions: [md, markdown]
//! case_sensitive_extensions: false
//! concurrency: 4
//! skip_self_links: true
//! min_title_length: 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Configuration for a linking run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Note file extensions, without the leading dot
    pub extensions: Vec<String>,
    /// Whether `Note.MD` counts as a note when `md` is listed
    pub case_sensitive_extensions: bool,
    /// Descend into dot-directories (`.obsidian`, `.trash`, ...)
    pub include_hidden: bool,
    /// Maximum documents processed at once
    pub concurrency: usize,
    /// Compute changes without writing them
    pub dry_run: bool,
    /// Write through a temporary file and rename
    pub atomic_writes: bool,
    /// Don't link a document's own title inside it
    pub skip_self_links: bool,
    /// Titles shorter than this (in chars) are never linked
    pub min_title_length: usize,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkerConfig {
    pub fn new() -> Self {
        Self {
            extensions: vec!["md".to_string()],
            case_sensitive_extensions: true,
            include_hidden: false,
            concurrency: default_concurrency(),
            dry_run: false,
            atomic_writes: true,
            skip_self_links: false,
            min_title_length: 1,
        }
    }

    /// Load from a YAML file. Missing fields take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.normalized_extensions().is_empty() {
            return Err(ConfigError::Invalid("at least one extension is required".into()));
        }
        Ok(())
    }

    /// Extensions with any leading dot removed and blanks dropped
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Whether a file extension names a note
    pub fn matches_extension(&self, ext: &str) -> bool {
        self.normalized_extensions().iter().any(|wanted| {
            if self.case_sensitive_extensions {
                wanted == ext
            } else {
                wanted.eq_ignore_ascii_case(ext)
            }
        })
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_case_sensitive_extensions(mut self, sensitive: bool) -> Self {
        self.case_sensitive_extensions = sensitive;
        self
    }

    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    pub fn with_skip_self_links(mut self, skip: bool) -> Self {
        self.skip_self_links = skip;
        self
    }

    pub fn with_min_title_length(mut self, min: usize) -> Self {
        self.min_title_length = min;
        self
    }
}
