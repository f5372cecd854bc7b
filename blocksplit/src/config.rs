//! Configuration loading.
//!
//! Settings live in a `blocksplit.toml` found by walking up from the
//! analyzed path. Missing or malformed files fall back to defaults; the
//! analyzer never fails because of configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the configuration file searched for.
pub const CONFIG_FILENAME: &str = "blocksplit.toml";

const DEFAULT_EXTENSIONS: &[&str] = &["c", "h", "cc", "cpp", "cxx", "hpp", "hxx"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The `[analysis]` table.
    pub analysis: AnalysisConfig,
    /// Path of the file the configuration was loaded from, if any.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

/// Settings of the `[analysis]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// File extensions to analyze when walking directories.
    pub extensions: Option<Vec<String>>,
    /// Whether failed graph builds degrade to the simplified splitter.
    pub fallback: Option<bool>,
}

impl Config {
    /// Loads configuration from the current directory upwards.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from `path` and traversing up.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                if let Ok(content) = fs::read_to_string(&candidate) {
                    if let Ok(mut config) = toml::from_str::<Self>(&content) {
                        config.config_file_path = Some(candidate);
                        return config;
                    }
                }
            }
            if !current.pop() {
                break;
            }
        }
        Self::default()
    }

    /// Extensions to analyze, with built-in C/C++ defaults.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        self.analysis.extensions.clone().unwrap_or_else(|| {
            DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect()
        })
    }

    /// Whether the degraded fallback is enabled (on by default).
    #[must_use]
    pub fn fallback(&self) -> bool {
        self.analysis.fallback.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_without_a_config_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.config_file_path.is_none());
        assert!(config.fallback());
        assert!(config.extensions().contains(&"c".to_owned()));
        assert!(config.extensions().contains(&"cpp".to_owned()));
    }

    #[test]
    fn reads_analysis_table() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "[analysis]\nextensions = [\"c\"]\nfallback = false\n",
        )
        .unwrap();
        let config = Config::load_from_path(dir.path());
        assert_eq!(config.extensions(), vec!["c"]);
        assert!(!config.fallback());
        assert!(config.config_file_path.is_some());
    }

    #[test]
    fn finds_config_in_parent_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "[analysis]\nfallback = false\n",
        )
        .unwrap();
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        let config = Config::load_from_path(&nested);
        assert!(!config.fallback());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "not [valid toml").unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.fallback());
    }
}
