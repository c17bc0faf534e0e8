//! CLI Configuration

use anyhow::{Context, Result};
use dynform_engine::{EngineConfig, FileConstraints, Revalidation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_format: Option<String>,
    pub revalidation: Option<Revalidation>,
    pub files: Option<FileConstraints>,
}

impl Config {
    /// Load `~/.dynform/config.toml` (or `config.<profile>.toml`); missing file means defaults
    pub fn load(profile: Option<&str>) -> Result<Self> {
        let path = Self::config_path(profile)?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".dynform").join(filename))
    }

    /// Engine settings; a `--revalidation` flag wins over the file
    pub fn engine_config(&self, revalidation: Option<Revalidation>) -> EngineConfig {
        EngineConfig {
            files: self.files.clone().unwrap_or_default(),
            revalidation: revalidation.or(self.revalidation).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.engine_config(None), EngineConfig::default());
    }

    #[test]
    fn test_load_and_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_format = "json"
revalidation = "all"

[files]
max_size_bytes = 1048576
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.default_format.as_deref(), Some("json"));

        let engine = config.engine_config(None);
        assert_eq!(engine.revalidation, Revalidation::All);
        assert_eq!(engine.files.max_size_bytes, 1_048_576);
        // Unset keys keep their defaults
        assert_eq!(engine.files.allowed_mime_types.len(), 5);

        let engine = config.engine_config(Some(Revalidation::Dependents));
        assert_eq!(engine.revalidation, Revalidation::Dependents);
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "revalidation = [").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
