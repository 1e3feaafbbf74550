use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub datastore: DatastoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatastoreConfig {
    /// Kept as written; normalized by `DataStoreService::get_root`.
    pub root: String,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
}

fn default_scan_concurrency() -> usize {
    16
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_limit() -> i64 {
    20
}
fn default_max_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    3600
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.datastore.root.trim().is_empty() {
        anyhow::bail!("datastore.root must not be empty");
    }

    if config.datastore.scan_concurrency == 0 {
        anyhow::bail!("datastore.scan_concurrency must be >= 1");
    }

    if config.search.max_limit < 1 {
        anyhow::bail!("search.max_limit must be >= 1");
    }

    if config.search.default_limit < 1 || config.search.default_limit > config.search.max_limit {
        anyhow::bail!(
            "search.default_limit must be in [1, {}]",
            config.search.max_limit
        );
    }

    if config.index.interval_secs == 0 {
        anyhow::bail!("index.interval_secs must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [db]
            path = "./data/artefacts.sqlite"

            [datastore]
            root = "./datastore"
            "#,
        )
        .unwrap();
        assert_eq!(config.datastore.scan_concurrency, 16);
        assert!(!config.datastore.follow_symlinks);
        assert_eq!(config.search.default_limit, 20);
        assert_eq!(config.search.max_limit, 100);
        assert_eq!(config.index.interval_secs, 3600);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let base = "[db]\npath = \"db.sqlite\"\n";
        assert!(parse(&format!("{}[datastore]\nroot = \"  \"\n", base)).is_err());
        assert!(parse(&format!(
            "{}[datastore]\nroot = \"r\"\nscan_concurrency = 0\n",
            base
        ))
        .is_err());
        assert!(parse(&format!(
            "{}[datastore]\nroot = \"r\"\n[search]\ndefault_limit = 500\n",
            base
        ))
        .is_err());
        assert!(parse(&format!(
            "{}[datastore]\nroot = \"r\"\n[index]\ninterval_secs = 0\n",
            base
        ))
        .is_err());
    }
}
