// Configuration
// Loads sproc.toml: database connection, loader settings and placeholder values

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::placeholder::ReplacePairs;

/// Default configuration file name
pub const CONFIG_FILE: &str = "sproc.toml";

/// Environment variable consulted when the configuration has no password
pub const PASSWORD_ENV: &str = "SPROC_DB_PASSWORD";

const DEFAULT_SQL_MODE: &str = "STRICT_ALL_TABLES,ONLY_FULL_GROUP_BY,NO_ZERO_IN_DATE,NO_ZERO_DATE,\
                                ERROR_FOR_DIVISION_BY_ZERO,NO_ENGINE_SUBSTITUTION";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub loader: LoaderSettings,
    /// Placeholder token → value
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderSettings {
    /// Directory scanned for routine sources
    pub source_dir: PathBuf,
    /// Extension of routine source files (without the dot)
    pub extension: String,
    /// JSON file holding the metadata of all routines
    pub metadata: PathBuf,
    pub sql_mode: String,
    pub character_set: String,
    pub collation: String,
    /// Derive `@TABLE.COLUMN%TYPE@` placeholders from the schema
    pub column_type_placeholders: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("lib/psql"),
            extension: "psql".to_string(),
            metadata: PathBuf::from("etc/routines.json"),
            sql_mode: DEFAULT_SQL_MODE.to_string(),
            character_set: "utf8mb4".to_string(),
            collation: "utf8mb4_general_ci".to_string(),
            column_type_placeholders: true,
        }
    }
}

/// Session settings every routine is loaded with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub sql_mode: String,
    pub character_set: String,
    pub collation: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let loader = LoaderSettings::default();
        Self {
            sql_mode: loader.sql_mode,
            character_set: loader.character_set,
            collation: loader.collation,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

impl Config {
    /// Load a configuration file. Relative paths are resolved against the
    /// directory containing the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.loader.source_dir = base.join(&config.loader.source_dir);
        config.loader.metadata = base.join(&config.loader.metadata);

        Ok(config)
    }

    /// Parse configuration text. Paths are left as written.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        if config.database.password.is_none() {
            config.database.password = std::env::var(PASSWORD_ENV).ok();
        }
        Ok(config)
    }

    /// The placeholder table supplied to every compile
    pub fn replace_pairs(&self) -> ReplacePairs {
        self.placeholders.iter().collect()
    }

    pub fn session(&self) -> SessionSettings {
        SessionSettings {
            sql_mode: self.loader.sql_mode.clone(),
            character_set: self.loader.character_set.clone(),
            collation: self.loader.collation.clone(),
        }
    }
}
