//! Configuration file handling.
//!
//! The extractor is driven by a YAML document (default `config/config.yml`)
//! naming the queries to run and the study sites to run them for. A file with
//! a `.json` extension is parsed as JSON instead.
//!
//! ```yaml
//! queries:
//!   - site_loc_info
//!   - site_pollen_abundance
//! sites:
//!   - name: Sanabria Marsh
//!     epd_number: 44
//! database:          # optional
//!   host: db
//!   port: 5432
//! output_dir: outputs  # optional
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DatabaseCreds;
use crate::queries::SiteIds;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    InvalidYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} lists no queries to run")]
    NoQueries { path: String },
}

/// A study site: display name and EPD site number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub epd_number: i32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

/// Top-level configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Names of registered queries to run, in order
    pub queries: Vec<String>,
    pub sites: Vec<Site>,
    #[serde(default)]
    pub database: DatabaseCreds,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file doesn't exist or cannot be read
    /// - The document is invalid or required fields are missing
    /// - No queries are listed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::NotFound { path: display });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Config = if is_json {
            serde_json::from_str(&content).map_err(|source| ConfigError::InvalidJson {
                path: display.clone(),
                source,
            })?
        } else {
            Self::from_yaml_str(&content).map_err(|source| ConfigError::InvalidYaml {
                path: display.clone(),
                source,
            })?
        };

        if config.queries.is_empty() {
            return Err(ConfigError::NoQueries { path: display });
        }
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// EPD site numbers of all configured sites.
    pub fn site_ids(&self) -> SiteIds {
        self.sites.iter().map(|s| s.epd_number).collect()
    }
}
