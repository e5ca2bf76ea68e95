//! Application config loader.
//!
//! The config file is YAML and mirrors the world it models: a
//! `repositories` section mapping names to source trees, an optional
//! `deployment` section naming active artifact sources, an ordered
//! `services` list, and a `properties` section attaching free-form
//! key/value properties to declared services.

use crate::core::PropertyMap;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Ordered list of declared services. Declaration order is observable:
    /// it drives per-service parsing and dedup encounter order.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,

    #[serde(default)]
    pub properties: Vec<PropertiesConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    /// Source tree root, relative to the context path.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub kubernetes: Option<KubernetesSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesSource {
    pub repository: String,
    pub glob: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub repository: String,

    #[serde(default)]
    pub dockerfile: Option<String>,

    #[serde(default)]
    pub openapi: Option<String>,

    /// Image name passed through to the Dockerfile parser.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesConfig {
    pub service: String,

    #[serde(default)]
    pub properties: PropertyMap,
}

impl AppConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    /// Parse config from a YAML string; `origin` only labels error messages.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Malformed {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut repo_names = HashSet::new();
        for repo in &self.repositories {
            if !repo_names.insert(repo.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "repository '{}' is declared more than once",
                    repo.name
                )));
            }
        }

        let mut service_names = HashSet::new();
        for service in &self.services {
            if !service_names.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "service '{}' is declared more than once",
                    service.name
                )));
            }
        }

        Ok(())
    }
}
