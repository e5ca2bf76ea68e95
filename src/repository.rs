//! Repository handles: artifact lookup by glob over a local source tree.

use crate::config::AppConfig;
use crate::errors::{ConfigError, ParseError, RepositoryError};
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A handle to one acquired source tree. Immutable after acquisition.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    name: String,
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository-relative paths of all files matching `pattern`, sorted
    /// for deterministic parse order.
    pub fn artifacts_by_pattern(&self, pattern: &str) -> Result<Vec<PathBuf>, RepositoryError> {
        let matcher =
            glob::Pattern::new(pattern).map_err(|source| RepositoryError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        let mut artifacts = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry.map_err(|source| RepositoryError::Walk {
                repository: self.name.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.root) {
                if matcher.matches_path(relative) {
                    artifacts.push(relative.to_path_buf());
                }
            }
        }

        artifacts.sort();
        Ok(artifacts)
    }

    /// Read one artifact's content by repository-relative path.
    pub fn read_artifact(&self, path: &Path) -> Result<String, ParseError> {
        fs::read_to_string(self.root.join(path))
            .map_err(|e| ParseError::new(path, format!("cannot read artifact: {e}")))
    }
}

/// Build the name-keyed repository map declared in config, rooted under
/// `context`. Fails if a declared repository path is not a directory.
pub fn acquire_repositories(
    config: &AppConfig,
    context: &Path,
) -> Result<HashMap<String, LocalRepository>, ConfigError> {
    let mut repositories = HashMap::new();
    for declared in &config.repositories {
        let root = context.join(&declared.path);
        if !root.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "repository '{}' path {} is not a directory",
                declared.name,
                root.display()
            )));
        }
        log::debug!(
            "acquired repository '{}' at {}",
            declared.name,
            root.display()
        );
        repositories.insert(
            declared.name.clone(),
            LocalRepository::new(&declared.name, root),
        );
    }
    Ok(repositories)
}
