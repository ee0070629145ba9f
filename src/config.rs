//! Configuration for gitsync
//!
//! Loaded from an optional YAML file. The default repository path is
//! resolved here, at the call boundary, and handed to the syncer as an
//! explicit argument.
//!
//! ```yaml
//! default_repository: /home/me/Documents/collections
//! remote: origin
//! author_name: Jane Doe
//! author_email: jane@example.com
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the default repository path
pub const REPOSITORY_ENV: &str = "GITSYNC_REPOSITORY";

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "GITSYNC_CONFIG";

/// Name of the remote used when none is configured
pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository synced when no path is given
    pub default_repository: Option<PathBuf>,
    /// Preferred remote name
    pub remote: String,
    /// Commit author overrides
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_repository: None,
            remote: DEFAULT_REMOTE.to_string(),
            author_name: None,
            author_email: None,
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from an explicit path, then `GITSYNC_CONFIG`, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Resolve the repository the syncer should work on
    ///
    /// Order: explicit path, `GITSYNC_REPOSITORY`, config file,
    /// `Documents/gitsync` under the user's home directory.
    pub fn resolve_repository(&self, explicit: Option<&Path>) -> PathBuf {
        let env = std::env::var_os(REPOSITORY_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        self.resolve_repository_with(explicit, env, dirs::home_dir())
    }

    fn resolve_repository_with(
        &self,
        explicit: Option<&Path>,
        env: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = env {
            return path;
        }
        if let Some(path) = &self.default_repository {
            return path.clone();
        }
        home.unwrap_or_else(|| PathBuf::from("."))
            .join("Documents")
            .join("gitsync")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.remote, "origin");
        assert!(config.default_repository.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("author_name: Jane\n").unwrap();
        assert_eq!(config.author_name.as_deref(), Some("Jane"));
        assert_eq!(config.remote, "origin");
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("remote: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_repository_resolution_order() {
        let config = Config {
            default_repository: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        let home = Some(PathBuf::from("/home/me"));

        let explicit = config.resolve_repository_with(
            Some(Path::new("/explicit")),
            Some(PathBuf::from("/from/env")),
            home.clone(),
        );
        assert_eq!(explicit, PathBuf::from("/explicit"));

        let env = config.resolve_repository_with(None, Some(PathBuf::from("/from/env")), home.clone());
        assert_eq!(env, PathBuf::from("/from/env"));

        let file = config.resolve_repository_with(None, None, home.clone());
        assert_eq!(file, PathBuf::from("/from/config"));

        let fallback = Config::default().resolve_repository_with(None, None, home);
        assert_eq!(fallback, PathBuf::from("/home/me/Documents/gitsync"));
    }

    #[test]
    fn test_default_repository_under_platform_home() {
        if std::env::var_os(REPOSITORY_ENV).is_some() {
            return;
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        let resolved = Config::default().resolve_repository(None);
        assert_eq!(resolved, home.join("Documents").join("gitsync"));
    }
}
