use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the painted repository lives, remotely and locally.
///
/// Immutable once constructed; passed to every component instead of living
/// as ambient module state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Hosting service, e.g. "github.com".
    pub host: String,
    /// Account that owns the painted repository.
    pub username: String,
    /// Repository name under that account.
    pub repository: String,
    /// Local working-copy path.
    pub local_path: PathBuf,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            host: "github.com".to_string(),
            username: "example-user".to_string(),
            repository: "activity-canvas".to_string(),
            local_path: home.join("canvas").join("activity-canvas"),
        }
    }
}

impl RemoteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn with_local_path(mut self, local_path: impl Into<PathBuf>) -> Self {
        self.local_path = local_path.into();
        self
    }

    /// The SSH clone/push URL derived from host, username, and repository.
    pub fn ssh_url(&self) -> String {
        format!("git@{}:{}/{}.git", self.host, self.username, self.repository)
    }

    /// The target for the `ssh -T` connectivity probe.
    pub fn ssh_probe_target(&self) -> String {
        format!("git@{}", self.host)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host cannot be empty".to_string());
        }

        if self.username.is_empty() {
            return Err("username cannot be empty".to_string());
        }

        if self.repository.is_empty() {
            return Err("repository cannot be empty".to_string());
        }

        if self.local_path.as_os_str().is_empty() {
            return Err("local path cannot be empty".to_string());
        }

        Ok(())
    }
}
