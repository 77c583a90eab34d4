//! Working-copy health checks and minimal repairs for the doctor binary.

use crate::config::CanvasConfig;
use crate::inspect;
use chrono::Local;
use std::sync::Arc;
use tracing::{error, info, warn};
use vcs::{PushMode, VcsClient};

const PROBE_FILE: &str = "probe_commit.txt";

pub struct Doctor {
    config: Arc<CanvasConfig>,
    client: Arc<dyn VcsClient>,
}

impl Doctor {
    pub fn new(config: Arc<CanvasConfig>, client: Arc<dyn VcsClient>) -> Self {
        Self { config, client }
    }

    /// Run every read-only check, logging findings. Returns overall health.
    pub fn check(&self) -> bool {
        let path = &self.config.remote.local_path;
        let mut healthy = true;

        if inspect::repo_exists(path) {
            info!(path = %path.display(), "repository directory exists");
        } else {
            error!(path = %path.display(), "repository directory does not exist");
            return false;
        }

        if inspect::is_repository(path) {
            info!("directory is a valid repository");
        } else {
            error!("directory exists but is not a valid repository");
            return false;
        }

        match inspect::remote_matches(path, &self.config.remote) {
            Ok(true) => info!("remote origin is correctly configured"),
            Ok(false) => {
                error!(expected = %self.config.remote.ssh_url(), "remote origin is not correctly configured");
                healthy = false;
            }
            Err(err) => {
                error!(%err, "failed to read remote configuration");
                healthy = false;
            }
        }

        match inspect::local_branches(path) {
            Ok(branches) => info!(?branches, "local branches"),
            Err(err) => warn!(%err, "failed to list local branches"),
        }
        match inspect::remote_branches(path) {
            Ok(branches) => info!(?branches, "remote branches"),
            Err(err) => warn!(%err, "failed to list remote branches"),
        }
        match inspect::current_branch(path) {
            Ok(branch) => info!(%branch, "current branch"),
            Err(err) => {
                error!(%err, "failed to get current branch");
                healthy = false;
            }
        }

        match inspect::recent_commits(path, 10) {
            Ok(lines) if !lines.is_empty() => {
                for line in &lines {
                    info!(commit = %line, "recent commit");
                }
            }
            Ok(_) => {
                warn!("no commits found in the log");
                healthy = false;
            }
            Err(err) => {
                warn!(%err, "failed to read the log");
                healthy = false;
            }
        }

        healthy
    }

    /// Compose the checks and apply minimal repairs: clone when absent,
    /// correct the remote URL, then verify connectivity with a test commit.
    pub async fn fix(&self) -> bool {
        info!("starting repository diagnostics and fixes");
        let path = &self.config.remote.local_path;

        if !inspect::repo_exists(path) {
            info!("repository does not exist, cloning fresh");
            if let Some(parent) = path.parent() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    error!(%err, "failed to create parent directory");
                    return false;
                }
            }
            if let Err(err) = self
                .client
                .clone_repo(&self.config.remote.ssh_url(), path)
                .await
            {
                error!(%err, "failed to clone repository");
                return false;
            }
        }

        if !inspect::is_repository(path) {
            error!(path = %path.display(), "path exists but is not a repository");
            return false;
        }

        if !matches!(inspect::remote_matches(path, &self.config.remote), Ok(true)) {
            info!("repairing remote configuration");
            if let Err(err) = self
                .client
                .set_remote_url(path, "origin", &self.config.remote.ssh_url())
                .await
            {
                error!(%err, "failed to repair remote url");
                return false;
            }
        }

        if let Ok(branches) = inspect::local_branches(path) {
            info!(?branches, "local branches");
        }

        match inspect::recent_commits(path, 10) {
            Ok(lines) if lines.is_empty() => {
                warn!("no commits found, this might be a new repository or the wrong branch");
            }
            Err(_) => warn!("could not read the log"),
            Ok(_) => {}
        }

        if !self.test_commit().await {
            error!("failed to create test commit");
            return false;
        }

        info!("repository diagnostics and fixes completed");
        true
    }

    /// Restore the working copy to a clean state. The destructive
    /// delete-and-reclone path runs only when `confirm` approves it.
    pub async fn reset(&self, confirm: &mut dyn FnMut(&str) -> bool) -> bool {
        let path = &self.config.remote.local_path;
        let url = self.config.remote.ssh_url();

        if !inspect::repo_exists(path) {
            info!("repository directory missing, cloning fresh");
            if let Some(parent) = path.parent() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    error!(%err, "failed to create parent directory");
                    return false;
                }
            }
            if let Err(err) = self.client.clone_repo(&url, path).await {
                error!(%err, "failed to clone repository");
                return false;
            }
            return inspect::is_repository(path);
        }

        if !inspect::is_repository(path) {
            error!(path = %path.display(), "directory exists but is not a repository");
            let prompt = format!("Delete {} and clone fresh?", path.display());
            if !confirm(&prompt) {
                return false;
            }
            if let Err(err) = std::fs::remove_dir_all(path) {
                error!(%err, "failed to delete directory");
                return false;
            }
            if let Err(err) = self.client.clone_repo(&url, path).await {
                error!(%err, "failed to clone repository");
                return false;
            }
            return inspect::is_repository(path);
        }

        info!("fetching latest changes from remote");
        if let Err(err) = self.client.fetch_all(path).await {
            warn!(%err, "fetch failed");
        }

        let branches = match self.client.remote_branches(path).await {
            Ok(branches) => branches,
            Err(err) => {
                error!(%err, "failed to list branches");
                return false;
            }
        };

        let default_branch = if branches.iter().any(|b| b == "origin/main") {
            "main".to_string()
        } else if branches.iter().any(|b| b == "origin/master") {
            "master".to_string()
        } else {
            warn!("could not identify default branch, assuming main");
            "main".to_string()
        };
        info!(branch = %default_branch, "using default branch");

        let remote_ref = format!("origin/{default_branch}");
        if let Err(err) = self.client.reset_hard(path, &remote_ref).await {
            error!(%err, %remote_ref, "failed to reset");
            return false;
        }

        if self.client.checkout(path, &default_branch).await.is_err() {
            warn!(branch = %default_branch, "checkout failed, creating branch from remote");
            if let Err(err) = self
                .client
                .checkout_new(path, &default_branch, &remote_ref)
                .await
            {
                error!(%err, "failed to create branch");
            }
        }

        if let Err(err) = self.client.clean_untracked(path).await {
            warn!(%err, "failed to remove untracked files");
        }

        info!("repository reset successfully");
        true
    }

    /// Single-commit connectivity probe mirroring the painter's commit
    /// path: write, stage, commit, push, with a default-branch fallback
    /// when the plain push fails.
    pub async fn test_commit(&self) -> bool {
        let path = &self.config.remote.local_path;

        if !inspect::is_repository(path) {
            error!("not a repository, cannot create test commit");
            return false;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let probe = path.join(PROBE_FILE);
        if let Err(err) = std::fs::write(&probe, format!("test commit at {timestamp}\n")) {
            error!(%err, "failed to write probe file");
            return false;
        }
        info!(file = %probe.display(), "created probe file");

        match self.client.config_value(path, "user.email").await {
            Ok(email) => info!(%email, "committing as"),
            Err(_) => warn!("could not read configured commit email"),
        }

        if let Err(err) = self.client.stage(path, PROBE_FILE).await {
            error!(%err, "failed to stage probe file");
            return false;
        }
        if let Err(err) = self
            .client
            .commit(path, &format!("test commit at {timestamp}"), None)
            .await
        {
            error!(%err, "failed to commit probe file");
            return false;
        }

        if let Ok(line) = self.client.recent_log(path, 1).await {
            info!(commit = %line, "log after test commit");
        }

        let branch = self
            .client
            .current_branch(path)
            .await
            .unwrap_or_else(|_| "main".to_string());

        if self
            .client
            .push(path, "origin", &branch, PushMode::Plain)
            .await
            .is_err()
        {
            error!("failed to push test commit");
            match self.client.remote_default_branch(path, "origin").await {
                Ok(default) => {
                    info!(branch = %default, "pushing to detected default branch");
                    if let Err(err) = self
                        .client
                        .push(path, "origin", &default, PushMode::Plain)
                        .await
                    {
                        error!(%err, "push to default branch failed");
                    }
                }
                Err(err) => error!(%err, "could not detect default branch"),
            }
        }

        true
    }
}
