//! Working-copy lifecycle: clone-if-absent, synchronization with the
//! remote, the tracked file pool, reset, and cleanup.
//!
//! Failures here follow the run's signaling convention: typed client errors
//! are logged and collapsed into booleans, and only initial setup failure is
//! fatal to a run.

use crate::config::CanvasConfig;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use vcs::{PushMode, PushRejection, VcsClient};

const REMOTE: &str = "origin";
const DEFAULT_BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

/// Manages the single local working copy through an injected client.
pub struct RepoManager {
    config: Arc<CanvasConfig>,
    client: Arc<dyn VcsClient>,
}

impl RepoManager {
    pub fn new(config: Arc<CanvasConfig>, client: Arc<dyn VcsClient>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    fn path(&self) -> &Path {
        &self.config.remote.local_path
    }

    /// The branch the working copy is on right now. Re-queried on every
    /// call; a branch change mid-run cannot be ruled out, so the value is
    /// never cached.
    pub async fn current_branch(&self) -> String {
        if let Ok(branch) = self.client.current_branch(self.path()).await {
            return branch;
        }

        warn!("failed to read current branch, trying common defaults");
        for candidate in DEFAULT_BRANCH_CANDIDATES {
            if let Ok(true) = self.client.local_branch_exists(self.path(), candidate).await {
                info!(branch = candidate, "detected branch");
                return candidate.to_string();
            }
        }

        warn!("could not determine branch, defaulting to main");
        "main".to_string()
    }

    /// Make sure a working copy exists and is wired to the expected remote.
    /// Returns false only on a fatal setup failure (failed clone).
    pub async fn ensure_local_copy(&self) -> bool {
        let path = self.path();
        let url = self.config.remote.ssh_url();

        if !path.exists() {
            info!(path = %path.display(), %url, "cloning repository");
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
            if let Err(err) = self.client.remote_url(path, REMOTE).await {
                error!(%err, "failed to verify remote repository");
                return false;
            }
        } else {
            info!(path = %path.display(), "using existing repository");
            if let Err(err) = self.client.set_remote_url(path, REMOTE, &url).await {
                warn!(%err, "failed to repoint origin url");
            }
            if !self.sync().await {
                warn!("failed to sync with remote repository, continuing anyway");
            }
        }

        self.ensure_file_pool().await;
        true
    }

    /// Bring the local branch up to date with its remote counterpart
    /// without ever deleting local commits.
    pub async fn sync(&self) -> bool {
        let path = self.path();
        let branch = self.current_branch().await;
        info!(%branch, "synchronizing repository with remote");

        // Local modifications would block rebase and merge.
        if let Err(err) = self.client.stash(path).await {
            warn!(%err, "stash failed");
        }

        if let Err(err) = self.client.fetch(path, REMOTE, &branch).await {
            warn!(%err, %branch, "failed to fetch from origin");
        }

        let remote_ref = format!("{REMOTE}/{branch}");

        if self.client.merge_base(path, &remote_ref, &branch).await.is_err() {
            warn!(%remote_ref, "no merge-base found, falling back to pull");
            if self.client.pull(path, REMOTE, &branch, true).await.is_ok() {
                return true;
            }
            warn!("pull with rebase failed, trying plain pull");
            return self.client.pull(path, REMOTE, &branch, false).await.is_ok();
        }

        let local_tip = self.client.rev_parse(path, &branch).await;
        let remote_tip = self.client.rev_parse(path, &remote_ref).await;
        if let (Ok(local), Ok(remote)) = (&local_tip, &remote_tip) {
            if local == remote {
                info!("local and remote branches are in sync");
                return true;
            }
        }

        match self.client.is_ancestor(path, &branch, &remote_ref).await {
            Ok(true) => {
                info!("fast-forwarding local branch");
                self.client.merge_ff_only(path, &remote_ref).await.is_ok()
            }
            _ => {
                info!("branches have diverged, attempting rebase");
                if self.client.rebase(path, &remote_ref).await.is_ok() {
                    true
                } else {
                    warn!("rebase failed, aborting and merging instead");
                    if let Err(err) = self.client.rebase_abort(path).await {
                        warn!(%err, "rebase abort failed");
                    }
                    self.client.merge(path, &remote_ref).await.is_ok()
                }
            }
        }
    }

    /// Create any missing tracked files, and commit+push them if the
    /// working copy shows pending changes.
    pub async fn ensure_file_pool(&self) -> bool {
        let path = self.path();

        for name in self.config.pool_files() {
            let file = path.join(&name);
            if !file.exists() {
                if let Err(err) = std::fs::write(&file, "canvas pool file\n") {
                    warn!(%err, file = %file.display(), "failed to create pool file");
                    continue;
                }
            }
            if let Err(err) = self.client.stage(path, &name).await {
                warn!(%err, file = %name, "failed to stage pool file");
            }
        }

        match self.client.pending_changes(path).await {
            Ok(true) => {
                if let Err(err) = self
                    .client
                    .commit(path, "initialize canvas file pool", None)
                    .await
                {
                    warn!(%err, "failed to commit pool files");
                    return false;
                }
                let branch = self.current_branch().await;
                self.push_with_recovery(&branch).await
            }
            Ok(false) => true,
            Err(err) => {
                warn!(%err, "failed to read working-copy status");
                false
            }
        }
    }

    /// Escalating push: plain, then one resync-and-retry on a
    /// non-fast-forward rejection, then force-with-lease.
    pub async fn push_with_recovery(&self, branch: &str) -> bool {
        let path = self.path();
        info!(branch, "pushing changes");

        match self.client.push(path, REMOTE, branch, PushMode::Plain).await {
            Ok(()) => return true,
            Err(err) if err.push_rejection() == Some(PushRejection::NonFastForward) => {
                warn!("push rejected as non-fast-forward, resynchronizing");
                if self.sync().await
                    && self
                        .client
                        .push(path, REMOTE, branch, PushMode::Plain)
                        .await
                        .is_ok()
                {
                    return true;
                }
            }
            Err(err) => {
                warn!(%err, "push failed");
            }
        }

        warn!(branch, "retrying with force-with-lease");
        match self
            .client
            .push(path, REMOTE, branch, PushMode::ForceWithLease)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "force-with-lease push failed");
                false
            }
        }
    }

    /// Hard-reset the current branch to its remote counterpart and drop
    /// untracked files. Discards local-only commits.
    pub async fn reset(&self) -> bool {
        let path = self.path();
        if !path.exists() {
            error!("repository does not exist, cannot reset");
            return false;
        }

        info!("resetting local repository to match remote");
        let branch = self.current_branch().await;

        if let Err(err) = self.client.fetch_all(path).await {
            error!(%err, "failed to fetch from remote");
            return false;
        }

        let remote_ref = format!("{REMOTE}/{branch}");
        if let Err(err) = self.client.reset_hard(path, &remote_ref).await {
            error!(%err, %remote_ref, "failed to reset");
            return false;
        }

        if let Err(err) = self.client.clean_untracked(path).await {
            warn!(%err, "failed to remove untracked files");
        }

        info!("repository reset successfully");
        true
    }

    /// Delete every file that is neither in the tracked pool nor essential,
    /// commit the deletions, push, and compact the store. Irreversible for
    /// anything not explicitly protected.
    pub async fn cleanup(&self) -> bool {
        let path = self.path();
        info!("cleaning up repository to reduce size");

        let pool: HashSet<String> = self.config.pool_files().into_iter().collect();
        let wildcard = format!("{}/**/*", path.display());
        let entries = match glob::glob(&wildcard) {
            Ok(entries) => entries,
            Err(err) => {
                error!(%err, "invalid cleanup pattern");
                return false;
            }
        };

        for entry in entries.flatten() {
            if !entry.is_file() {
                continue;
            }
            if entry.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }
            if is_protected(&entry, &pool) {
                continue;
            }
            info!(file = %entry.display(), "removing file");
            if let Err(err) = std::fs::remove_file(&entry) {
                warn!(%err, file = %entry.display(), "failed to remove file");
            }
        }

        if let Err(err) = self.client.stage_all(path).await {
            warn!(%err, "failed to stage deletions");
        }

        match self.client.pending_changes(path).await {
            Ok(true) => {
                if let Err(err) = self
                    .client
                    .commit(path, "prune files outside the canvas pool", None)
                    .await
                {
                    warn!(%err, "failed to commit cleanup");
                }
                let branch = self.current_branch().await;
                self.push_with_recovery(&branch).await;
            }
            Ok(false) => info!("nothing to prune"),
            Err(err) => warn!(%err, "failed to read working-copy status"),
        }

        if let Err(err) = self.client.collect_garbage(path).await {
            warn!(%err, "garbage collection failed");
        }

        true
    }
}

/// Files cleanup must never delete: the pool itself, repository docs, the
/// ignore file, and source files.
fn is_protected(path: &Path, pool: &HashSet<String>) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return true,
    };

    if pool.contains(name) {
        return true;
    }
    if matches!(name, "README.md" | ".gitignore" | "LICENSE") {
        return true;
    }
    path.extension().is_some_and(|ext| ext == "rs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_protected_files() {
        let pool: HashSet<String> = ["canvas_0.txt".to_string()].into_iter().collect();

        assert!(is_protected(Path::new("/repo/canvas_0.txt"), &pool));
        assert!(is_protected(Path::new("/repo/README.md"), &pool));
        assert!(is_protected(Path::new("/repo/.gitignore"), &pool));
        assert!(is_protected(Path::new("/repo/LICENSE"), &pool));
        assert!(is_protected(Path::new("/repo/src/main.rs"), &pool));

        assert!(!is_protected(Path::new("/repo/canvas_9.txt"), &pool));
        assert!(!is_protected(Path::new("/repo/stray.dat"), &pool));
        assert!(!is_protected(&PathBuf::from("/repo/notes.txt"), &pool));
    }
}
