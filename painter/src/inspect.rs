//! Read-only working-copy inspection for the doctor, using git2.
//!
//! All mutations stay behind the injected [`vcs::VcsClient`]; this module
//! only ever reads repository state.

use git2::{BranchType, Repository};
use std::path::Path;
use thiserror::Error;
use vcs::RemoteConfig;

/// Errors that can occur while inspecting a working copy
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("invalid UTF-8 in git data: {0}")]
    InvalidUtf8(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),
}

pub type InspectResult<T> = Result<T, InspectError>;

/// Whether the working-copy directory exists at all.
pub fn repo_exists(path: &Path) -> bool {
    path.exists()
}

/// Whether the directory is a valid repository.
pub fn is_repository(path: &Path) -> bool {
    Repository::open(path).is_ok()
}

/// Whether origin points at the expected owner and repository. The check is
/// a containment test against the configured names, matching either URL
/// scheme.
pub fn remote_matches(path: &Path, config: &RemoteConfig) -> InspectResult<bool> {
    let repo = Repository::open(path)?;
    let remote = repo.find_remote("origin")?;
    let url = remote
        .url()
        .ok_or_else(|| InspectError::InvalidUtf8("remote url".to_string()))?;
    Ok(url.contains(&config.username) && url.contains(&config.repository))
}

/// The branch HEAD currently points at.
pub fn current_branch(path: &Path) -> InspectResult<String> {
    let repo = Repository::open(path)?;
    let head = repo.head()?;

    if !head.is_branch() {
        return Err(InspectError::BranchNotFound("detached HEAD".to_string()));
    }

    head.shorthand()
        .map(str::to_string)
        .ok_or_else(|| InspectError::InvalidUtf8("branch name".to_string()))
}

fn branch_names(path: &Path, kind: BranchType) -> InspectResult<Vec<String>> {
    let repo = Repository::open(path)?;
    let mut names = Vec::new();
    for branch_result in repo.branches(Some(kind))? {
        let (branch, _branch_type) = branch_result?;
        if let Some(name) = branch.name()? {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub fn local_branches(path: &Path) -> InspectResult<Vec<String>> {
    branch_names(path, BranchType::Local)
}

pub fn remote_branches(path: &Path) -> InspectResult<Vec<String>> {
    branch_names(path, BranchType::Remote)
}

/// The most recent commits, newest first, as "short-sha summary" lines.
pub fn recent_commits(path: &Path, limit: usize) -> InspectResult<Vec<String>> {
    let repo = Repository::open(path)?;
    let mut walk = repo.revwalk()?;
    walk.push_head()?;

    let mut lines = Vec::new();
    for oid in walk.take(limit) {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        let summary = commit.summary().unwrap_or("").to_string();
        let mut sha = oid.to_string();
        sha.truncate(7);
        lines.push(format!("{sha} {summary}"));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_not_a_repository() {
        let path = Path::new("/nonexistent/invalid/path");
        assert!(!repo_exists(path));
        assert!(!is_repository(path));
    }

    #[test]
    fn test_plain_directory_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        assert!(repo_exists(dir.path()));
        assert!(!is_repository(dir.path()));
    }

    #[test]
    fn test_inspection_fails_cleanly_outside_a_repository() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            current_branch(dir.path()),
            Err(InspectError::Git(_))
        ));
        assert!(matches!(
            recent_commits(dir.path(), 10),
            Err(InspectError::Git(_))
        ));
    }

    #[test]
    fn test_fresh_repository_has_no_commits_listed() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(is_repository(dir.path()));
        // An unborn HEAD has nothing to walk.
        assert!(recent_commits(dir.path(), 10).is_err());
    }
}
