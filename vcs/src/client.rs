use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::path::Path;
use thiserror::Error;

/// Why a push was refused by the remote.
///
/// Classified once by the client implementation from the captured error
/// stream, so escalation logic never matches on exact wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushRejection {
    /// The remote branch has commits the local branch does not.
    NonFastForward,
    /// A force-with-lease push found the remote tip moved since last fetch.
    StaleLease,
    /// Any other refusal.
    Other,
}

impl std::fmt::Display for PushRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushRejection::NonFastForward => write!(f, "non-fast-forward"),
            PushRejection::StaleLease => write!(f, "stale lease"),
            PushRejection::Other => write!(f, "rejected"),
        }
    }
}

/// How hard to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    Plain,
    /// `--force-with-lease`: overwrites the remote branch only if its tip
    /// still matches the last-known value.
    ForceWithLease,
    /// Blind `--force`. Only reachable behind an explicit opt-in flag.
    Force,
}

/// Author/committer timestamp override for backdated commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitStamp {
    when: NaiveDateTime,
}

impl CommitStamp {
    pub fn new(when: NaiveDateTime) -> Self {
        Self { when }
    }

    /// The value injected as GIT_AUTHOR_DATE / GIT_COMMITTER_DATE.
    pub fn env_value(&self) -> String {
        self.when.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Errors surfaced by a version-control client
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("push to {remote}/{branch} refused ({rejection}): {stderr}")]
    PushRejected {
        remote: String,
        branch: String,
        rejection: PushRejection,
        stderr: String,
    },

    #[error("connectivity probe to {target} failed: {detail}")]
    ProbeFailed { target: String, detail: String },

    #[error("could not determine default branch for remote {remote}")]
    NoDefaultBranch { remote: String },

    #[error("command produced non-UTF-8 output")]
    InvalidOutput,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VcsError {
    /// The typed rejection reason, when this error came from a push.
    pub fn push_rejection(&self) -> Option<PushRejection> {
        match self {
            VcsError::PushRejected { rejection, .. } => Some(*rejection),
            _ => None,
        }
    }
}

pub type VcsResult<T> = Result<T, VcsError>;

/// A version-control client: one method per delegated operation.
///
/// Implementations block until the underlying operation completes. The trait
/// exists so the lifecycle and driver layers can be exercised against a
/// recording double that never touches real storage.
#[async_trait]
pub trait VcsClient: Send + Sync {
    async fn clone_repo(&self, url: &str, dest: &Path) -> VcsResult<()>;

    async fn remote_url(&self, repo: &Path, remote: &str) -> VcsResult<String>;

    async fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> VcsResult<()>;

    /// `rev-parse --abbrev-ref HEAD`.
    async fn current_branch(&self, repo: &Path) -> VcsResult<String>;

    /// Whether `refs/heads/<branch>` exists locally.
    async fn local_branch_exists(&self, repo: &Path, branch: &str) -> VcsResult<bool>;

    /// Remote-tracking branch names, e.g. "origin/main".
    async fn remote_branches(&self, repo: &Path) -> VcsResult<Vec<String>>;

    async fn stash(&self, repo: &Path) -> VcsResult<()>;

    async fn fetch(&self, repo: &Path, remote: &str, branch: &str) -> VcsResult<()>;

    async fn fetch_all(&self, repo: &Path) -> VcsResult<()>;

    async fn merge_base(&self, repo: &Path, a: &str, b: &str) -> VcsResult<String>;

    async fn rev_parse(&self, repo: &Path, rev: &str) -> VcsResult<String>;

    /// Whether `ancestor` is an ancestor of `descendant`.
    async fn is_ancestor(&self, repo: &Path, ancestor: &str, descendant: &str) -> VcsResult<bool>;

    async fn merge_ff_only(&self, repo: &Path, rev: &str) -> VcsResult<()>;

    async fn rebase(&self, repo: &Path, onto: &str) -> VcsResult<()>;

    async fn rebase_abort(&self, repo: &Path) -> VcsResult<()>;

    async fn merge(&self, repo: &Path, rev: &str) -> VcsResult<()>;

    async fn pull(&self, repo: &Path, remote: &str, branch: &str, rebase: bool) -> VcsResult<()>;

    async fn stage(&self, repo: &Path, pathspec: &str) -> VcsResult<()>;

    async fn stage_all(&self, repo: &Path) -> VcsResult<()>;

    async fn commit(
        &self,
        repo: &Path,
        message: &str,
        stamp: Option<&CommitStamp>,
    ) -> VcsResult<()>;

    async fn push(
        &self,
        repo: &Path,
        remote: &str,
        branch: &str,
        mode: PushMode,
    ) -> VcsResult<()>;

    /// Whether `status --porcelain` reports anything.
    async fn pending_changes(&self, repo: &Path) -> VcsResult<bool>;

    async fn reset_hard(&self, repo: &Path, rev: &str) -> VcsResult<()>;

    /// Remove untracked files and directories.
    async fn clean_untracked(&self, repo: &Path) -> VcsResult<()>;

    async fn checkout(&self, repo: &Path, branch: &str) -> VcsResult<()>;

    async fn checkout_new(&self, repo: &Path, branch: &str, start: &str) -> VcsResult<()>;

    async fn config_value(&self, repo: &Path, key: &str) -> VcsResult<String>;

    /// The last `limit` commits, one line each.
    async fn recent_log(&self, repo: &Path, limit: usize) -> VcsResult<String>;

    /// The remote's default branch, derived from `remote show`.
    async fn remote_default_branch(&self, repo: &Path, remote: &str) -> VcsResult<String>;

    /// Aggressive garbage collection on the underlying store.
    async fn collect_garbage(&self, repo: &Path) -> VcsResult<()>;

    /// Secure-shell connectivity probe against the hosting service.
    async fn probe_ssh(&self, target: &str) -> VcsResult<()>;
}
