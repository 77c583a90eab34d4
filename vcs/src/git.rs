//! The production [`VcsClient`]: one blocking `git` process per operation.

use crate::client::{
    CommitStamp, PushMode, PushRejection, VcsClient, VcsError, VcsResult,
};
use async_trait::async_trait;
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Drives the external `git` binary. Every call blocks until the child
/// process exits; there is no timeout, so a hang in the external tool hangs
/// the run.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn render_command<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect();
        format!("{} {}", self.program.display(), rendered.join(" "))
    }

    /// Run git with the given arguments, capturing output. Returns trimmed
    /// stdout on success.
    fn run<S: AsRef<OsStr>>(
        &self,
        repo: Option<&Path>,
        envs: &[(&str, String)],
        args: &[S],
    ) -> VcsResult<String> {
        let command = self.render_command(args);
        debug!(%command, "running");

        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(cwd) = repo {
            cmd.current_dir(cwd);
        }
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|source| VcsError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(%command, code = ?output.status.code(), %stderr, "command failed");
            return Err(VcsError::CommandFailed {
                command,
                code: output.status.code(),
                stderr,
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| VcsError::InvalidOutput)?;
        let stdout = stdout.trim().to_string();
        if !stdout.is_empty() {
            debug!(%command, output = %stdout, "command output");
        }
        Ok(stdout)
    }

    /// Collapse an exit status of 1 into `false`; git uses it for negative
    /// answers from `merge-base --is-ancestor` and `show-ref --verify`.
    fn as_bool(result: VcsResult<String>) -> VcsResult<bool> {
        match result {
            Ok(_) => Ok(true),
            Err(VcsError::CommandFailed { code: Some(1), .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Classify a push error stream into a typed rejection reason.
pub fn classify_push_stderr(stderr: &str) -> PushRejection {
    if stderr.contains("non-fast-forward") || stderr.contains("fetch first") {
        PushRejection::NonFastForward
    } else if stderr.contains("stale info") {
        PushRejection::StaleLease
    } else {
        PushRejection::Other
    }
}

/// Pull the default branch name out of `git remote show` descriptive text.
pub fn parse_head_branch(text: &str) -> Option<String> {
    let re = Regex::new(r"HEAD branch:\s*(\S+)").ok()?;
    re.captures(text).map(|caps| caps[1].to_string())
}

#[async_trait]
impl VcsClient for GitCli {
    async fn clone_repo(&self, url: &str, dest: &Path) -> VcsResult<()> {
        let args: [&OsStr; 3] = ["clone".as_ref(), url.as_ref(), dest.as_os_str()];
        self.run(None, &[], &args)?;
        Ok(())
    }

    async fn remote_url(&self, repo: &Path, remote: &str) -> VcsResult<String> {
        self.run(Some(repo), &[], &["remote", "get-url", remote])
    }

    async fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["remote", "set-url", remote, url])?;
        Ok(())
    }

    async fn current_branch(&self, repo: &Path) -> VcsResult<String> {
        self.run(Some(repo), &[], &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    async fn local_branch_exists(&self, repo: &Path, branch: &str) -> VcsResult<bool> {
        let reference = format!("refs/heads/{branch}");
        Self::as_bool(self.run(Some(repo), &[], &["show-ref", "--verify", &reference]))
    }

    async fn remote_branches(&self, repo: &Path) -> VcsResult<Vec<String>> {
        let output = self.run(Some(repo), &[], &["branch", "-r"])?;
        Ok(output
            .lines()
            .map(|line| line.trim().trim_start_matches("* ").to_string())
            .filter(|line| !line.is_empty() && !line.contains("->"))
            .collect())
    }

    async fn stash(&self, repo: &Path) -> VcsResult<()> {
        self.run(Some(repo), &[], &["stash"])?;
        Ok(())
    }

    async fn fetch(&self, repo: &Path, remote: &str, branch: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["fetch", remote, branch])?;
        Ok(())
    }

    async fn fetch_all(&self, repo: &Path) -> VcsResult<()> {
        self.run(Some(repo), &[], &["fetch", "--all"])?;
        Ok(())
    }

    async fn merge_base(&self, repo: &Path, a: &str, b: &str) -> VcsResult<String> {
        self.run(Some(repo), &[], &["merge-base", a, b])
    }

    async fn rev_parse(&self, repo: &Path, rev: &str) -> VcsResult<String> {
        self.run(Some(repo), &[], &["rev-parse", rev])
    }

    async fn is_ancestor(&self, repo: &Path, ancestor: &str, descendant: &str) -> VcsResult<bool> {
        Self::as_bool(self.run(
            Some(repo),
            &[],
            &["merge-base", "--is-ancestor", ancestor, descendant],
        ))
    }

    async fn merge_ff_only(&self, repo: &Path, rev: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["merge", "--ff-only", rev])?;
        Ok(())
    }

    async fn rebase(&self, repo: &Path, onto: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["rebase", onto])?;
        Ok(())
    }

    async fn rebase_abort(&self, repo: &Path) -> VcsResult<()> {
        self.run(Some(repo), &[], &["rebase", "--abort"])?;
        Ok(())
    }

    async fn merge(&self, repo: &Path, rev: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["merge", rev])?;
        Ok(())
    }

    async fn pull(&self, repo: &Path, remote: &str, branch: &str, rebase: bool) -> VcsResult<()> {
        if rebase {
            self.run(Some(repo), &[], &["pull", "--rebase", remote, branch])?;
        } else {
            self.run(Some(repo), &[], &["pull", remote, branch])?;
        }
        Ok(())
    }

    async fn stage(&self, repo: &Path, pathspec: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["add", pathspec])?;
        Ok(())
    }

    async fn stage_all(&self, repo: &Path) -> VcsResult<()> {
        self.run(Some(repo), &[], &["add", "--all"])?;
        Ok(())
    }

    async fn commit(
        &self,
        repo: &Path,
        message: &str,
        stamp: Option<&CommitStamp>,
    ) -> VcsResult<()> {
        let mut envs = Vec::new();
        if let Some(stamp) = stamp {
            let value = stamp.env_value();
            envs.push(("GIT_AUTHOR_DATE", value.clone()));
            envs.push(("GIT_COMMITTER_DATE", value));
        }
        self.run(Some(repo), &envs, &["commit", "-m", message])?;
        Ok(())
    }

    async fn push(
        &self,
        repo: &Path,
        remote: &str,
        branch: &str,
        mode: PushMode,
    ) -> VcsResult<()> {
        let result = match mode {
            PushMode::Plain => self.run(Some(repo), &[], &["push", remote, branch]),
            PushMode::ForceWithLease => self.run(
                Some(repo),
                &[],
                &["push", "--force-with-lease", remote, branch],
            ),
            PushMode::Force => self.run(Some(repo), &[], &["push", "--force", remote, branch]),
        };

        match result {
            Ok(_) => Ok(()),
            Err(VcsError::CommandFailed { stderr, .. }) => Err(VcsError::PushRejected {
                remote: remote.to_string(),
                branch: branch.to_string(),
                rejection: classify_push_stderr(&stderr),
                stderr,
            }),
            Err(err) => Err(err),
        }
    }

    async fn pending_changes(&self, repo: &Path) -> VcsResult<bool> {
        let output = self.run(Some(repo), &[], &["status", "--porcelain"])?;
        Ok(!output.is_empty())
    }

    async fn reset_hard(&self, repo: &Path, rev: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["reset", "--hard", rev])?;
        Ok(())
    }

    async fn clean_untracked(&self, repo: &Path) -> VcsResult<()> {
        self.run(Some(repo), &[], &["clean", "-fd"])?;
        Ok(())
    }

    async fn checkout(&self, repo: &Path, branch: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["checkout", branch])?;
        Ok(())
    }

    async fn checkout_new(&self, repo: &Path, branch: &str, start: &str) -> VcsResult<()> {
        self.run(Some(repo), &[], &["checkout", "-b", branch, start])?;
        Ok(())
    }

    async fn config_value(&self, repo: &Path, key: &str) -> VcsResult<String> {
        self.run(Some(repo), &[], &["config", key])
    }

    async fn recent_log(&self, repo: &Path, limit: usize) -> VcsResult<String> {
        let count = limit.to_string();
        self.run(Some(repo), &[], &["log", "-n", &count, "--oneline"])
    }

    async fn remote_default_branch(&self, repo: &Path, remote: &str) -> VcsResult<String> {
        let output = self.run(Some(repo), &[], &["remote", "show", remote])?;
        parse_head_branch(&output).ok_or_else(|| VcsError::NoDefaultBranch {
            remote: remote.to_string(),
        })
    }

    async fn collect_garbage(&self, repo: &Path) -> VcsResult<()> {
        self.run(Some(repo), &[], &["gc", "--aggressive", "--prune=now"])?;
        Ok(())
    }

    async fn probe_ssh(&self, target: &str) -> VcsResult<()> {
        debug!(%target, "probing ssh connectivity");
        // The hosting service greets and then refuses the shell, so the
        // probe exits non-zero even on success; the banner on stderr is the
        // only reliable signal.
        let output = Command::new("ssh")
            .args(["-T", target])
            .output()
            .map_err(|source| VcsError::Spawn {
                program: "ssh".to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.contains("successfully authenticated") {
            Ok(())
        } else {
            Err(VcsError::ProbeFailed {
                target: target.to_string(),
                detail: stderr,
            })
        }
    }
}
