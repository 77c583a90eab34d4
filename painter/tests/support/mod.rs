//! A recording [`VcsClient`] double: every call is logged, push outcomes
//! are scriptable, and nothing touches real storage.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use vcs::{CommitStamp, PushMode, PushRejection, VcsClient, VcsError, VcsResult};

pub struct MockClient {
    pub calls: Mutex<Vec<String>>,
    pub push_results: Mutex<VecDeque<VcsResult<()>>>,
    pub branch: String,
    pub pending: bool,
    pub local_tip: String,
    pub remote_tip: String,
    pub ancestor: bool,
    pub rebase_ok: bool,
    pub default_branch: String,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            push_results: Mutex::new(VecDeque::new()),
            branch: "main".to_string(),
            pending: false,
            local_tip: "aaa111".to_string(),
            remote_tip: "aaa111".to_string(),
            ancestor: false,
            rebase_ok: true,
            default_branch: "main".to_string(),
        }
    }
}

impl MockClient {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn count_exact(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| *call == name).count()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with("push"))
            .collect()
    }

    /// Script the outcomes of upcoming push calls; once the queue drains,
    /// pushes succeed.
    pub fn queue_push_results(&self, results: Vec<VcsResult<()>>) {
        *self.push_results.lock().unwrap() = results.into();
    }
}

pub fn push_rejected(rejection: PushRejection) -> VcsError {
    VcsError::PushRejected {
        remote: "origin".to_string(),
        branch: "main".to_string(),
        rejection,
        stderr: "scripted rejection".to_string(),
    }
}

fn command_failed() -> VcsError {
    VcsError::CommandFailed {
        command: "git".to_string(),
        code: Some(1),
        stderr: "scripted failure".to_string(),
    }
}

#[async_trait]
impl VcsClient for MockClient {
    async fn clone_repo(&self, _url: &str, _dest: &Path) -> VcsResult<()> {
        self.record("clone");
        Ok(())
    }

    async fn remote_url(&self, _repo: &Path, _remote: &str) -> VcsResult<String> {
        self.record("remote-url");
        Ok("git@github.com:example-user/activity-canvas.git".to_string())
    }

    async fn set_remote_url(&self, _repo: &Path, _remote: &str, _url: &str) -> VcsResult<()> {
        self.record("set-remote-url");
        Ok(())
    }

    async fn current_branch(&self, _repo: &Path) -> VcsResult<String> {
        self.record("current-branch");
        Ok(self.branch.clone())
    }

    async fn local_branch_exists(&self, _repo: &Path, _branch: &str) -> VcsResult<bool> {
        self.record("local-branch-exists");
        Ok(true)
    }

    async fn remote_branches(&self, _repo: &Path) -> VcsResult<Vec<String>> {
        self.record("remote-branches");
        Ok(vec![format!("origin/{}", self.branch)])
    }

    async fn stash(&self, _repo: &Path) -> VcsResult<()> {
        self.record("stash");
        Ok(())
    }

    async fn fetch(&self, _repo: &Path, _remote: &str, _branch: &str) -> VcsResult<()> {
        self.record("fetch");
        Ok(())
    }

    async fn fetch_all(&self, _repo: &Path) -> VcsResult<()> {
        self.record("fetch-all");
        Ok(())
    }

    async fn merge_base(&self, _repo: &Path, _a: &str, _b: &str) -> VcsResult<String> {
        self.record("merge-base");
        Ok("base111".to_string())
    }

    async fn rev_parse(&self, _repo: &Path, rev: &str) -> VcsResult<String> {
        self.record(format!("rev-parse {rev}"));
        if rev.starts_with("origin/") {
            Ok(self.remote_tip.clone())
        } else {
            Ok(self.local_tip.clone())
        }
    }

    async fn is_ancestor(
        &self,
        _repo: &Path,
        _ancestor: &str,
        _descendant: &str,
    ) -> VcsResult<bool> {
        self.record("is-ancestor");
        Ok(self.ancestor)
    }

    async fn merge_ff_only(&self, _repo: &Path, _rev: &str) -> VcsResult<()> {
        self.record("merge-ff-only");
        Ok(())
    }

    async fn rebase(&self, _repo: &Path, _onto: &str) -> VcsResult<()> {
        self.record("rebase");
        if self.rebase_ok {
            Ok(())
        } else {
            Err(command_failed())
        }
    }

    async fn rebase_abort(&self, _repo: &Path) -> VcsResult<()> {
        self.record("rebase-abort");
        Ok(())
    }

    async fn merge(&self, _repo: &Path, _rev: &str) -> VcsResult<()> {
        self.record("merge");
        Ok(())
    }

    async fn pull(&self, _repo: &Path, _remote: &str, _branch: &str, rebase: bool) -> VcsResult<()> {
        self.record(if rebase { "pull-rebase" } else { "pull" });
        Ok(())
    }

    async fn stage(&self, _repo: &Path, pathspec: &str) -> VcsResult<()> {
        self.record(format!("stage {pathspec}"));
        Ok(())
    }

    async fn stage_all(&self, _repo: &Path) -> VcsResult<()> {
        self.record("stage-all");
        Ok(())
    }

    async fn commit(
        &self,
        _repo: &Path,
        message: &str,
        stamp: Option<&CommitStamp>,
    ) -> VcsResult<()> {
        let suffix = if stamp.is_some() { " [stamped]" } else { "" };
        self.record(format!("commit {message}{suffix}"));
        Ok(())
    }

    async fn push(
        &self,
        _repo: &Path,
        _remote: &str,
        _branch: &str,
        mode: PushMode,
    ) -> VcsResult<()> {
        self.record(match mode {
            PushMode::Plain => "push plain",
            PushMode::ForceWithLease => "push lease",
            PushMode::Force => "push force",
        });
        match self.push_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(()),
        }
    }

    async fn pending_changes(&self, _repo: &Path) -> VcsResult<bool> {
        self.record("status");
        Ok(self.pending)
    }

    async fn reset_hard(&self, _repo: &Path, rev: &str) -> VcsResult<()> {
        self.record(format!("reset-hard {rev}"));
        Ok(())
    }

    async fn clean_untracked(&self, _repo: &Path) -> VcsResult<()> {
        self.record("clean");
        Ok(())
    }

    async fn checkout(&self, _repo: &Path, branch: &str) -> VcsResult<()> {
        self.record(format!("checkout {branch}"));
        Ok(())
    }

    async fn checkout_new(&self, _repo: &Path, branch: &str, _start: &str) -> VcsResult<()> {
        self.record(format!("checkout-new {branch}"));
        Ok(())
    }

    async fn config_value(&self, _repo: &Path, _key: &str) -> VcsResult<String> {
        self.record("config");
        Ok("painter@example.com".to_string())
    }

    async fn recent_log(&self, _repo: &Path, _limit: usize) -> VcsResult<String> {
        self.record("log");
        Ok("abc1234 canvas: paint".to_string())
    }

    async fn remote_default_branch(&self, _repo: &Path, _remote: &str) -> VcsResult<String> {
        self.record("remote-default-branch");
        Ok(self.default_branch.clone())
    }

    async fn collect_garbage(&self, _repo: &Path) -> VcsResult<()> {
        self.record("gc");
        Ok(())
    }

    async fn probe_ssh(&self, _target: &str) -> VcsResult<()> {
        self.record("probe-ssh");
        Ok(())
    }
}
