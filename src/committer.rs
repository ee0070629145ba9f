//! Single-file committer
//!
//! Stages one file, commits it, then pushes the current branch if the
//! repository has a remote. A failed push never undoes or hides the local
//! commit: it is reported as [`Outcome::CommittedPushFailed`].

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::Repository;
use crate::outcome::{Detail, Outcome, SyncResult};
use git2::Oid;
use std::path::Path;

/// Commit message used for a saved file when the caller has none
pub fn default_commit_message(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("Update request: {}", name)
}

/// Commits single files to the repository that contains them
#[derive(Debug, Clone, Default)]
pub struct Committer {
    config: Config,
}

impl Committer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Stage and commit `file`, then try to push
    pub fn commit_file(&self, file: &Path, message: &str) -> SyncResult {
        tracing::info!("Committing {:?}", file);

        match self.try_commit(file, message) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Commit of {:?} failed: {}", file, err);
                SyncResult::new(commit_outcome(err))
            }
        }
    }

    fn try_commit(&self, file: &Path, message: &str) -> Result<SyncResult> {
        let repo_dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let repo = Repository::open(repo_dir)?.with_author(
            self.config.author_name.as_deref(),
            self.config.author_email.as_deref(),
        );

        if !file.is_file() {
            return Err(Error::FileNotFound {
                path: file.to_path_buf(),
            });
        }
        if message.trim().is_empty() {
            return Err(Error::EmptyCommitMessage);
        }

        repo.stage(file)?;
        let oid = match repo.commit(message)? {
            Some(oid) => oid,
            None => {
                tracing::info!("Nothing to commit for {:?}", file);
                return Ok(SyncResult::new(Outcome::NothingToCommit));
            }
        };
        tracing::info!("Committed {:?} as {}", file, oid);

        Ok(self.push(&repo, oid))
    }

    /// Push after a successful commit; never fails the call
    fn push(&self, repo: &Repository, oid: Oid) -> SyncResult {
        let commit = oid.to_string();
        let committed = Detail::Commit {
            commit: commit.clone(),
        };

        let remote = match repo.resolve_remote(&self.config.remote) {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                tracing::info!("No remote repository configured, skipping push");
                return SyncResult::new(Outcome::CommittedNoRemote).with_detail(committed);
            }
            Err(err) => return push_failed(err, committed),
        };

        let branch = match repo.current_branch() {
            Ok(Some(branch)) => branch,
            Ok(None) => return push_failed(Error::DetachedHead, committed),
            Err(err) => return push_failed(err, committed),
        };

        tracing::info!("Pushing {} to {}", branch, remote);
        match repo.push(&remote, &branch) {
            Ok(()) => SyncResult::new(Outcome::CommittedAndPushed {
                remote: remote.clone(),
                branch: branch.clone(),
            })
            .with_detail(Detail::Push {
                commit,
                remote,
                branch,
            }),
            Err(err) => push_failed(err, committed),
        }
    }
}

fn push_failed(err: Error, committed: Detail) -> SyncResult {
    tracing::warn!("Push failed after commit: {}", err);
    SyncResult::new(Outcome::CommittedPushFailed {
        error: err.to_string(),
    })
    .with_detail(committed)
}

fn commit_outcome(err: Error) -> Outcome {
    match err {
        Error::NotARepository { path } | Error::BareRepository { path } => {
            Outcome::NotARepository { path }
        }
        Error::FileNotFound { path } => Outcome::FileNotFound { path },
        Error::EmptyCommitMessage => Outcome::EmptyCommitMessage,
        other => Outcome::CommitFailed {
            cause: other.to_string(),
        },
    }
}
