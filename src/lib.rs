//! gitsync - keep a working directory in step with its git remote
//!
//! Two one-shot operations over a single local repository:
//!
//! - **Commit** ([`commit_file`]): stage and commit one file, then push the
//!   current branch if a remote exists.
//! - **Sync** ([`sync_repository`]): pull the remote's `main`, `master` or
//!   current branch, escalating from a merge pull to a hard reset.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │          Caller (CLI, desktop shell, editor hook)        │
//! └──────────────┬──────────────────────────┬────────────────┘
//!                │ commit_file              │ sync_repository
//!                ▼                          ▼
//!  ┌──────────────────────────┐  ┌───────────────────────────┐
//!  │        Committer         │  │          Syncer           │
//!  │ stage → commit → push    │  │ select branch → ladder    │
//!  └────────────┬─────────────┘  └─────────────┬─────────────┘
//!               │                              │
//!               ▼                              ▼
//!  ┌────────────────────────────────────────────────────────┐
//!  │              git::Repository (libgit2)                 │
//!  │  stage, commit, remotes, fetch, push, pull, reset      │
//!  └────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call returns a [`SyncResult`] whose [`Outcome`] says which path
//! was taken. Nothing is thrown past the operation boundary.
//!
//! Calls against the same repository must not overlap; the caller is
//! expected to serialize them.

pub mod committer;
pub mod config;
pub mod error;
pub mod git;
pub mod outcome;
pub mod syncer;

pub use committer::{default_commit_message, Committer};
pub use config::Config;
pub use error::{Error, Result};
pub use outcome::{Detail, Outcome, PullKind, Severity, SyncResult};
pub use syncer::{select_branch, Strategy, Syncer};

use std::path::{Path, PathBuf};

/// Commit a single file and push it if the repository has a remote
///
/// The repository is the one containing the file's parent directory.
pub async fn commit_file(
    path: impl Into<PathBuf>,
    message: impl Into<String>,
    config: &Config,
) -> SyncResult {
    let path = path.into();
    let message = message.into();
    let committer = Committer::new(config.clone());

    run_blocking(
        move || committer.commit_file(&path, &message),
        |cause| Outcome::CommitFailed { cause },
    )
    .await
}

/// Sync a repository with its remote
///
/// With no explicit path, the repository comes from the configuration
/// (see [`Config::resolve_repository`]).
pub async fn sync_repository(path: Option<&Path>, config: &Config) -> SyncResult {
    let repo_path = config.resolve_repository(path);
    let syncer = Syncer::new(config.clone());

    run_blocking(
        move || syncer.sync(&repo_path),
        |cause| Outcome::SyncFailed { cause },
    )
    .await
}

/// Run a blocking git operation off the async executor
async fn run_blocking<F>(op: F, on_panic: fn(String) -> Outcome) -> SyncResult
where
    F: FnOnce() -> SyncResult + Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Git task failed: {}", e);
            SyncResult::new(on_panic(e.to_string()))
        }
    }
}
