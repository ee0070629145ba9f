//! Repository syncer
//!
//! Makes the local branch match its remote counterpart. The remote branch
//! is picked by fixed precedence (`main`, `master`, then the current
//! branch), and then the strategies in [`LADDER`] are tried in order until
//! one succeeds:
//!
//! ```text
//!   MergePull ──(unrelated histories)──▶ MergePullUnrelated
//!       │                                      │
//!       └──────────(any other failure)─────────┴──▶ FetchAndReset
//! ```
//!
//! Only the last rung is destructive; it is reported as
//! [`Outcome::SyncedViaHardReset`] so callers can warn about it.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{PullOptions, Repository};
use crate::outcome::{Detail, Outcome, SyncResult};
use std::fmt;
use std::path::Path;

/// Local branches tried before the current one, in order
const PREFERRED_BRANCHES: [&str; 2] = ["main", "master"];

/// One rung of the sync ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Non-rebasing merge pull, conflicts resolved as theirs
    MergePull,
    /// Same, allowing histories without a common ancestor
    MergePullUnrelated,
    /// Fetch, then hard reset to the remote tip
    FetchAndReset,
}

/// Strategies in the order they are attempted
pub const LADDER: [Strategy; 3] = [
    Strategy::MergePull,
    Strategy::MergePullUnrelated,
    Strategy::FetchAndReset,
];

impl Strategy {
    /// Whether this rung runs after the previous rung failed with `previous`
    pub fn applies_after(self, previous: Option<&Error>) -> bool {
        match self {
            Strategy::MergePullUnrelated => matches!(previous, Some(Error::UnrelatedHistories)),
            Strategy::MergePull | Strategy::FetchAndReset => true,
        }
    }

    fn run(self, repo: &Repository, remote: &str, branch: &str) -> Result<SyncResult> {
        match self {
            Strategy::MergePull => {
                let pull = repo.pull(remote, branch, PullOptions::default())?;
                Ok(SyncResult::new(Outcome::Synced {
                    branch: branch.to_string(),
                    pull,
                })
                .with_detail(sync_detail(repo, branch)?))
            }
            Strategy::MergePullUnrelated => {
                let opts = PullOptions {
                    allow_unrelated_histories: true,
                };
                repo.pull(remote, branch, opts)?;
                Ok(SyncResult::new(Outcome::SyncedWithUnrelatedHistories {
                    branch: branch.to_string(),
                })
                .with_detail(sync_detail(repo, branch)?))
            }
            Strategy::FetchAndReset => {
                let tip = repo.fetch_branch(remote, branch)?;
                repo.hard_reset(tip)?;
                Ok(SyncResult::new(Outcome::SyncedViaHardReset {
                    branch: branch.to_string(),
                })
                .with_detail(Detail::Reset {
                    branch: branch.to_string(),
                    head: tip.to_string(),
                }))
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::MergePull => write!(f, "merge pull"),
            Strategy::MergePullUnrelated => write!(f, "merge pull (unrelated histories)"),
            Strategy::FetchAndReset => write!(f, "fetch and hard reset"),
        }
    }
}

fn sync_detail(repo: &Repository, branch: &str) -> Result<Detail> {
    Ok(Detail::Sync {
        branch: branch.to_string(),
        head: repo.head_hash()?.unwrap_or_default(),
    })
}

/// Pick the branch to pull from the remote's branch listing
///
/// `remote_branches` holds `<remote>/<branch>` names.
pub fn select_branch(
    remote: &str,
    remote_branches: &[String],
    current: Option<&str>,
) -> Option<String> {
    PREFERRED_BRANCHES
        .into_iter()
        .chain(current)
        .find(|branch| {
            let tracking = format!("{}/{}", remote, branch);
            remote_branches.iter().any(|b| *b == tracking)
        })
        .map(String::from)
}

/// Pulls a repository up to date with its remote
#[derive(Debug, Clone, Default)]
pub struct Syncer {
    config: Config,
}

impl Syncer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Sync the repository at `path`
    pub fn sync(&self, path: &Path) -> SyncResult {
        tracing::info!("Syncing repository at {:?}", path);

        match self.try_sync(path) {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("Sync of {:?} failed: {}", path, err);
                SyncResult::new(sync_outcome(err))
            }
        }
    }

    fn try_sync(&self, path: &Path) -> Result<SyncResult> {
        let repo = Repository::open(path)?.with_author(
            self.config.author_name.as_deref(),
            self.config.author_email.as_deref(),
        );

        let remote = repo
            .resolve_remote(&self.config.remote)?
            .ok_or(Error::NoRemoteConfigured)?;
        let current = repo.current_branch()?;

        repo.fetch_all(&remote)?;
        let remote_branches = repo.remote_branches(&remote)?;
        tracing::debug!("Remote branches: {:?}", remote_branches);

        let branch = select_branch(&remote, &remote_branches, current.as_deref())
            .ok_or_else(|| Error::NoValidRemoteBranch {
                remote: remote.clone(),
            })?;
        tracing::info!("Using branch {}/{}", remote, branch);

        Ok(run_ladder(&repo, &remote, &branch))
    }
}

/// Try each strategy in order, stopping at the first success
fn run_ladder(repo: &Repository, remote: &str, branch: &str) -> SyncResult {
    let mut last_error: Option<Error> = None;

    for strategy in LADDER {
        if !strategy.applies_after(last_error.as_ref()) {
            continue;
        }

        tracing::info!("Attempting {}", strategy);
        match strategy.run(repo, remote, branch) {
            Ok(result) => {
                tracing::info!("{}", result.message);
                return result;
            }
            Err(err) => {
                tracing::warn!(retryable = err.is_retryable(), "{} failed: {}", strategy, err);
                last_error = Some(err);
            }
        }
    }

    let cause = match last_error {
        Some(err) => {
            tracing::error!(retryable = err.is_retryable(), "All sync strategies failed");
            err.to_string()
        }
        None => "no sync strategy applied".to_string(),
    };
    SyncResult::new(Outcome::SyncFailed { cause })
}

fn sync_outcome(err: Error) -> Outcome {
    match err {
        Error::NotARepository { path } | Error::BareRepository { path } => {
            Outcome::NotARepository { path }
        }
        Error::NoRemoteConfigured => Outcome::NoRemoteConfigured,
        Error::NoValidRemoteBranch { .. } => Outcome::NoValidRemoteBranch,
        other => Outcome::SyncFailed {
            cause: other.to_string(),
        },
    }
}
