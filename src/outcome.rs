//! Results returned by the committer and the syncer
//!
//! Every call ends in exactly one [`Outcome`]. Front ends decide how to
//! render a result from the outcome (or its [`Severity`]), never from the
//! message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How a successful merge pull moved the local branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullKind {
    /// Local branch already contained the remote tip
    UpToDate,
    /// Local branch pointer moved forward to the remote tip
    FastForward,
    /// A merge commit was created
    Merged,
}

/// What a commit or sync call ended up doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    // Committer
    CommittedAndPushed { remote: String, branch: String },
    CommittedNoRemote,
    /// The local commit exists; only the push failed
    CommittedPushFailed { error: String },
    NothingToCommit,
    FileNotFound { path: PathBuf },
    EmptyCommitMessage,
    CommitFailed { cause: String },

    // Syncer
    Synced { branch: String, pull: PullKind },
    SyncedWithUnrelatedHistories { branch: String },
    /// Local-only commits and changes were discarded
    SyncedViaHardReset { branch: String },
    NoRemoteConfigured,
    NoValidRemoteBranch,
    SyncFailed { cause: String },

    // Shared
    NotARepository { path: PathBuf },
}

/// How strongly a front end should present an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Outcome {
    /// Whether the requested operation took effect locally
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::CommittedAndPushed { .. }
                | Outcome::CommittedNoRemote
                | Outcome::CommittedPushFailed { .. }
                | Outcome::NothingToCommit
                | Outcome::Synced { .. }
                | Outcome::SyncedWithUnrelatedHistories { .. }
                | Outcome::SyncedViaHardReset { .. }
        )
    }

    pub fn severity(&self) -> Severity {
        match self {
            Outcome::CommittedPushFailed { .. } | Outcome::SyncedViaHardReset { .. } => {
                Severity::Warning
            }
            o if o.is_success() => Severity::Success,
            _ => Severity::Error,
        }
    }

    /// Whether local history or changes may have been thrown away
    pub fn is_destructive(&self) -> bool {
        matches!(self, Outcome::SyncedViaHardReset { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::CommittedAndPushed { remote, branch } => {
                write!(f, "Committed and pushed to {}/{}", remote, branch)
            }
            Outcome::CommittedNoRemote => write!(f, "Committed (no remote to push to)"),
            Outcome::CommittedPushFailed { error } => {
                write!(f, "Committed, but push failed: {}", error)
            }
            Outcome::NothingToCommit => write!(f, "Nothing to commit"),
            Outcome::FileNotFound { path } => write!(f, "File {} does not exist", path.display()),
            Outcome::EmptyCommitMessage => write!(f, "Commit message cannot be empty"),
            Outcome::CommitFailed { cause } => write!(f, "Commit failed: {}", cause),
            Outcome::Synced { branch, pull } => match pull {
                PullKind::UpToDate => write!(f, "Already up to date with {} branch", branch),
                _ => write!(f, "Successfully pulled latest changes from {} branch", branch),
            },
            Outcome::SyncedWithUnrelatedHistories { branch } => write!(
                f,
                "Successfully pulled latest changes from {} branch (unrelated histories merged)",
                branch
            ),
            Outcome::SyncedViaHardReset { branch } => write!(
                f,
                "Synced with remote using hard reset to {}; local changes were discarded",
                branch
            ),
            Outcome::NoRemoteConfigured => write!(f, "No remote repository configured"),
            Outcome::NoValidRemoteBranch => write!(f, "No valid remote branch found"),
            Outcome::SyncFailed { cause } => write!(f, "Failed to sync with remote: {}", cause),
            Outcome::NotARepository { path } => {
                write!(f, "Not a git repository: {}", path.display())
            }
        }
    }
}

/// Structured payload attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detail {
    Commit { commit: String },
    Push { commit: String, remote: String, branch: String },
    Sync { branch: String, head: String },
    Reset { branch: String, head: String },
}

/// Result of a commit or sync call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,
}

impl SyncResult {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.to_string(),
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn severity(&self) -> Severity {
        self.outcome.severity()
    }
}

impl From<Outcome> for SyncResult {
    fn from(outcome: Outcome) -> Self {
        Self::new(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_failure_is_partial_success() {
        let outcome = Outcome::CommittedPushFailed {
            error: "authentication required".into(),
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.severity(), Severity::Warning);

        let result = SyncResult::new(outcome);
        assert!(result.success);
        assert_eq!(result.message, "Committed, but push failed: authentication required");
    }

    #[test]
    fn test_hard_reset_is_distinguishable() {
        let reset = Outcome::SyncedViaHardReset { branch: "main".into() };
        let merged = Outcome::Synced {
            branch: "main".into(),
            pull: PullKind::Merged,
        };

        assert!(reset.is_destructive());
        assert!(!merged.is_destructive());
        assert_eq!(reset.severity(), Severity::Warning);
        assert_eq!(merged.severity(), Severity::Success);
    }

    #[test]
    fn test_failures_are_errors() {
        for outcome in [
            Outcome::NoRemoteConfigured,
            Outcome::NoValidRemoteBranch,
            Outcome::SyncFailed { cause: "offline".into() },
            Outcome::NotARepository { path: "/tmp".into() },
        ] {
            assert!(!outcome.is_success());
            assert_eq!(outcome.severity(), Severity::Error);
        }
    }

    #[test]
    fn test_json_shape() {
        let result = SyncResult::new(Outcome::CommittedNoRemote).with_detail(Detail::Commit {
            commit: "abc123".into(),
        });
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["outcome"]["kind"], "committed_no_remote");
        assert_eq!(json["detail"]["type"], "commit");
        assert_eq!(json["detail"]["commit"], "abc123");
    }
}
