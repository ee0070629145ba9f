//! Error types for gitsync
//!
//! These errors never cross the public operation boundary: the committer
//! and syncer translate them into an [`Outcome`](crate::Outcome). They are
//! public so the git wrapper can be used on its own.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for gitsync operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Repository Errors
    // ==========================================================================
    #[error("'{path}' is not a git repository")]
    NotARepository { path: PathBuf },

    #[error("Repository at '{path}' has no working directory")]
    BareRepository { path: PathBuf },

    #[error("File '{path}' does not exist")]
    FileNotFound { path: PathBuf },

    #[error("File '{path}' is outside the repository working directory")]
    OutsideWorkdir { path: PathBuf },

    #[error("Commit message cannot be empty")]
    EmptyCommitMessage,

    #[error("HEAD is detached; no current branch")]
    DetachedHead,

    // ==========================================================================
    // Remote Errors
    // ==========================================================================
    #[error("No remote repository configured")]
    NoRemoteConfigured,

    #[error("No valid remote branch found on '{remote}'")]
    NoValidRemoteBranch { remote: String },

    #[error("Remote rejected update of '{reference}': {message}")]
    PushRejected { reference: String, message: String },

    // ==========================================================================
    // Merge Errors
    // ==========================================================================
    #[error("Refusing to merge unrelated histories")]
    UnrelatedHistories,

    #[error("Merge left {count} unresolved conflict(s)")]
    MergeConflicts { count: usize },

    // ==========================================================================
    // Git Errors
    // ==========================================================================
    #[error("Git operation failed: {message}")]
    Git {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    // ==========================================================================
    // Config / IO Errors
    // ==========================================================================
    #[error("Failed to read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    Config { message: String },

    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for gitsync operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io { source: err }
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Git {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config {
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Returns true if retrying the same call could succeed
    ///
    /// Precondition failures are permanent until the user changes
    /// something; transport and merge failures may clear up.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Git { .. }
                | Error::Io { .. }
                | Error::PushRejected { .. }
                | Error::MergeConflicts { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotARepository {
            path: PathBuf::from("/tmp/nowhere"),
        };
        assert_eq!(err.to_string(), "'/tmp/nowhere' is not a git repository");
    }

    #[test]
    fn test_git_error_keeps_message() {
        let err: Error = git2::Error::from_str("connection refused").into();
        assert_eq!(err.to_string(), "Git operation failed: connection refused");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "index locked").into();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.source().unwrap().to_string(), "index locked");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_preconditions_not_retryable() {
        assert!(!Error::NoRemoteConfigured.is_retryable());
        assert!(!Error::UnrelatedHistories.is_retryable());
    }
}
