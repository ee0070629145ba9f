//! Git backend for gitsync
//!
//! A thin wrapper over libgit2 exposing exactly the operations the
//! committer and syncer need: repository check, stage, commit, remote
//! and branch discovery, fetch, push, merge pull and hard reset.
//!
//! # Remote Model
//!
//! A working directory has at most one remote that matters. It is the
//! configured remote name (`origin` by default) when present, otherwise
//! the first remote listed.

use crate::error::{Error, Result};
use git2::{BranchType, Commit, ErrorCode, Oid, Repository as Git2Repo, Signature};
use std::path::{Path, PathBuf};

mod credentials;
mod merge;
mod sync;

pub use merge::PullOptions;

const FALLBACK_NAME: &str = "gitsync";
const FALLBACK_EMAIL: &str = "gitsync@local";

/// Git repository wrapper for gitsync
pub struct Repository {
    inner: Git2Repo,
    author: Option<(String, String)>,
}

impl Repository {
    /// Open the repository containing `path`
    ///
    /// Fails with `NotARepository` when no repository encloses `path`, and
    /// with `BareRepository` when it has no working directory.
    pub fn open(path: &Path) -> Result<Self> {
        let inner = Git2Repo::discover(path).map_err(|e| {
            tracing::debug!("No repository at {:?}: {}", path, e.message());
            Error::NotARepository {
                path: path.to_path_buf(),
            }
        })?;

        if inner.is_bare() {
            return Err(Error::BareRepository {
                path: path.to_path_buf(),
            });
        }

        Ok(Self { inner, author: None })
    }

    /// Use the given author for commits instead of the git config identity
    pub fn with_author(mut self, name: Option<&str>, email: Option<&str>) -> Self {
        if let (Some(name), Some(email)) = (name, email) {
            self.author = Some((name.to_string(), email.to_string()));
        }
        self
    }

    /// Root of the working directory
    pub fn workdir(&self) -> Result<&Path> {
        self.inner.workdir().ok_or_else(|| Error::BareRepository {
            path: self.inner.path().to_path_buf(),
        })
    }

    /// Stage a single file
    pub fn stage(&self, file: &Path) -> Result<()> {
        let relative = self.relative_path(file)?;
        let mut index = self.inner.index()?;
        index.add_path(&relative)?;
        index.write()?;
        tracing::debug!("Staged {:?}", relative);
        Ok(())
    }

    /// Commit the index on HEAD
    ///
    /// Returns `None` without committing when the index matches HEAD.
    pub fn commit(&self, message: &str) -> Result<Option<Oid>> {
        if message.trim().is_empty() {
            return Err(Error::EmptyCommitMessage);
        }

        let sig = self.signature()?;
        let mut index = self.inner.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = self.head_commit()?;
        if parent.as_ref().map(|p| p.tree_id()) == Some(tree_id) {
            return Ok(None);
        }
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        Ok(Some(oid))
    }

    /// Get the current HEAD commit hash
    pub fn head_hash(&self) -> Result<Option<String>> {
        Ok(self.head_commit()?.map(|c| c.id().to_string()))
    }

    /// HEAD commit, or `None` on an unborn branch
    pub(crate) fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.inner.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Name of the checked-out branch, `None` when HEAD is detached
    ///
    /// Works on an unborn branch by reading HEAD's symbolic target.
    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.inner.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.inner.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(String::from))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists configured remotes
    pub fn remotes(&self) -> Result<Vec<String>> {
        let remotes = self.inner.remotes()?;
        Ok(remotes.iter().filter_map(|r| r.map(String::from)).collect())
    }

    /// Pick the remote to talk to
    ///
    /// Prefers `preferred` if it exists, otherwise the first remote.
    pub fn resolve_remote(&self, preferred: &str) -> Result<Option<String>> {
        let remotes = self.remotes()?;

        if remotes.iter().any(|r| r == preferred) {
            return Ok(Some(preferred.to_string()));
        }

        Ok(remotes.into_iter().next())
    }

    /// Remote-tracking branches of `remote`, as `<remote>/<branch>`
    pub fn remote_branches(&self, remote: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", remote);
        let head = format!("{}/HEAD", remote);
        let mut names = Vec::new();

        for entry in self.inner.branches(Some(BranchType::Remote))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                if name.starts_with(&prefix) && name != head {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Get a signature for commits
    fn signature(&self) -> Result<Signature<'static>> {
        if let Some((name, email)) = &self.author {
            return Ok(Signature::now(name, email)?);
        }

        // Try to get from git config, fall back to defaults
        self.inner
            .signature()
            .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))
            .map_err(Into::into)
    }

    /// Path of `file` relative to the working directory
    fn relative_path(&self, file: &Path) -> Result<PathBuf> {
        let workdir = std::fs::canonicalize(self.workdir()?)?;
        let file = std::fs::canonicalize(file).map_err(|_| Error::FileNotFound {
            path: file.to_path_buf(),
        })?;

        file.strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| Error::OutsideWorkdir { path: file.clone() })
    }

    /// Get the underlying git2 repository (for advanced operations)
    pub fn inner(&self) -> &Git2Repo {
        &self.inner
    }
}
