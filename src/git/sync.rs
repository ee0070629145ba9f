//! Network and reset operations
//!
//! Fetch and push with credentials, plus the hard reset used when a pull
//! cannot reconcile local and remote history.

use super::{credentials, Repository};
use crate::error::{Error, Result};
use git2::{FetchOptions, Oid, PushOptions, ResetType};
use std::cell::RefCell;

impl Repository {
    /// Fetch the remote's configured refspecs
    pub fn fetch_all(&self, remote: &str) -> Result<()> {
        let refspecs: [&str; 0] = [];
        self.fetch(remote, &refspecs)
    }

    /// Fetch one branch into `refs/remotes/<remote>/<branch>`
    ///
    /// Returns the fetched tip.
    pub fn fetch_branch(&self, remote: &str, branch: &str) -> Result<Oid> {
        let refspec = format!("+refs/heads/{b}:refs/remotes/{r}/{b}", r = remote, b = branch);
        self.fetch(remote, &[refspec.as_str()])?;

        let tip = self
            .inner
            .refname_to_id(&format!("refs/remotes/{}/{}", remote, branch))?;
        tracing::debug!("Fetched {}/{} at {}", remote, branch, tip);
        Ok(tip)
    }

    fn fetch(&self, remote: &str, refspecs: &[&str]) -> Result<()> {
        let mut remote = self.inner.find_remote(remote)?;
        let mut fo = FetchOptions::new();
        fo.remote_callbacks(credentials::remote_callbacks(&self.inner));
        remote.fetch(refspecs, Some(&mut fo), None)?;
        Ok(())
    }

    /// Push a local branch to the same name on `remote`
    ///
    /// A ref update the remote refuses is an error, even when the
    /// transport itself succeeded.
    pub fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let mut remote = self.inner.find_remote(remote)?;
        let reference = format!("refs/heads/{}", branch);
        let refspec = format!("{0}:{0}", reference);

        let rejection: RefCell<Option<String>> = RefCell::new(None);
        {
            let mut callbacks = credentials::remote_callbacks(&self.inner);
            callbacks.push_update_reference(|_ref_name, status| {
                if let Some(msg) = status {
                    *rejection.borrow_mut() = Some(msg.to_string());
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);
            remote.push(&[refspec.as_str()], Some(&mut push_options))?;
        }

        if let Some(message) = rejection.into_inner() {
            return Err(Error::PushRejected { reference, message });
        }

        Ok(())
    }

    /// Point the current branch, index and work tree at `target`
    ///
    /// Discards local commits and uncommitted changes.
    pub fn hard_reset(&self, target: Oid) -> Result<()> {
        let object = self.inner.find_object(target, None)?;
        self.inner.reset(&object, ResetType::Hard, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{commit_file, init_repo};
    use super::*;
    use git2::Repository as Git2Repo;
    use tempfile::TempDir;

    fn bare_remote(path: &std::path::Path) -> Git2Repo {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.bare(true).initial_head("main");
        Git2Repo::init_opts(path, &opts).unwrap()
    }

    #[test]
    fn test_push_then_fetch_branch() {
        let remote_dir = TempDir::new().unwrap();
        let local_dir = TempDir::new().unwrap();
        let remote = bare_remote(remote_dir.path());

        let raw = init_repo(local_dir.path());
        let head = commit_file(&raw, "a.txt", "a");
        raw.remote("origin", remote_dir.path().to_str().unwrap()).unwrap();

        let repo = Repository::open(local_dir.path()).unwrap();
        repo.push("origin", "main").unwrap();
        assert_eq!(remote.refname_to_id("refs/heads/main").unwrap(), head);

        assert_eq!(repo.fetch_branch("origin", "main").unwrap(), head);
    }

    #[test]
    fn test_push_to_missing_remote_fails() {
        let local_dir = TempDir::new().unwrap();
        let raw = init_repo(local_dir.path());
        commit_file(&raw, "a.txt", "a");
        raw.remote("origin", "/nonexistent/gitsync/remote.git").unwrap();

        let repo = Repository::open(local_dir.path()).unwrap();
        assert!(repo.push("origin", "main").is_err());
    }

    #[test]
    fn test_hard_reset_discards_local_work() {
        let dir = TempDir::new().unwrap();
        let raw = init_repo(dir.path());
        let first = commit_file(&raw, "a.txt", "a");
        commit_file(&raw, "b.txt", "b");
        std::fs::write(dir.path().join("a.txt"), "dirty").unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        repo.hard_reset(first).unwrap();

        assert_eq!(repo.head_hash().unwrap(), Some(first.to_string()));
        assert!(!dir.path().join("b.txt").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "a");
    }
}
