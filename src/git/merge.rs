//! Merge pull for gitsync
//!
//! Brings a fetched remote branch into HEAD without rebasing. Conflicting
//! hunks are resolved in favor of the remote ("theirs"). Histories with no
//! common ancestor are refused unless explicitly allowed, in which case
//! the merge runs against an empty ancestor tree.

use super::Repository;
use crate::error::{Error, Result};
use crate::outcome::PullKind;
use git2::build::CheckoutBuilder;
use git2::{Commit, ErrorCode, FileFavor, MergeOptions, Oid, Tree};

/// Options for a merge pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOptions {
    /// Merge even when local and remote share no history
    pub allow_unrelated_histories: bool,
}

impl Repository {
    /// Fetch `<remote>/<branch>` and merge it into HEAD
    pub fn pull(&self, remote: &str, branch: &str, opts: PullOptions) -> Result<PullKind> {
        let tip = self.fetch_branch(remote, branch)?;
        self.merge_into_head(tip, &format!("{}/{}", remote, branch), opts)
    }

    fn merge_into_head(&self, tip: Oid, label: &str, opts: PullOptions) -> Result<PullKind> {
        let theirs = self.inner.find_commit(tip)?;

        let ours = match self.head_commit()? {
            Some(commit) => commit,
            None => {
                self.fast_forward(&theirs)?;
                return Ok(PullKind::FastForward);
            }
        };

        if ours.id() == theirs.id() || self.inner.graph_descendant_of(ours.id(), theirs.id())? {
            return Ok(PullKind::UpToDate);
        }

        let ancestor = match self.inner.merge_base(ours.id(), theirs.id()) {
            Ok(base) if base == ours.id() => {
                self.fast_forward(&theirs)?;
                return Ok(PullKind::FastForward);
            }
            Ok(base) => self.inner.find_commit(base)?.tree()?,
            Err(e) if e.code() == ErrorCode::NotFound => {
                if !opts.allow_unrelated_histories {
                    return Err(Error::UnrelatedHistories);
                }
                self.empty_tree()?
            }
            Err(e) => return Err(e.into()),
        };

        self.merge_commit(&ancestor, &ours, &theirs, label)?;
        Ok(PullKind::Merged)
    }

    /// Three-way merge favoring theirs, then commit with both parents
    fn merge_commit(
        &self,
        ancestor: &Tree<'_>,
        ours: &Commit<'_>,
        theirs: &Commit<'_>,
        label: &str,
    ) -> Result<Oid> {
        let mut merge_opts = MergeOptions::new();
        merge_opts.file_favor(FileFavor::Theirs);

        let mut index =
            self.inner
                .merge_trees(ancestor, &ours.tree()?, &theirs.tree()?, Some(&merge_opts))?;

        if index.has_conflicts() {
            let count = index.conflicts()?.count();
            return Err(Error::MergeConflicts { count });
        }

        let tree_id = index.write_tree_to(&self.inner)?;
        let tree = self.inner.find_tree(tree_id)?;

        // Work tree first, so a refused checkout leaves HEAD untouched
        self.checkout(&tree)?;

        let sig = self.signature()?;
        let message = format!("Merge branch '{}'", label);
        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, &message, &tree, &[ours, theirs])?;

        tracing::debug!("Created merge commit {}", oid);
        Ok(oid)
    }

    /// Move the current branch to `target`
    fn fast_forward(&self, target: &Commit<'_>) -> Result<()> {
        self.checkout(&target.tree()?)?;

        match self.current_branch()? {
            Some(branch) => {
                let refname = format!("refs/heads/{}", branch);
                self.inner.reference(
                    &refname,
                    target.id(),
                    true,
                    &format!("pull: fast-forward to {}", target.id()),
                )?;
                self.inner.set_head(&refname)?;
            }
            None => self.inner.set_head_detached(target.id())?,
        }

        tracing::debug!("Fast-forwarded to {}", target.id());
        Ok(())
    }

    /// Safe checkout: refuses to overwrite uncommitted changes
    fn checkout(&self, tree: &Tree<'_>) -> Result<()> {
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.inner.checkout_tree(tree.as_object(), Some(&mut checkout))?;
        Ok(())
    }

    fn empty_tree(&self) -> Result<Tree<'_>> {
        let oid = self.inner.treebuilder(None)?.write()?;
        Ok(self.inner.find_tree(oid)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{commit_file, init_repo};
    use super::*;
    use tempfile::TempDir;

    /// Local repo plus a second repo playing the remote, fetched as `origin`
    fn setup() -> (TempDir, TempDir, git2::Repository, git2::Repository) {
        let local_dir = TempDir::new().unwrap();
        let remote_dir = TempDir::new().unwrap();
        let local = init_repo(local_dir.path());
        let remote = init_repo(remote_dir.path());
        local
            .remote("origin", remote_dir.path().to_str().unwrap())
            .unwrap();
        (local_dir, remote_dir, local, remote)
    }

    #[test]
    fn test_pull_into_unborn_branch_fast_forwards() {
        let (local_dir, _remote_dir, _local, remote) = setup();
        let tip = commit_file(&remote, "a.txt", "a");

        let repo = Repository::open(local_dir.path()).unwrap();
        let kind = repo.pull("origin", "main", PullOptions::default()).unwrap();

        assert_eq!(kind, PullKind::FastForward);
        assert_eq!(repo.head_hash().unwrap(), Some(tip.to_string()));
        assert!(local_dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_unrelated_histories_refused_by_default() {
        let (local_dir, _remote_dir, local, remote) = setup();
        let ours = commit_file(&local, "local.txt", "l");
        commit_file(&remote, "remote.txt", "r");

        let repo = Repository::open(local_dir.path()).unwrap();
        let err = repo
            .pull("origin", "main", PullOptions::default())
            .unwrap_err();

        assert!(matches!(err, Error::UnrelatedHistories));
        assert_eq!(repo.head_hash().unwrap(), Some(ours.to_string()));
    }

    #[test]
    fn test_unrelated_histories_merged_when_allowed() {
        let (local_dir, _remote_dir, local, remote) = setup();
        commit_file(&local, "local.txt", "l");
        commit_file(&remote, "remote.txt", "r");

        let repo = Repository::open(local_dir.path()).unwrap();
        let opts = PullOptions {
            allow_unrelated_histories: true,
        };
        assert_eq!(repo.pull("origin", "main", opts).unwrap(), PullKind::Merged);

        let head = repo.head_commit().unwrap().unwrap();
        assert_eq!(head.parent_count(), 2);
        assert!(local_dir.path().join("local.txt").exists());
        assert!(local_dir.path().join("remote.txt").exists());
    }

    #[test]
    fn test_conflicting_edit_resolved_as_theirs() {
        let (local_dir, _remote_dir, local, remote) = setup();
        commit_file(&remote, "shared.txt", "line one\nline two\n");

        let repo = Repository::open(local_dir.path()).unwrap();
        repo.pull("origin", "main", PullOptions::default()).unwrap();

        commit_file(&local, "shared.txt", "line one\nlocal edit\n");
        commit_file(&remote, "shared.txt", "line one\nremote edit\n");

        assert_eq!(
            repo.pull("origin", "main", PullOptions::default()).unwrap(),
            PullKind::Merged
        );
        let content = std::fs::read_to_string(local_dir.path().join("shared.txt")).unwrap();
        assert_eq!(content, "line one\nremote edit\n");
    }

    #[test]
    fn test_dirty_work_tree_blocks_pull() {
        let (local_dir, _remote_dir, _local, remote) = setup();
        commit_file(&remote, "shared.txt", "v1");

        let repo = Repository::open(local_dir.path()).unwrap();
        repo.pull("origin", "main", PullOptions::default()).unwrap();
        let before = repo.head_hash().unwrap();

        commit_file(&remote, "shared.txt", "v2");
        std::fs::write(local_dir.path().join("shared.txt"), "uncommitted").unwrap();

        assert!(repo.pull("origin", "main", PullOptions::default()).is_err());
        assert_eq!(repo.head_hash().unwrap(), before);
    }

    #[test]
    fn test_pull_when_up_to_date() {
        let (local_dir, _remote_dir, _local, remote) = setup();
        commit_file(&remote, "a.txt", "a");

        let repo = Repository::open(local_dir.path()).unwrap();
        repo.pull("origin", "main", PullOptions::default()).unwrap();

        assert_eq!(
            repo.pull("origin", "main", PullOptions::default()).unwrap(),
            PullKind::UpToDate
        );
    }
}
