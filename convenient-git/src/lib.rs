use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, info};

/// Git repository errors
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Clone failed: {0}")]
    CloneFailed(String),
}

pub type GitResult<T> = Result<T, GitError>;

/// Returns true when `repo_path` is a git repository with at least one
/// remote configured.
///
/// A directory left behind by an interrupted clone, or one that was never
/// cloned at all, reports false.
pub fn has_remote(repo_path: &Path) -> bool {
    let repo = match Repository::open(repo_path) {
        Ok(repo) => repo,
        Err(e) => {
            debug!("{} is not a repository: {}", repo_path.display(), e);
            return false;
        }
    };

    match repo.remotes() {
        Ok(remotes) => !remotes.is_empty(),
        Err(e) => {
            debug!("Cannot list remotes of {}: {}", repo_path.display(), e);
            false
        }
    }
}

/// Clones a single branch of a remote repository
pub trait Cloner {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> GitResult<()>;
}

/// [`Cloner`] backed by libgit2
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Cloner;

impl Cloner for Git2Cloner {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> GitResult<()> {
        info!("Cloning {} (branch: {}) into {}", url, branch, dest.display());

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut builder = git2::build::RepoBuilder::new();
        builder.branch(branch);
        builder
            .clone(url, dest)
            .map_err(|e| GitError::CloneFailed(format!("{} -> {}: {}", url, dest.display(), e)))?;

        Ok(())
    }
}

/// A remote repository checked out below a local directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepository {
    pub path: PathBuf,
    pub git_url: String,
    pub branch: String,
}

impl GitRepository {
    pub fn new(path: impl Into<PathBuf>, git_url: impl Into<String>, branch: impl Into<String>) -> Self {
        GitRepository {
            path: path.into(),
            git_url: git_url.into(),
            branch: branch.into(),
        }
    }

    pub fn is_present(&self) -> bool {
        has_remote(&self.path)
    }

    /// Clone the repository unless it is already present.
    ///
    /// Returns true when a clone was made.
    pub fn ensure_cloned<C: Cloner + ?Sized>(&self, cloner: &C) -> GitResult<bool> {
        if self.is_present() {
            info!("Repository {} already exists. Skipping...", self.path.display());
            return Ok(false);
        }

        cloner.clone_branch(&self.git_url, &self.branch, &self.path)?;
        Ok(true)
    }
}
