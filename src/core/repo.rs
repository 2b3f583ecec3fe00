//! Git repository discovery and the raw-diff fetch boundary.
//!
//! Everything that shells out to the `git` executable lives here. The
//! parser never sees this module; it only consumes the text these
//! functions return.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::core::DiffScope;

/// Context width that effectively spans whole files ("full file with
/// diff" views).
pub const FULL_CONTEXT: u32 = 999_999;

/// Errors from repository operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepoError {
    /// Path is not inside a git repository.
    #[error("not inside a git repository")]
    NotARepo,
    /// Git command failed with an error message.
    #[error("git command failed: {0}")]
    GitError(String),
    /// I/O error during git invocation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Git output contained invalid UTF-8.
    #[error("invalid utf-8 in git output")]
    InvalidUtf8,
}

/// Canonicalized path to a git repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRoot(PathBuf);

impl RepoRoot {
    /// Discover the git repository containing the given path.
    #[must_use = "this returns a Result that should be checked"]
    pub fn discover(path: &Path) -> Result<Self, RepoError> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()?;

        if !output.status.success() {
            return Err(RepoError::NotARepo);
        }

        let root = std::str::from_utf8(&output.stdout)
            .map_err(|_| RepoError::InvalidUtf8)?
            .trim();

        let canonical = PathBuf::from(root)
            .canonicalize()
            .map_err(|_| RepoError::NotARepo)?;

        Ok(Self(canonical))
    }

    /// Get the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Fetch raw unified-diff text for the requested scope.
///
/// Color and external diff drivers are disabled so the output honors the
/// parser's input contract. `context` is forwarded as `-U<n>`; pass
/// [`FULL_CONTEXT`] for whole-file hunks. For [`DiffScope::Target`] the
/// comparison base is `target`, defaulting to `HEAD`.
#[must_use = "this returns a Result that should be checked"]
pub fn fetch_diff(
    root: &RepoRoot,
    scope: DiffScope,
    target: Option<&str>,
    context: u32,
) -> Result<String, RepoError> {
    let context_arg = format!("-U{}", context);
    let mut args: Vec<&str> = match scope {
        DiffScope::Staged => vec!["diff", "--cached", "--no-color", "--no-ext-diff"],
        DiffScope::Unstaged => vec!["diff", "--no-color", "--no-ext-diff"],
        DiffScope::Target => vec!["diff", target.unwrap_or("HEAD"), "--no-color", "--no-ext-diff"],
    };
    args.push(&context_arg);

    run_git(root.path(), &args)
}

/// Raw `git status --porcelain` text. Drives the change poller; a changed
/// snapshot means the diff should be re-fetched.
#[must_use = "this returns a Result that should be checked"]
pub fn status_snapshot(root: &RepoRoot) -> Result<String, RepoError> {
    run_git(root.path(), &["status", "--porcelain"])
}

/// Paths with pending changes, extracted from the porcelain status.
#[must_use = "this returns a Result that should be checked"]
pub fn changed_paths(root: &RepoRoot) -> Result<Vec<String>, RepoError> {
    let snapshot = status_snapshot(root)?;
    Ok(snapshot
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = line[3..].trim();
            // Renames come through as "old -> new"; keep the new path.
            match path.split_once(" -> ") {
                Some((_, new)) => new.to_string(),
                None => path.to_string(),
            }
        })
        .collect())
}

/// Historical file content: `HEAD:<path>`, falling back to the working
/// tree for files not yet committed.
#[must_use = "this returns a Result that should be checked"]
pub fn file_content(root: &RepoRoot, path: &str) -> Result<String, RepoError> {
    match run_git(root.path(), &["show", &format!("HEAD:{}", path)]) {
        Ok(content) => Ok(content),
        Err(_) => {
            let full_path = root.path().join(path);
            std::fs::read_to_string(full_path).map_err(RepoError::Io)
        }
    }
}

/// Run a git command and capture stdout.
///
/// Diff commands exit 1 when differences are found; that is not a
/// failure.
fn run_git(repo: &Path, args: &[&str]) -> Result<String, RepoError> {
    let output = Command::new("git").args(args).current_dir(repo).output()?;

    if !output.status.success() && output.status.code() != Some(1) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RepoError::GitError(stderr.trim().to_string()));
    }

    String::from_utf8(output.stdout).map_err(|_| RepoError::InvalidUtf8)
}
