//! Diff selection and derived query operations.

use thiserror::Error;

use crate::core::{
    fetch_diff, parse_diff, DiffScope, FileDiff, ParseError, ParseOutcome, RepoError, RepoRoot,
    FULL_CONTEXT,
};

/// Default number of unchanged lines surrounding each hunk.
pub const DEFAULT_CONTEXT: u32 = 3;

/// Errors from the query operations layered on a parsed diff.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The raw text could not be obtained; the parser was never invoked.
    #[error(transparent)]
    Fetch(#[from] RepoError),
    /// The requested file's section was present but failed to parse.
    /// Distinct from [`QueryError::NotFound`]: the file has changes, they
    /// just could not be rendered.
    #[error("could not parse diff for {path}: {source}")]
    Unparsable {
        /// The requested path.
        path: String,
        /// Why the section was skipped.
        #[source]
        source: ParseError,
    },
    /// No file with the requested path in this scope. A normal outcome
    /// (the file simply has no changes), not a parse failure.
    #[error("file not found in diff: {path}")]
    NotFound {
        /// The requested path.
        path: String,
    },
}

/// Fetches raw diff text for a scope and parses it.
///
/// Holds the repository root plus the comparison target for
/// [`DiffScope::Target`]; each call fetches and parses fresh, so a
/// service can be shared freely across request contexts.
#[derive(Debug, Clone)]
pub struct DiffService {
    root: RepoRoot,
    target: Option<String>,
}

impl DiffService {
    /// Create a service for the given repository.
    pub fn new(root: RepoRoot) -> Self {
        Self { root, target: None }
    }

    /// Set the ref compared against for [`DiffScope::Target`] (e.g.
    /// `main`, `HEAD~1`, a commit hash). `None` means `HEAD`.
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// The repository this service reads from.
    pub fn root(&self) -> &RepoRoot {
        &self.root
    }

    /// Fetch and parse the diff for a scope with the default context width.
    #[must_use = "this returns a Result that should be checked"]
    pub fn diff(&self, scope: DiffScope) -> Result<ParseOutcome, RepoError> {
        self.diff_with_context(scope, DEFAULT_CONTEXT)
    }

    /// Fetch and parse with an explicit context-line width.
    #[must_use = "this returns a Result that should be checked"]
    pub fn diff_with_context(
        &self,
        scope: DiffScope,
        context: u32,
    ) -> Result<ParseOutcome, RepoError> {
        let raw = fetch_diff(&self.root, scope, self.target.as_deref(), context)?;
        Ok(parse_diff(&raw, scope))
    }

    /// Select the single changed file whose `path` matches.
    #[must_use = "this returns a Result that should be checked"]
    pub fn file_diff(&self, path: &str, scope: DiffScope) -> Result<FileDiff, QueryError> {
        self.select_file(path, scope, DEFAULT_CONTEXT)
    }

    /// Same selection with an effectively unbounded context width, so
    /// every hunk spans the whole file.
    #[must_use = "this returns a Result that should be checked"]
    pub fn file_diff_full_context(
        &self,
        path: &str,
        scope: DiffScope,
    ) -> Result<FileDiff, QueryError> {
        self.select_file(path, scope, FULL_CONTEXT)
    }

    fn select_file(
        &self,
        path: &str,
        scope: DiffScope,
        context: u32,
    ) -> Result<FileDiff, QueryError> {
        let outcome = self.diff_with_context(scope, context)?;
        find_file(outcome, path)
    }
}

/// Resolve a per-file selection against a parse outcome.
///
/// A path whose section failed to parse reports [`QueryError::Unparsable`]
/// with the section's error; only a path absent from both the parsed files
/// and the failures is [`QueryError::NotFound`].
fn find_file(outcome: ParseOutcome, path: &str) -> Result<FileDiff, QueryError> {
    if let Some(file) = outcome.result.files.into_iter().find(|f| f.path == path) {
        return Ok(file);
    }
    if let Some(failure) = outcome
        .failures
        .into_iter()
        .find(|f| f.path.as_deref() == Some(path))
    {
        return Err(QueryError::Unparsable {
            path: path.to_string(),
            source: failure.error,
        });
    }
    Err(QueryError::NotFound {
        path: path.to_string(),
    })
}
