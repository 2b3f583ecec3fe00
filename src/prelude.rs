//! Common re-exports for convenient importing.
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewdiff::prelude::*;
//! ```

pub use crate::core::{
    parse_diff, DiffResult, DiffScope, DiffService, FileDiff, FileStatus, Hunk, Line, LineKind,
    ParseError, ParseOutcome, QueryError, RepoError, RepoRoot,
};
