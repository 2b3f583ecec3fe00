//! reviewdiff - structured git diff review.
//!
//! Turns a working tree's pending changes into a line-annotated diff
//! model (files → hunks → lines) for review tooling, with file status,
//! rename and binary detection, and reconstructed old/new line numbers.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use reviewdiff::prelude::*;
//!
//! let repo = RepoRoot::discover(std::path::Path::new("."))?;
//! let service = DiffService::new(repo);
//! let outcome = service.diff(DiffScope::Unstaged)?;
//! ```

#![deny(missing_docs)]

pub mod cli;
pub mod core;
pub mod prelude;
