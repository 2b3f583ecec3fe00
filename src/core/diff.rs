//! Diff data model: files, hunks, lines.
//!
//! Everything here is an immutable value record produced by the parser and
//! handed to presentation/storage layers; serde field names match the wire
//! format the review UI consumes.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which comparison produced the raw diff text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DiffScope {
    /// Working tree vs index.
    Unstaged,
    /// Index vs HEAD (`git diff --cached`).
    Staged,
    /// Working tree vs HEAD or an arbitrary ref.
    #[default]
    #[serde(rename = "against-target")]
    #[value(name = "target")]
    Target,
}

/// File status in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// File does not exist on the old side.
    Added,
    /// File changed in place.
    Modified,
    /// File does not exist on the new side.
    Deleted,
    /// File moved, possibly with edits.
    Renamed,
}

/// Line type inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Unchanged line, present on both sides.
    Context,
    /// Line only on the new side (`+`).
    Added,
    /// Line only on the old side (`-`).
    Deleted,
}

/// A single row inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Line type.
    #[serde(rename = "type")]
    pub kind: LineKind,
    /// Line number in the old file (context and deleted lines).
    #[serde(rename = "oldNumber", skip_serializing_if = "Option::is_none")]
    pub old_number: Option<u32>,
    /// Line number in the new file (context and added lines).
    #[serde(rename = "newNumber", skip_serializing_if = "Option::is_none")]
    pub new_number: Option<u32>,
    /// Line text with the leading `+`/`-`/` ` marker stripped.
    pub content: String,
}

impl Line {
    /// Create a context line.
    pub fn context(content: impl Into<String>, old_number: u32, new_number: u32) -> Self {
        Self {
            kind: LineKind::Context,
            old_number: Some(old_number),
            new_number: Some(new_number),
            content: content.into(),
        }
    }

    /// Create an added line.
    pub fn added(content: impl Into<String>, new_number: u32) -> Self {
        Self {
            kind: LineKind::Added,
            old_number: None,
            new_number: Some(new_number),
            content: content.into(),
        }
    }

    /// Create a deleted line.
    pub fn deleted(content: impl Into<String>, old_number: u32) -> Self {
        Self {
            kind: LineKind::Deleted,
            old_number: Some(old_number),
            new_number: None,
            content: content.into(),
        }
    }
}

/// One contiguous change region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    /// Old file starting line from the `@@` header.
    pub old_start: u32,
    /// Line count on the old side (0 for pure insertions).
    pub old_lines: u32,
    /// New file starting line from the `@@` header.
    pub new_start: u32,
    /// Line count on the new side (0 for pure deletions).
    pub new_lines: u32,
    /// Trailing context text from the `@@ ... @@` line, verbatim.
    pub header: String,
    /// Lines in document order.
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Create an empty hunk from parsed header fields.
    pub fn new(old_start: u32, old_lines: u32, new_start: u32, new_lines: u32) -> Self {
        Self {
            old_start,
            old_lines,
            new_start,
            new_lines,
            header: String::new(),
            lines: Vec::new(),
        }
    }
}

/// One changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    /// Current path (after rename if applicable).
    pub path: String,
    /// Previous path, present only for renames where it differs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    /// File status.
    pub status: FileStatus,
    /// Count of added lines across all hunks.
    pub additions: usize,
    /// Count of deleted lines across all hunks.
    pub deletions: usize,
    /// Binary files carry no hunks and zero counts.
    pub is_binary: bool,
    /// Change hunks in document order.
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Create a file diff with no hunks yet.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            old_path: None,
            status: FileStatus::Modified,
            additions: 0,
            deletions: 0,
            is_binary: false,
            hunks: Vec::new(),
        }
    }

    /// Recompute `additions`/`deletions` from the hunk lines.
    ///
    /// Unified diff text carries no reliable per-file summary line, so the
    /// counts are always derived from the parsed lines.
    pub fn recalculate_stats(&mut self) {
        self.additions = self
            .hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == LineKind::Added)
            .count();
        self.deletions = self
            .hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == LineKind::Deleted)
            .count();
    }

    /// Display name, showing `old → new` for renames.
    pub fn display_name(&self) -> String {
        match &self.old_path {
            Some(old) if old != &self.path => format!("{} → {}", old, self.path),
            _ => self.path.clone(),
        }
    }
}

/// Complete parse result for one diff invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Changed files in the order the source text presented them.
    pub files: Vec<FileDiff>,
    /// The scope used to obtain the raw text.
    pub scope: DiffScope,
}

impl DiffResult {
    /// Create an empty result for the given scope.
    pub fn empty(scope: DiffScope) -> Self {
        Self {
            files: Vec::new(),
            scope,
        }
    }
}
