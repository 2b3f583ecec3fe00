//! In-memory review comment store.
//!
//! A keyed map with generated identifiers. Callers hand in an immutable
//! draft and get back the stored value; the store never leaks mutable
//! references, so collaborators interact with it purely by message
//! passing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Which side of the diff a comment anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The old (deleted/context) side.
    Old,
    /// The new (added/context) side.
    New,
}

/// A review comment attached to a file, optionally to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Generated identifier.
    pub id: String,
    /// Path of the commented file.
    pub file: String,
    /// Anchored line number, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Diff side the line number refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Comment text.
    pub content: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
}

/// A comment as submitted by the caller, before the store assigns
/// identity and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    /// Path of the commented file.
    pub file: String,
    /// Anchored line number, if any.
    pub line: Option<u32>,
    /// Diff side the line number refers to.
    pub side: Option<Side>,
    /// Comment text.
    pub content: String,
}

/// Thread-safe in-memory comment store.
#[derive(Debug, Default)]
pub struct CommentStore {
    comments: RwLock<HashMap<String, Comment>>,
    next_id: AtomicU64,
}

impl CommentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a draft, assigning a generated id and timestamp. Returns the
    /// stored comment.
    pub fn add(&self, draft: CommentDraft) -> Comment {
        let comment = Comment {
            id: self.generate_id(),
            file: draft.file,
            line: draft.line,
            side: draft.side,
            content: draft.content,
            created_at_ms: now_ms(),
        };
        self.comments
            .write()
            .insert(comment.id.clone(), comment.clone());
        comment
    }

    /// Get a comment by id.
    pub fn get(&self, id: &str) -> Option<Comment> {
        self.comments.read().get(id).cloned()
    }

    /// All comments for one file, oldest first.
    pub fn for_file(&self, file: &str) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .read()
            .values()
            .filter(|c| c.file == file)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        comments
    }

    /// All comments across files, oldest first.
    pub fn all(&self) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self.comments.read().values().cloned().collect();
        comments.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        comments
    }

    /// Remove a comment. Returns false if the id was unknown.
    pub fn remove(&self, id: &str) -> bool {
        self.comments.write().remove(id).is_some()
    }

    /// True when no comments are stored.
    pub fn is_empty(&self) -> bool {
        self.comments.read().is_empty()
    }

    fn generate_id(&self) -> String {
        format!("{:016x}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
