//! Unified diff parser: raw `git diff` output into structured records.
//!
//! The parser is a pure function over its input text. It holds no state
//! across calls and performs no I/O, so it is safe to invoke concurrently
//! from independent request contexts. Malformed file sections are skipped
//! and reported, never fatal to the whole document.

use thiserror::Error;

use crate::core::{DiffResult, DiffScope, FileDiff, FileStatus, Hunk, Line};

/// Null-device sentinel used by unified diff for "this side does not exist".
const NULL_DEVICE: &str = "/dev/null";

/// Errors that abort parsing of a single file section.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A line expected to be a hunk header does not match the
    /// `@@ -a[,b] +c[,d] @@` grammar.
    #[error("malformed hunk header: {header}")]
    MalformedHunkHeader {
        /// The offending line, verbatim.
        header: String,
    },
    /// A non-binary section carries hunks but no path headers.
    #[error("file section is missing its path headers")]
    UnterminatedSection,
}

/// A file section that could not be parsed.
#[derive(Debug, Clone)]
pub struct SectionFailure {
    /// Best-effort path recovered from the section boundary line.
    pub path: Option<String>,
    /// Why the section was skipped.
    pub error: ParseError,
}

/// Outcome of parsing one diff document.
///
/// `result` holds every section that parsed; `failures` records the
/// sections that were skipped. Callers surface the failed paths while
/// still rendering the parsed files.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The successfully parsed files, in document order.
    pub result: DiffResult,
    /// Sections that failed to parse.
    pub failures: Vec<SectionFailure>,
}

impl ParseOutcome {
    /// True when every section parsed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse a full diff document into per-file records.
///
/// Splits the text into file sections on `diff --git ` boundary lines
/// (scanned line-by-line so file content containing the marker cannot
/// cause false splits) and parses each section independently. Empty
/// input yields an empty file list, never an error.
pub fn parse_diff(raw: &str, scope: DiffScope) -> ParseOutcome {
    let mut result = DiffResult::empty(scope);
    let mut failures = Vec::new();

    for section in split_sections(raw) {
        match parse_section(&section) {
            Ok(file) => result.files.push(file),
            Err(error) => failures.push(SectionFailure {
                path: boundary_paths(section[0]).map(|(_, new)| new),
                error,
            }),
        }
    }

    ParseOutcome { result, failures }
}

/// Split the document into file sections, one per `diff --git ` boundary.
/// Preamble lines before the first boundary are not part of any section.
fn split_sections(raw: &str) -> Vec<Vec<&str>> {
    let mut sections: Vec<Vec<&str>> = Vec::new();

    for line in raw.lines() {
        if line.starts_with("diff --git ") {
            sections.push(vec![line]);
        } else if let Some(current) = sections.last_mut() {
            current.push(line);
        }
    }

    sections
}

/// Parse one file section (boundary line, metadata, zero or more hunks).
fn parse_section(lines: &[&str]) -> Result<FileDiff, ParseError> {
    let header_paths = boundary_paths(lines[0]);

    let mut old_header: Option<String> = None;
    let mut new_header: Option<String> = None;
    let mut rename_from: Option<String> = None;
    let mut rename_to: Option<String> = None;
    let mut new_file = false;
    let mut deleted_file = false;
    let mut is_binary = false;
    let mut first_hunk: Option<usize> = None;

    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.starts_with("@@") {
            first_hunk = Some(i);
            break;
        }
        if let Some(rest) = line.strip_prefix("--- ") {
            old_header = Some(strip_side_prefix(rest, "a/"));
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            new_header = Some(strip_side_prefix(rest, "b/"));
        } else if let Some(rest) = line.strip_prefix("rename from ") {
            rename_from = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("rename to ") {
            rename_to = Some(rest.to_string());
        } else if line.starts_with("new file mode") {
            new_file = true;
        } else if line.starts_with("deleted file mode") {
            deleted_file = true;
        } else if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            is_binary = true;
        }
    }

    let saw_path_headers = old_header.is_some() && new_header.is_some();
    let has_rename = rename_from.is_some() && rename_to.is_some();

    // Resolve both side paths: explicit headers win, then rename markers,
    // then the boundary line.
    let old_side = old_header
        .clone()
        .or_else(|| rename_from.clone())
        .or_else(|| header_paths.as_ref().map(|(old, _)| old.clone()));
    let new_side = new_header
        .clone()
        .or_else(|| rename_to.clone())
        .or_else(|| header_paths.as_ref().map(|(_, new)| new.clone()));

    let (Some(old_side), Some(new_side)) = (old_side, new_side) else {
        return Err(ParseError::UnterminatedSection);
    };

    // Status priority: null-device sides first, then rename, then the
    // mode markers (which only matter when the path headers are absent,
    // e.g. binary sections).
    let status = if old_side == NULL_DEVICE || (new_file && !deleted_file && old_header.is_none()) {
        FileStatus::Added
    } else if new_side == NULL_DEVICE || (deleted_file && new_header.is_none()) {
        FileStatus::Deleted
    } else if has_rename && old_side != new_side {
        FileStatus::Renamed
    } else {
        FileStatus::Modified
    };

    // A deleted file's current path is its old-side path.
    let path = if status == FileStatus::Deleted {
        old_side.clone()
    } else {
        new_side.clone()
    };

    let mut file = FileDiff::new(path);
    file.status = status;
    if status == FileStatus::Renamed {
        file.old_path = Some(old_side);
    }

    if is_binary {
        file.is_binary = true;
        return Ok(file);
    }

    if let Some(start) = first_hunk {
        if !saw_path_headers {
            return Err(ParseError::UnterminatedSection);
        }
        file.hunks = parse_hunks(&lines[start..])?;
        file.recalculate_stats();
    }

    Ok(file)
}

/// Parse a run of hunks: each `@@` header plus its body lines up to the
/// next header or the end of the section.
fn parse_hunks(lines: &[&str]) -> Result<Vec<Hunk>, ParseError> {
    let mut hunks = Vec::new();
    let mut current: Option<(Hunk, u32, u32)> = None;

    for line in lines {
        if line.starts_with("@@") {
            if let Some((hunk, _, _)) = current.take() {
                hunks.push(hunk);
            }
            let hunk = parse_hunk_header(line)?;
            let counters = (hunk.old_start, hunk.new_start);
            current = Some((hunk, counters.0, counters.1));
        } else if let Some((hunk, old_counter, new_counter)) = current.as_mut() {
            if let Some(parsed) = classify_line(line, old_counter, new_counter) {
                hunk.lines.push(parsed);
            }
        }
    }

    if let Some((hunk, _, _)) = current {
        hunks.push(hunk);
    }

    Ok(hunks)
}

/// Parse one `@@ -oldStart[,oldLines] +newStart[,newLines] @@[ text]` header.
/// Omitted counts default to 1; trailing text is stored verbatim.
fn parse_hunk_header(line: &str) -> Result<Hunk, ParseError> {
    let malformed = || ParseError::MalformedHunkHeader {
        header: line.to_string(),
    };

    let rest = line.strip_prefix("@@ -").ok_or_else(malformed)?;
    let (old_range, rest) = rest.split_once(" +").ok_or_else(malformed)?;
    let (new_range, trailer) = rest.split_once(" @@").ok_or_else(malformed)?;

    let (old_start, old_lines) = parse_range(old_range).ok_or_else(malformed)?;
    let (new_start, new_lines) = parse_range(new_range).ok_or_else(malformed)?;

    let mut hunk = Hunk::new(old_start, old_lines, new_start, new_lines);
    hunk.header = trailer.strip_prefix(' ').unwrap_or(trailer).to_string();
    Ok(hunk)
}

/// Parse `start[,count]`, defaulting the count to 1 (single-line hunk).
fn parse_range(text: &str) -> Option<(u32, u32)> {
    match text.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((text.parse().ok()?, 1)),
    }
}

/// Classify one hunk body line and advance the per-side counters.
///
/// A completely empty line is a context line with empty content (diffs can
/// represent those). The `\ No newline at end of file` marker annotates
/// the previous line and consumes no counters, so it is dropped.
fn classify_line(raw: &str, old_counter: &mut u32, new_counter: &mut u32) -> Option<Line> {
    let marker = raw.as_bytes().first().copied().unwrap_or(b' ');
    match marker {
        b' ' => {
            let line = Line::context(content_after_marker(raw), *old_counter, *new_counter);
            *old_counter += 1;
            *new_counter += 1;
            Some(line)
        }
        b'+' => {
            let line = Line::added(content_after_marker(raw), *new_counter);
            *new_counter += 1;
            Some(line)
        }
        b'-' => {
            let line = Line::deleted(content_after_marker(raw), *old_counter);
            *old_counter += 1;
            Some(line)
        }
        // "\ No newline at end of file" and anything outside the grammar.
        _ => None,
    }
}

/// Strip the single-byte marker; empty lines have no marker to strip.
fn content_after_marker(raw: &str) -> &str {
    if raw.is_empty() {
        raw
    } else {
        &raw[1..]
    }
}

/// Strip the tool-added side prefix (`a/` or `b/`) from a header path,
/// unquoting C-style quoted paths first. `/dev/null` passes through.
fn strip_side_prefix(path: &str, prefix: &str) -> String {
    let unquoted = unquote_path(path.trim_end());
    unquoted
        .strip_prefix(prefix)
        .map(str::to_string)
        .unwrap_or(unquoted)
}

/// Parse `diff --git a/old b/new`, returning both paths without prefixes.
/// Used for failure reporting and as a fallback when a section carries no
/// `---`/`+++` headers (pure renames, mode-only changes).
fn boundary_paths(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("diff --git ")?;

    // Quoted paths come first when either side needs quoting.
    if rest.starts_with('"') {
        let first_end = find_closing_quote(rest)?;
        let remainder = rest.get(first_end + 2..)?;
        if remainder.starts_with('"') {
            let second_end = find_closing_quote(remainder)?;
            let old = strip_side_prefix(&rest[..=first_end], "a/");
            let new = strip_side_prefix(&remainder[..=second_end], "b/");
            return Some((old, new));
        }
        return None;
    }

    // Unquoted: paths may contain spaces, so split on the last " b/".
    let b_idx = rest.rfind(" b/")?;
    let old = strip_side_prefix(&rest[..b_idx], "a/");
    let new = strip_side_prefix(&rest[b_idx + 1..], "b/");
    Some((old, new))
}

/// Unquote a C-style quoted path (git quotes paths with special chars).
fn unquote_path(s: &str) -> String {
    if !(s.starts_with('"') && s.ends_with('"') && s.len() >= 2) {
        return s.to_string();
    }
    let inner = &s[1..s.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Find the index of the closing quote, accounting for escapes.
fn find_closing_quote(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}
