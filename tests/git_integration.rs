//! Integration tests with real git repositories.

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use reviewdiff::core::{
    changed_paths, file_content, ChangeHub, ChangeKind, DiffScope, DiffService, FileStatus,
    PollerConfig, QueryError, RepoRoot, StatusPoller,
};

fn git(dir: &TempDir, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a temporary git repo with one committed file.
fn create_test_repo() -> TempDir {
    let dir = TempDir::new().unwrap();

    git(&dir, &["init"]);
    git(&dir, &["config", "user.email", "test@test.com"]);
    git(&dir, &["config", "user.name", "Test"]);

    std::fs::write(dir.path().join("file.txt"), "one\ntwo\nthree\nfour\nfive\n").unwrap();
    git(&dir, &["add", "."]);
    git(&dir, &["commit", "-m", "initial"]);

    dir
}

fn service_for(dir: &TempDir) -> DiffService {
    let repo = RepoRoot::discover(dir.path()).unwrap();
    DiffService::new(repo)
}

#[test]
fn clean_repo_has_empty_diff() {
    let dir = create_test_repo();
    let service = service_for(&dir);

    let outcome = service.diff(DiffScope::Target).unwrap();
    assert!(outcome.result.files.is_empty());
    assert!(outcome.is_complete());
}

#[test]
fn unstaged_modification_is_parsed() {
    let dir = create_test_repo();
    std::fs::write(dir.path().join("file.txt"), "one\nTWO\nthree\nfour\nfive\n").unwrap();

    let service = service_for(&dir);
    let outcome = service.diff(DiffScope::Unstaged).unwrap();

    assert_eq!(outcome.result.files.len(), 1);
    let file = &outcome.result.files[0];
    assert_eq!(file.path, "file.txt");
    assert_eq!(file.status, FileStatus::Modified);
    assert_eq!(file.additions, 1);
    assert_eq!(file.deletions, 1);

    // Hunk starts at line 1 with the default 3 lines of context.
    let hunk = &file.hunks[0];
    assert_eq!(hunk.old_start, 1);
    let deleted = hunk
        .lines
        .iter()
        .find(|l| l.old_number.is_some() && l.new_number.is_none())
        .unwrap();
    assert_eq!(deleted.content, "two");
    assert_eq!(deleted.old_number, Some(2));
}

#[test]
fn staged_and_unstaged_scopes_are_disjoint() {
    let dir = create_test_repo();
    std::fs::write(dir.path().join("file.txt"), "one\nTWO\nthree\nfour\nfive\n").unwrap();
    git(&dir, &["add", "file.txt"]);

    let service = service_for(&dir);
    let staged = service.diff(DiffScope::Staged).unwrap();
    let unstaged = service.diff(DiffScope::Unstaged).unwrap();

    assert_eq!(staged.result.files.len(), 1);
    assert_eq!(staged.result.scope, DiffScope::Staged);
    assert!(unstaged.result.files.is_empty());
}

#[test]
fn staged_new_file_is_added() {
    let dir = create_test_repo();
    std::fs::write(dir.path().join("new.txt"), "alpha\nbeta\n").unwrap();
    git(&dir, &["add", "new.txt"]);

    let service = service_for(&dir);
    let outcome = service.diff(DiffScope::Staged).unwrap();

    let file = &outcome.result.files[0];
    assert_eq!(file.path, "new.txt");
    assert_eq!(file.status, FileStatus::Added);
    assert_eq!(file.additions, 2);
    assert!(file
        .hunks
        .iter()
        .flat_map(|h| &h.lines)
        .all(|l| l.old_number.is_none()));
}

#[test]
fn deleted_file_against_head() {
    let dir = create_test_repo();
    std::fs::remove_file(dir.path().join("file.txt")).unwrap();

    let service = service_for(&dir);
    let outcome = service.diff(DiffScope::Target).unwrap();

    let file = &outcome.result.files[0];
    assert_eq!(file.path, "file.txt");
    assert_eq!(file.status, FileStatus::Deleted);
    assert_eq!(file.deletions, 5);
    assert_eq!(file.additions, 0);
}

#[test]
fn pure_rename_has_no_hunks() {
    let dir = create_test_repo();
    git(&dir, &["mv", "file.txt", "renamed.txt"]);

    let service = service_for(&dir);
    let outcome = service.diff(DiffScope::Staged).unwrap();

    let file = &outcome.result.files[0];
    assert_eq!(file.status, FileStatus::Renamed);
    assert_eq!(file.path, "renamed.txt");
    assert_eq!(file.old_path.as_deref(), Some("file.txt"));
    assert!(file.hunks.is_empty());
}

#[test]
fn binary_file_has_no_hunks() {
    let dir = create_test_repo();
    std::fs::write(dir.path().join("blob.bin"), [0u8, 159, 146, 150, 0, 7]).unwrap();
    git(&dir, &["add", "blob.bin"]);

    let service = service_for(&dir);
    let outcome = service.diff(DiffScope::Staged).unwrap();

    let file = &outcome.result.files[0];
    assert_eq!(file.path, "blob.bin");
    assert!(file.is_binary);
    assert!(file.hunks.is_empty());
    assert_eq!(file.additions, 0);
    assert_eq!(file.deletions, 0);
}

#[test]
fn file_diff_selects_by_path() {
    let dir = create_test_repo();
    std::fs::write(dir.path().join("file.txt"), "one\nTWO\nthree\nfour\nfive\n").unwrap();
    std::fs::write(dir.path().join("other.txt"), "hello\n").unwrap();
    git(&dir, &["add", "other.txt"]);

    let service = service_for(&dir);
    let file = service.file_diff("file.txt", DiffScope::Target).unwrap();
    assert_eq!(file.path, "file.txt");
    assert_eq!(file.status, FileStatus::Modified);
}

#[test]
fn file_diff_not_found_is_distinct() {
    let dir = create_test_repo();
    let service = service_for(&dir);

    let err = service
        .file_diff("missing.txt", DiffScope::Target)
        .unwrap_err();
    assert!(matches!(err, QueryError::NotFound { ref path } if path == "missing.txt"));
}

#[test]
fn full_context_spans_whole_file() {
    let dir = create_test_repo();
    std::fs::write(dir.path().join("file.txt"), "one\ntwo\nthree\nfour\nFIVE\n").unwrap();

    let service = service_for(&dir);
    let file = service
        .file_diff_full_context("file.txt", DiffScope::Unstaged)
        .unwrap();

    // One hunk covering every line of the file.
    assert_eq!(file.hunks.len(), 1);
    let hunk = &file.hunks[0];
    assert_eq!(hunk.old_start, 1);
    assert_eq!(hunk.old_lines, 5);
    assert_eq!(hunk.new_lines, 5);
    assert_eq!(hunk.lines.len(), 6); // 4 context + 1 deletion + 1 addition
}

#[test]
fn file_content_reads_head_and_worktree() {
    let dir = create_test_repo();
    let repo = RepoRoot::discover(dir.path()).unwrap();

    // Committed file comes from HEAD even after local edits.
    std::fs::write(dir.path().join("file.txt"), "local edit\n").unwrap();
    let content = file_content(&repo, "file.txt").unwrap();
    assert_eq!(content, "one\ntwo\nthree\nfour\nfive\n");

    // Uncommitted file falls back to the working tree.
    std::fs::write(dir.path().join("untracked.txt"), "not committed\n").unwrap();
    let content = file_content(&repo, "untracked.txt").unwrap();
    assert_eq!(content, "not committed\n");
}

#[test]
fn changed_paths_lists_pending_files() {
    let dir = create_test_repo();
    std::fs::write(dir.path().join("file.txt"), "edited\n").unwrap();
    std::fs::write(dir.path().join("fresh.txt"), "new\n").unwrap();

    let repo = RepoRoot::discover(dir.path()).unwrap();
    let mut paths = changed_paths(&repo).unwrap();
    paths.sort();
    assert_eq!(paths, vec!["file.txt".to_string(), "fresh.txt".to_string()]);
}

#[test]
fn changed_paths_reports_rename_destination() {
    let dir = create_test_repo();
    git(&dir, &["mv", "file.txt", "renamed.txt"]);

    let repo = RepoRoot::discover(dir.path()).unwrap();
    let paths = changed_paths(&repo).unwrap();
    assert_eq!(paths, vec!["renamed.txt".to_string()]);
}

#[test]
fn watch_mode_survives_a_failed_emission() {
    let dir = create_test_repo();
    // An unstaged change so the initial emission succeeds.
    std::fs::write(dir.path().join("file.txt"), "one\nTWO\nthree\nfour\nfive\n").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_reviewdiff"))
        .args(["--watch", "--unstaged", "--file", "file.txt"])
        .current_dir(dir.path())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();

    // Give the poller time to take its baseline snapshot, then revert the
    // change: the next emission finds no diff for the file and fails, but
    // the watch loop must keep running.
    std::thread::sleep(Duration::from_millis(2500));
    std::fs::write(dir.path().join("file.txt"), "one\ntwo\nthree\nfour\nfive\n").unwrap();
    std::thread::sleep(Duration::from_millis(2500));

    assert!(child.try_wait().unwrap().is_none(), "watch loop exited");
    child.kill().unwrap();
    child.wait().unwrap();
}

#[test]
fn poller_publishes_on_new_untracked_file() {
    let dir = create_test_repo();
    let repo = RepoRoot::discover(dir.path()).unwrap();

    let hub = Arc::new(ChangeHub::new());
    let events = hub.subscribe();
    let poller = StatusPoller::spawn(
        repo,
        Arc::clone(&hub),
        PollerConfig {
            interval: Duration::from_millis(50),
            debug: false,
        },
    );

    // Let the poller take its baseline snapshot before changing anything.
    std::thread::sleep(Duration::from_millis(300));
    std::fs::write(dir.path().join("appeared.txt"), "hi\n").unwrap();

    let event = events.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event.kind, ChangeKind::FileAdded);

    poller.stop();
}
