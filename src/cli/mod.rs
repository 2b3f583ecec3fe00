//! Command-line interface: fetch, parse, and emit the diff as JSON.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::{
    ChangeHub, DiffScope, DiffService, ParseOutcome, PollerConfig, RepoRoot, StatusPoller,
    DEFAULT_CONTEXT,
};

/// Render pending git changes as structured, line-annotated JSON.
#[derive(Parser, Debug)]
#[command(name = "reviewdiff", version, about)]
pub struct Cli {
    /// Show staged changes (index vs HEAD)
    #[arg(long, conflicts_with_all = ["unstaged", "target"])]
    pub staged: bool,

    /// Show unstaged changes (working tree vs index)
    #[arg(long, conflicts_with = "target")]
    pub unstaged: bool,

    /// Diff target ref (e.g. 'main', 'HEAD~1', a commit hash); defaults to HEAD
    #[arg(short = 't', long, value_name = "REF")]
    pub target: Option<String>,

    /// Context lines around each hunk
    #[arg(short = 'U', long, value_name = "N", default_value_t = DEFAULT_CONTEXT)]
    pub context: u32,

    /// Emit only the diff for this file
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<String>,

    /// With --file: request full-file context so hunks span the whole file
    #[arg(long, requires = "file")]
    pub full: bool,

    /// Keep running and re-emit the diff whenever the repository changes
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Log change detection to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// The diff scope selected by the flags.
    pub fn scope(&self) -> DiffScope {
        if self.staged {
            DiffScope::Staged
        } else if self.unstaged {
            DiffScope::Unstaged
        } else {
            DiffScope::Target
        }
    }
}

/// Run the CLI to completion.
pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let repo = RepoRoot::discover(&cwd).context("not inside a git repository")?;
    let service = DiffService::new(repo.clone()).with_target(cli.target.clone());
    let scope = cli.scope();

    emit(&cli, &service, scope)?;

    if cli.watch {
        let hub = Arc::new(ChangeHub::new());
        let events = hub.subscribe();
        let poller = StatusPoller::spawn(
            repo,
            Arc::clone(&hub),
            PollerConfig {
                debug: cli.debug,
                ..PollerConfig::default()
            },
        );

        while let Ok(event) = events.recv() {
            if cli.debug {
                eprintln!("[watch] {:?}", event.kind);
            }
            // Transient failures (e.g. git locked mid-rebase, or the
            // selected file momentarily absent from the diff) must not
            // kill the watch; warn and wait for the next event.
            if let Err(e) = emit(&cli, &service, scope) {
                eprintln!("warning: {:#}", e);
            }
        }

        poller.stop();
    }

    Ok(())
}

/// Emit one snapshot of the requested diff to stdout.
fn emit(cli: &Cli, service: &DiffService, scope: DiffScope) -> Result<()> {
    if let Some(path) = &cli.file {
        let file = if cli.full {
            service.file_diff_full_context(path, scope)?
        } else {
            service.file_diff(path, scope)?
        };
        print_json(&file)
    } else {
        let outcome = service.diff_with_context(scope, cli.context)?;
        report_failures(&outcome);
        print_json(&outcome.result)
    }
}

/// Failed sections go to stderr; the parsed files are still emitted.
fn report_failures(outcome: &ParseOutcome) {
    for failure in &outcome.failures {
        match &failure.path {
            Some(path) => eprintln!("warning: could not parse diff for {}: {}", path, failure.error),
            None => eprintln!("warning: could not parse a diff section: {}", failure.error),
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("failed to encode JSON")?;
    writeln!(stdout)?;
    Ok(())
}
