pub mod clear;
pub mod completions;
pub mod init;
pub mod medals;
pub mod place;
pub mod reset;
pub mod results;
pub mod save;
pub mod standings;
pub mod stats;
pub mod watch;

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tally_core::config::{self, ProjectConfig, TALLY_DIR};
use tally_core::error::ErrorCode;
use tally_core::store::{CommitReport, FileSlot, Store, StoreError, Unavailable};

use crate::output::{CliError, OutputMode, render, render_error};
use crate::source::resolve_seed;
use crate::validate::ValidationError;

/// An initialized scoreboard directory and its config.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn slot(&self) -> FileSlot {
        FileSlot::new(self.root.join(TALLY_DIR))
    }

    /// Open the store. The CLI has no live channel between processes, so
    /// commits fall back to the update trigger and readers poll.
    pub fn open_store(&self) -> Store {
        Store::open(
            self.slot(),
            Unavailable,
            Some(resolve_seed(&self.root, &self.config.store.seed)),
        )
    }
}

/// Locate the project containing `start`, reporting a structured error
/// when there is none.
pub fn require_project(start: &Path, output: OutputMode) -> anyhow::Result<Project> {
    let Some(root) = config::find_project_root(start) else {
        render_error(
            output,
            &CliError::with_code(
                format!("no {TALLY_DIR}/ directory in {} or its parents", start.display()),
                ErrorCode::NotInitialized,
            ),
        )?;
        anyhow::bail!("scoreboard not initialized");
    };

    match config::load_project_config(&root) {
        Ok(config) => Ok(Project { root, config }),
        Err(err) => {
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            Err(err)
        }
    }
}

/// Unwrap a validated argument or report it and stop.
pub fn check<T>(output: OutputMode, result: Result<T, ValidationError>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            render_error(output, &err.to_cli_error())?;
            anyhow::bail!("invalid {}", err.field)
        }
    }
}

/// Report a rejected mutation and stop.
pub fn store_failure(output: OutputMode, err: &StoreError) -> anyhow::Result<()> {
    render_error(output, &CliError::with_code(err.to_string(), err.code()))?;
    anyhow::bail!("{err}")
}

#[derive(Debug, Serialize)]
struct MutationOutput<'a> {
    ok: bool,
    action: &'a str,
    #[serde(flatten)]
    commit: CommitReport,
}

/// Report a committed admin change.
pub fn render_commit(output: OutputMode, action: &str, commit: CommitReport) -> anyhow::Result<()> {
    let payload = MutationOutput {
        ok: true,
        action,
        commit,
    };
    render(output, &payload, |p, w| {
        writeln!(w, "✓ {}", p.action)?;
        if !p.commit.persisted {
            writeln!(
                w,
                "  warning: not saved to disk ({}); change kept in memory only",
                ErrorCode::SlotWriteFailed.code()
            )?;
        }
        Ok(())
    })
}
