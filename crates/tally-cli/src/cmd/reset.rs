use std::path::Path;

use clap::Args;

use crate::output::OutputMode;

use super::{render_commit, require_project};

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm wiping every result and medal count.
    #[arg(long)]
    pub yes: bool,
}

/// Execute `tally reset`: zero all grades and empty every event's results.
pub fn run_reset(args: &ResetArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    if !args.yes {
        anyhow::bail!("`tally reset` clears all results and medals; rerun with --yes to confirm.");
    }

    let project = require_project(project_root, output)?;
    let mut store = project.open_store();
    let commit = store.reset_all();
    render_commit(output, "Cleared all results and medal counts", commit)
}
