use std::path::Path;

use clap::Args;

use crate::output::OutputMode;

use super::{render_commit, require_project};

#[derive(Args, Debug, Default)]
pub struct SaveArgs {}

/// Execute `tally save`: recompute from placements and commit, discarding
/// manual medal edits.
pub fn run_save(_args: &SaveArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = require_project(project_root, output)?;
    let mut store = project.open_store();
    let commit = store.save();
    render_commit(output, "Recomputed medals from placements and saved", commit)
}
