use std::path::Path;

use clap::Args;

use crate::output::OutputMode;
use crate::validate::validate_event_id;

use super::{check, render_commit, require_project, store_failure};

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Event id whose results are removed.
    pub event: String,
}

/// Execute `tally clear`: the event returns to pending.
pub fn run_clear(args: &ClearArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    check(output, validate_event_id(&args.event))?;

    let project = require_project(project_root, output)?;
    let mut store = project.open_store();
    match store.clear_event(&args.event) {
        Ok(commit) => render_commit(output, &format!("Cleared results for {}", args.event), commit),
        Err(err) => store_failure(output, &err),
    }
}
