//! `tally place`: record or clear one podium position.

use std::path::Path;

use clap::Args;

use crate::output::OutputMode;
use crate::validate::{validate_event_id, validate_grade, validate_position};

use super::{check, render_commit, require_project, store_failure};

#[derive(Args, Debug)]
pub struct PlaceArgs {
    /// Event id, e.g. `basketball-boys`.
    pub event: String,

    /// Podium position: 1, 2, or 3 (or gold/silver/bronze).
    pub position: String,

    /// Winning grade (grade-7 .. grade-10). Omit to clear the position.
    pub grade: Option<String>,
}

pub fn run_place(args: &PlaceArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    check(output, validate_event_id(&args.event))?;
    let position = check(output, validate_position(&args.position))?;
    let grade = match args.grade.as_deref() {
        Some(raw) => Some(check(output, validate_grade(raw))?),
        None => None,
    };

    let project = require_project(project_root, output)?;
    let mut store = project.open_store();
    let commit = match store.set_placement(&args.event, position, grade) {
        Ok(commit) => commit,
        Err(err) => return store_failure(output, &err),
    };

    let action = grade.map_or_else(
        || format!("Cleared {} place in {}", position.medal(), args.event),
        |grade| {
            format!(
                "{} takes {} in {}",
                grade.display_name(),
                position.medal(),
                args.event
            )
        },
    );
    render_commit(output, &action, commit)
}
