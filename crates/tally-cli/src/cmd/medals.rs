//! `tally medals`: direct edits to a grade's medal counts.
//!
//! These bypass placement-derived aggregation. The next placement change
//! or `tally save` recomputes from placements and discards them.

use std::path::Path;

use clap::{Args, Subcommand};

use crate::output::OutputMode;
use crate::validate::{validate_grade, validate_medal};

use super::{check, render_commit, require_project, store_failure};

#[derive(Args, Debug)]
pub struct MedalsArgs {
    #[command(subcommand)]
    pub command: MedalsCommand,
}

#[derive(Subcommand, Debug)]
pub enum MedalsCommand {
    /// Overwrite one count. Non-numeric or negative values become 0.
    Set {
        grade: String,
        medal: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Add one medal.
    Add { grade: String, medal: String },
    /// Zero every count for one grade.
    Reset { grade: String },
}

pub fn run_medals(args: &MedalsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = require_project(project_root, output)?;

    let (result, action) = match &args.command {
        MedalsCommand::Set { grade, medal, value } => {
            let grade = check(output, validate_grade(grade))?;
            let medal = check(output, validate_medal(medal))?;
            let mut store = project.open_store();
            let result = store.set_medal_count(grade, medal, value);
            let count = store.snapshot().grades.get(&grade).map_or(0, |g| g.count(medal));
            (
                result,
                format!("{} {medal} set to {count}", grade.display_name()),
            )
        }
        MedalsCommand::Add { grade, medal } => {
            let grade = check(output, validate_grade(grade))?;
            let medal = check(output, validate_medal(medal))?;
            let mut store = project.open_store();
            (
                store.add_medal(grade, medal),
                format!("Added {medal} to {}", grade.display_name()),
            )
        }
        MedalsCommand::Reset { grade } => {
            let grade = check(output, validate_grade(grade))?;
            let mut store = project.open_store();
            (
                store.reset_grade(grade),
                format!("Reset medals for {}", grade.display_name()),
            )
        }
    };

    match result {
        Ok(commit) => render_commit(output, &action, commit),
        Err(err) => store_failure(output, &err),
    }
}
