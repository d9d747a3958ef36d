//! `tally stats`: headline numbers and manual-override report.

use std::io::Write;
use std::path::Path;

use chrono::Local;
use clap::Args;
use serde::Serialize;
use tally_core::projection::{StatsView, build_stats_view};
use tally_core::store::LoadOrigin;

use crate::output::{OutputMode, pretty_kv, pretty_section, render};

use super::require_project;

#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

#[derive(Debug, Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: StatsView,
    origin: LoadOrigin,
}

pub fn run_stats(_args: &StatsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = require_project(project_root, output)?;
    let store = project.open_store();
    let report = StatsReport {
        stats: build_stats_view(store.snapshot()),
        origin: store.origin(),
    };

    render(output, &report, |report, w| render_stats_human(report, w))
}

fn render_stats_human(report: &StatsReport, w: &mut dyn Write) -> std::io::Result<()> {
    let stats = &report.stats;
    pretty_section(w, "Scoreboard")?;
    pretty_kv(w, "grades", stats.total_grades.to_string())?;
    pretty_kv(w, "events", stats.total_events.to_string())?;
    pretty_kv(w, "completed", stats.completed_events.to_string())?;
    pretty_kv(w, "pending", stats.pending_events.to_string())?;
    pretty_kv(w, "gold value", format!("{} pts", stats.gold_value))?;
    pretty_kv(
        w,
        "last updated",
        stats
            .last_updated
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )?;

    if !stats.manual_overrides.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Manual overrides")?;
        for drift in &stats.manual_overrides {
            writeln!(
                w,
                "{:<10} {:<7} stored {:>3}  from placements {:>3}",
                drift.grade.key(),
                drift.medal.to_string(),
                drift.stored,
                drift.derived
            )?;
        }
        writeln!(w, "Run `tally save` to recompute from placements.")?;
    }
    Ok(())
}
