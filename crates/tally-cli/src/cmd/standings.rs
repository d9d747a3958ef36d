//! `tally standings`: the overall medal tally.

use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use clap::Args;
use tally_core::projection::{StandingsView, build_standings_view};

use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

use super::require_project;

#[derive(Args, Debug, Default)]
pub struct StandingsArgs {}

pub fn run_standings(
    _args: &StandingsArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = require_project(project_root, output)?;
    let store = project.open_store();
    let view = build_standings_view(store.snapshot());
    render_mode(output, &view, write_standings_text, write_standings_pretty)
}

pub fn write_standings_text(view: &StandingsView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "rank\tgrade\tgold\tsilver\tbronze\ttotal\tscore")?;
    for row in &view.rows {
        let s = &row.standing;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.rank, s.grade, s.gold, s.silver, s.bronze, s.total_medals, s.total_score
        )?;
    }
    Ok(())
}

pub fn write_standings_pretty(view: &StandingsView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Overall Medal Tally")?;
    writeln!(
        w,
        "{:<8} {:<10} {:>5} {:>6} {:>6} {:>6} {:>6}",
        "", "GRADE", "GOLD", "SILVER", "BRONZE", "TOTAL", "SCORE"
    )?;
    for row in &view.rows {
        let s = &row.standing;
        let marker = row
            .badge
            .map_or_else(|| row.rank.to_string(), |b| format!("{} {}", b.name(), row.rank));
        writeln!(
            w,
            "{:<8} {:<10} {:>5} {:>6} {:>6} {:>6} {:>6}",
            marker, s.name, s.gold, s.silver, s.bronze, s.total_medals, s.total_score
        )?;
    }
    pretty_rule(w)?;
    let values = view.medal_values;
    writeln!(
        w,
        "Points: gold {} / silver {} / bronze {}   Updated {}",
        values.gold,
        values.silver,
        values.bronze,
        view.last_updated.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tally_core::model::Snapshot;

    #[test]
    fn text_has_header_and_one_row_per_grade() {
        let view = build_standings_view(&Snapshot::empty(Utc::now()));
        let mut buf = Vec::new();
        write_standings_text(&view, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "1\tgrade-7\t0\t0\t0\t0\t0");
    }

    #[test]
    fn pretty_marks_top_three() {
        let view = build_standings_view(&Snapshot::empty(Utc::now()));
        let mut buf = Vec::new();
        write_standings_pretty(&view, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("crown 1"));
        assert!(text.contains("medal 2"));
        assert!(text.contains("award 3"));
        assert!(text.is_ascii());
        assert!(text.contains("Grade 10"));
    }
}
