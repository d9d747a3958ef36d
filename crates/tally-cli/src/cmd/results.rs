//! `tally results`: event results under one category tab.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use tally_core::aggregate::{CategoryFilter, EventStatus};
use tally_core::projection::{CategoryView, EventCard, build_category_view};

use crate::output::{OutputMode, pretty_section, render_mode};
use crate::validate::validate_filter;

use super::{check, require_project};

#[derive(Args, Debug, Default)]
pub struct ResultsArgs {
    /// Category tab: all, team-sports, athletics, individual-dual-sports,
    /// e-sports, martial-arts, creative-arts.
    pub filter: Option<String>,
}

pub fn run_results(args: &ResultsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let filter = match args.filter.as_deref() {
        Some(raw) => check(output, validate_filter(raw))?,
        None => CategoryFilter::All,
    };

    let project = require_project(project_root, output)?;
    let store = project.open_store();
    let view = build_category_view(store.snapshot(), filter);
    render_mode(output, &view, write_results_text, write_results_pretty)
}

fn podium_cells(card: &EventCard) -> Vec<String> {
    card.podium.as_ref().map_or_else(Vec::new, |podium| {
        podium.iter().map(|slot| slot.grade.clone()).collect()
    })
}

fn write_results_text(view: &CategoryView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "subcategory\tevent\tname\tstatus\tgold\tsilver\tbronze")?;
    for group in &view.groups {
        for card in &group.events {
            let podium = podium_cells(card);
            let cell = |i: usize| podium.get(i).map_or("-", String::as_str);
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                group.subcategory,
                card.id,
                card.name,
                status_label(card.status),
                cell(0),
                cell(1),
                cell(2)
            )?;
        }
    }
    Ok(())
}

fn write_results_pretty(view: &CategoryView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, view.title)?;
    writeln!(w, "{}", view.description)?;
    if view.groups.is_empty() {
        writeln!(w)?;
        return writeln!(w, "No events in this category yet.");
    }

    for group in &view.groups {
        writeln!(w)?;
        writeln!(w, "{}", group.subcategory)?;
        for card in &group.events {
            match &card.podium {
                Some(podium) => {
                    writeln!(w, "  {:<32} completed", card.name)?;
                    for slot in podium {
                        writeln!(w, "    {}  {}", slot.position.medal(), slot.grade)?;
                    }
                }
                None => writeln!(w, "  {:<32} pending", card.name)?,
            }
        }
    }
    Ok(())
}

const fn status_label(status: EventStatus) -> &'static str {
    match status {
        EventStatus::Pending => "pending",
        EventStatus::Completed => "completed",
    }
}
