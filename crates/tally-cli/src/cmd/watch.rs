//! `tally watch`: the live leaderboard.
//!
//! Polls the slot and update trigger every `poll_interval_secs` and runs a
//! full bootstrap refresh every `refresh_interval_secs`. The standings are
//! redrawn only when a newer snapshot is adopted.

use std::cell::Cell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use tally_core::projection::build_standings_view;
use tally_core::store::{Store, SyncOutcome};
use tracing::{debug, info};

use crate::output::{OutputMode, render_mode};

use super::require_project;
use super::standings::{write_standings_pretty, write_standings_text};

const MIN_POLL: Duration = Duration::from_millis(250);

#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Render the current standings once and exit.
    #[arg(long)]
    pub once: bool,
}

pub fn run_watch(args: &WatchArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = require_project(project_root, output)?;
    let mut store = project.open_store();

    draw(&store, output)?;
    if args.once {
        return Ok(());
    }

    let dirty = Rc::new(Cell::new(false));
    let flag = Rc::clone(&dirty);
    let _subscription = store.subscribe(move |_| flag.set(true));

    let poll = project.config.watch.poll_interval().max(MIN_POLL);
    let refresh_every = project.config.watch.refresh_interval();
    let mut last_refresh = Instant::now();
    info!(poll_ms = poll.as_millis(), "watching for updates");

    loop {
        thread::sleep(poll);

        if let SyncOutcome::Updated { source } = store.sync() {
            debug!(?source, "leaderboard updated");
        }
        if !refresh_every.is_zero() && last_refresh.elapsed() >= refresh_every {
            last_refresh = Instant::now();
            store.refresh();
        }

        if dirty.replace(false) {
            draw(&store, output)?;
        }
    }
}

fn draw(store: &Store, output: OutputMode) -> anyhow::Result<()> {
    let view = build_standings_view(store.snapshot());
    if output.is_json() {
        // One object per line so consumers can stream updates.
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &view)?;
        writeln!(out)?;
        out.flush()?;
        return Ok(());
    }
    render_mode(output, &view, write_standings_text, write_standings_pretty)?;
    io::stdout().flush()?;
    Ok(())
}
