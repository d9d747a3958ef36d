use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tally_core::config::{self, ProjectConfig, TALLY_DIR};
use tally_core::store::{LoadOrigin, MemorySlot, load};

use crate::output::{OutputMode, pretty_kv, render};
use crate::source::resolve_seed;

use super::Project;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Bundled default to seed from: a JSON path or an http(s) URL.
    #[arg(long)]
    pub seed: Option<String>,

    /// Rewrite the config and reseed, discarding the stored scoreboard.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    root: PathBuf,
    config: PathBuf,
    seed: String,
    origin: LoadOrigin,
    events: usize,
    persisted: bool,
}

/// Execute `tally init`. Creates the project skeleton:
///
/// ```text
/// .tally/
///   config.toml            ([store] seed, [watch] intervals)
///   intramurals_data.json  (the stored snapshot)
/// ```
///
/// An existing stored scoreboard is kept unless `--force` is given.
///
/// # Errors
///
/// Returns an error if `.tally/config.toml` already exists and `--force` is
/// not set, or if the config cannot be written.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config_path = project_root.join(TALLY_DIR).join("config.toml");
    if config_path.exists() && !args.force {
        anyhow::bail!("{TALLY_DIR}/ already exists. Use `tally init --force` to reinitialize.");
    }

    let mut project_config = ProjectConfig::default();
    if let Some(seed) = &args.seed {
        project_config.store.seed.clone_from(seed);
    }
    let config_path = config::write_project_config(project_root, &project_config)?;

    let project = Project {
        root: project_root.to_path_buf(),
        config: project_config,
    };
    let mut store = project.open_store();

    let mut origin = store.origin();
    let mut persisted = true;
    if args.force || origin != LoadOrigin::Slot {
        if args.force {
            // Skip the stored copy and reseed from the bundled default.
            let source = resolve_seed(&project.root, &project.config.store.seed);
            let fresh = load(&MemorySlot::new(), Some(&*source), Utc::now());
            origin = fresh.origin;
            store.replace(fresh.snapshot);
        }
        persisted = store.commit().persisted;
    }

    tracing::info!(root = %project.root.display(), ?origin, "scoreboard initialized");

    let report = InitReport {
        root: project.root.clone(),
        config: config_path,
        seed: project.config.store.seed.clone(),
        origin,
        events: store.snapshot().sports.len(),
        persisted,
    };

    render(output, &report, |r, w| {
        writeln!(w, "✓ Initialized scoreboard in {}", r.root.display())?;
        pretty_kv(w, "config", r.config.display().to_string())?;
        pretty_kv(w, "seed", &r.seed)?;
        pretty_kv(w, "loaded from", origin_label(r.origin))?;
        pretty_kv(w, "events", r.events.to_string())?;
        if !r.persisted {
            writeln!(w, "  warning: snapshot could not be written to {TALLY_DIR}/")?;
        }
        Ok(())
    })
}

const fn origin_label(origin: LoadOrigin) -> &'static str {
    match origin {
        LoadOrigin::Slot => "existing scoreboard",
        LoadOrigin::Bundled => "bundled default",
        LoadOrigin::Fallback => "empty scoreboard (seed unavailable)",
    }
}
