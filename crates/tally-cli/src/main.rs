#![forbid(unsafe_code)]

mod cmd;
mod output;
mod source;
mod validate;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tally: intramurals medal scoreboard",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a scoreboard",
        long_about = "Create .tally/config.toml in the current directory and seed the data slot from the bundled default.",
        after_help = "EXAMPLES:\n    # Seed from intramurals_data.json next to .tally/\n    tally init\n\n    # Seed from a hosted file\n    tally init --seed https://example.org/intramurals_data.json\n\n    # Discard the stored data and reseed\n    tally init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Leaderboard",
        about = "Show the overall medal tally",
        long_about = "Rank grades by score (gold, silver and bronze weighted), then gold, silver, bronze.",
        after_help = "EXAMPLES:\n    # Show the standings\n    tally standings\n\n    # Emit machine-readable output\n    tally standings --json"
    )]
    Standings(cmd::standings::StandingsArgs),

    #[command(
        next_help_heading = "Leaderboard",
        about = "Show event results by category",
        long_about = "List events grouped by subcategory with their podiums. Pending events show TBD.",
        after_help = "EXAMPLES:\n    # All events\n    tally results\n\n    # One category\n    tally results team-sports\n\n    # Tab-separated rows for scripts\n    tally results athletics --format text"
    )]
    Results(cmd::results::ResultsArgs),

    #[command(
        next_help_heading = "Leaderboard",
        about = "Show scoreboard statistics",
        long_about = "Totals, completed and pending events, the gold value, and grades whose counts were edited by hand.",
        after_help = "EXAMPLES:\n    # Show stats\n    tally stats\n\n    # Emit machine-readable output\n    tally stats --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Leaderboard",
        about = "Follow the standings live",
        long_about = "Redraw the standings whenever another admin saves a change.",
        after_help = "EXAMPLES:\n    # Follow updates\n    tally watch\n\n    # Print once and exit\n    tally watch --once\n\n    # Stream one JSON object per update\n    tally watch --json"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        next_help_heading = "Results",
        about = "Record a podium position",
        long_about = "Assign a grade to first, second or third place in an event and recompute medals. Omit the grade to clear the position.",
        after_help = "EXAMPLES:\n    # Grade 9 wins basketball\n    tally place basketball-boys 1 grade-9\n\n    # Clear third place\n    tally place basketball-boys 3"
    )]
    Place(cmd::place::PlaceArgs),

    #[command(
        next_help_heading = "Results",
        about = "Clear an event's results",
        long_about = "Remove every placement from an event and recompute medals.",
        after_help = "EXAMPLES:\n    # Reset one event to pending\n    tally clear chess"
    )]
    Clear(cmd::clear::ClearArgs),

    #[command(
        next_help_heading = "Results",
        about = "Edit medal counts directly",
        long_about = "Overwrite, increment or zero a grade's medal counts without touching placements. The next placement change or save recomputes from placements.",
        after_help = "EXAMPLES:\n    # Set Grade 8 gold to 4\n    tally medals set grade-8 gold 4\n\n    # Add a bronze\n    tally medals add grade-10 bronze\n\n    # Zero Grade 7\n    tally medals reset grade-7"
    )]
    Medals(cmd::medals::MedalsArgs),

    #[command(
        next_help_heading = "Results",
        about = "Clear all results",
        long_about = "Zero every grade and remove every event's placements.",
        after_help = "EXAMPLES:\n    # Start the competition over\n    tally reset --yes"
    )]
    Reset(cmd::reset::ResetArgs),

    #[command(
        next_help_heading = "Results",
        about = "Recompute and save",
        long_about = "Recompute medals from placements and persist, discarding manual medal edits.",
        after_help = "EXAMPLES:\n    # Save\n    tally save"
    )]
    Save(cmd::save::SaveArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tally completions bash\n\n    # Generate zsh completions\n    tally completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Filter used when `TALLY_LOG` is unset. `-q` beats `-v` and `DEBUG`.
const fn default_filter(verbose: bool, quiet: bool, debug_env: bool) -> &'static str {
    if quiet {
        "warn"
    } else if verbose || debug_env {
        "tally=debug,info"
    } else {
        "tally=info,warn"
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_filter(verbose, quiet, env::var("DEBUG").is_ok()))
    });

    let format = env::var("TALLY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    if cli.verbose {
        debug!("verbose logging enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::Standings(args) => cmd::standings::run_standings(args, output, &project_root),
        Commands::Results(args) => cmd::results::run_results(args, output, &project_root),
        Commands::Stats(args) => cmd::stats::run_stats(args, output, &project_root),
        Commands::Watch(args) => cmd::watch::run_watch(args, output, &project_root),
        Commands::Place(args) => cmd::place::run_place(args, output, &project_root),
        Commands::Clear(args) => cmd::clear::run_clear(args, output, &project_root),
        Commands::Medals(args) => cmd::medals::run_medals(args, output, &project_root),
        Commands::Reset(args) => cmd::reset::run_reset(args, output, &project_root),
        Commands::Save(args) => cmd::save::run_save(args, output, &project_root),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
