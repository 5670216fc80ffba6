use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dwp")]
#[command(about = "Delivery-window order promoter CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base first)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Evaluate one delivery date / time slot pair without touching any order
    Evaluate {
        /// Delivery date metadata, e.g. "mardi 14 mars 2024"
        #[arg(long)]
        date: Option<String>,

        /// Time slot metadata, e.g. "09:00 - 09:30" (no '-' means ASAP)
        #[arg(long)]
        slot: Option<String>,

        /// Evaluation instant (RFC 3339). Defaults to the current time.
        #[arg(long)]
        now: Option<String>,

        /// "local" or an IANA zone name. Overrides window.timezone.
        #[arg(long)]
        timezone: Option<String>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Run a single promotion pass over a JSON order file
    RunOnce {
        /// JSON array of orders; rewritten in place unless --dry-run
        #[arg(long)]
        orders: String,

        /// Evaluation instant (RFC 3339). Defaults to the current time.
        #[arg(long)]
        now: Option<String>,

        /// Report what would be promoted; never write the order file.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the full pass report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = dwp_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Evaluate {
            date,
            slot,
            now,
            timezone,
            config_paths,
        } => commands::evaluate::run(commands::evaluate::EvaluateArgs {
            date,
            slot,
            now,
            timezone,
            config_paths,
        })?,

        Commands::RunOnce {
            orders,
            now,
            dry_run,
            json,
            config_paths,
        } => commands::run_once::run(commands::run_once::RunOnceArgs {
            orders,
            now,
            dry_run,
            json,
            config_paths,
        })?,
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only command output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
