use std::path::PathBuf;

use clap::{Parser, Subcommand};
use migrant::config::SpaceArgs;
use migrant::output::Format;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "migrant",
    version,
    long_version = migrant::build_info::long_version(),
    about = "Reconcile Assembla export dumps ahead of a Jira import"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    format: Format,
    /// Shorthand for --format json
    #[arg(long, global = true, hide = true)]
    json: bool,
    /// Diagnostic log filter written to stderr (overridden by RUST_LOG)
    #[arg(long, global = true, env = "MIGRANT_LOG", default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank users by activity across the exported tables
    ReportUsers {
        #[command(flatten)]
        space: SpaceArgs,
        /// YAML file overriding the tracked user-reference columns
        #[arg(long, env = "MIGRANT_SOURCES")]
        sources: Option<PathBuf>,
    },
    /// Show the tracked tables and the report columns they produce
    Sources {
        /// YAML file overriding the tracked user-reference columns
        #[arg(long, env = "MIGRANT_SOURCES")]
        sources: Option<PathBuf>,
    },
    /// Match exported comments to imported Jira issues (no API calls)
    PlanComments {
        #[command(flatten)]
        space: SpaceArgs,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("migrant={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: Cli, format: Format) -> migrant::error::Result<()> {
    match cli.command {
        Commands::ReportUsers { space, sources } => {
            migrant::commands::report::run(&space, sources.as_deref(), format)
        }
        Commands::Sources { sources } => {
            migrant::commands::sources::run(sources.as_deref(), format)
        }
        Commands::PlanComments { space } => migrant::commands::comments::run(&space, format),
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let format = if cli.json { Format::Json } else { cli.format };
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
