//! Maestro CLI - compose, transcribe and edit procedures
//!
//! ```text
//! maestro compose --all
//! maestro compose --html --markdown procedures/airlock-egress.yml
//! maestro transcribe -i incoming/EV1-1234.xml
//! maestro edit -f procedures/airlock-egress.yml move 1 0
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{ComposeArgs, EditArgs, TranscribeArgs};

/// Maestro command line
#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(about = "Compose procedure documents and transcribe them back", long_about = None)]
#[command(version)]
struct Cli {
    /// Project directory holding procedures/ and tasks/
    #[arg(short, long, default_value = ".", global = true)]
    project: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render stored definitions into output formats
    Compose(ComposeArgs),

    /// Turn a rendered document back into a stored definition
    Transcribe(TranscribeArgs),

    /// Apply a structural edit and print the timeline
    Edit(EditArgs),
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let config = maestro_core::MaestroConfig::load(&cli.project).await?;
    tracing::debug!(project = %cli.project.display(), ?config, "loaded configuration");
    match cli.command {
        Commands::Compose(args) => commands::compose(&cli.project, &config, args).await,
        Commands::Transcribe(args) => commands::transcribe(&cli.project, &config, args).await,
        Commands::Edit(args) => commands::edit(&cli.project, &config, args).await,
    }
}
