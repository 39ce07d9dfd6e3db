//! roster CLI - HTTP API for student records
//!
//! Subcommands:
//! - `serve`: run the REST API over Firestore (or an in-memory store)
//! - `completions`: generate shell completion scripts

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

mod commands;
mod config;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    author,
    version,
    about = "REST API for schema-less student records backed by Firestore"
)]
struct Cli {
    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces via OTLP (needs the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing: .env may supply PORT / ROSTER_HOST / RUST_LOG
    let env_files = config::load_dotenv();
    let cli = Cli::parse();

    let tracing_config = TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    };
    let _tracing = tracing_setup::init(&tracing_config)?;

    if env_files.is_empty() {
        debug!("No .env files found (current dir or ~/.roster)");
    } else {
        for path in &env_files {
            info!("Loaded configuration from {}", path.display());
        }
    }

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Completions(args) => run_completions(args),
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
