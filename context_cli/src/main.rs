//! contextctl: inspect editor context snapshots

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use context_cli::{check, normalize, read_input, resolve_policy, summarize_bytes};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Editor context snapshot tool
#[derive(Parser, Debug)]
#[command(name = "contextctl")]
#[command(about = "Validate, normalize and inspect editor context snapshots")]
struct Args {
    /// Host config file (JSON) supplying the validation policy
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Reject inconsistent snapshots
    #[arg(long, global = true, conflicts_with = "lenient")]
    strict: bool,

    /// Repair inconsistent snapshots
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode and validate a snapshot
    Check {
        /// Snapshot file, `-` for stdin
        file: PathBuf,
    },
    /// Re-encode a snapshot after applying the policy
    Normalize {
        /// Snapshot file, `-` for stdin
        file: PathBuf,

        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },
    /// Print mode, terminal size, buffers and latest command
    Summary {
        /// Snapshot file, `-` for stdin
        file: PathBuf,
    },
}

fn setup_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    setup_tracing();

    let policy = resolve_policy(args.config.as_deref(), args.strict, args.lenient)?;
    tracing::debug!(policy = %policy, "resolved policy");

    match args.command {
        Command::Check { file } => {
            let outcome = check(&read_input(&file)?, policy);
            println!("{}", outcome);
            Ok(if outcome.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Normalize { file, pretty } => {
            let bytes = normalize(&read_input(&file)?, policy, pretty)
                .with_context(|| format!("cannot normalize {}", file.display()))?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            writeln!(stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Summary { file } => {
            let text = summarize_bytes(&read_input(&file)?)
                .with_context(|| format!("cannot summarize {}", file.display()))?;
            print!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
    }
}
