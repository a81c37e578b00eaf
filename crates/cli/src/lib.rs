pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "roomy",
    about = "Roomy operator CLI",
    long_about = "Operate Roomy runtime readiness, config inspection, slot previews, and smoke validation.",
    after_help = "Examples:\n  roomy doctor --json\n  roomy config\n  roomy slots --date 2025-06-10\n  roomy smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run end-to-end booking checks against an in-memory engine")]
    Smoke,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Preview the bookable slots for a date under the configured window")]
    Slots {
        #[arg(long, help = "Date to preview (YYYY-MM-DD); defaults to today")]
        date: Option<String>,
    },
    #[command(about = "Validate config and slot-window readiness checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Smoke => commands::smoke::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Slots { date } => commands::slots::run(date.as_deref()),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
