pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::import::ImportTarget;

#[derive(Debug, Parser)]
#[command(
    name = "caliope",
    about = "Caliope operator CLI",
    long_about = "Operate the Caliope backend: migrations, demo data, config inspection, bulk catalog imports and loyalty lookups.",
    after_help = "Examples:\n  caliope migrate\n  caliope import services ./servicios.json\n  caliope level 1650"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog and demo users into the configured database")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Bulk import services or products from a JSON array file")]
    Import {
        #[arg(value_enum, help = "Which catalog to import into")]
        target: ImportTarget,
        #[arg(help = "Path to a JSON file holding an array of uploads")]
        file: PathBuf,
    },
    #[command(about = "Show the loyalty tier and progress for a point total")]
    Level {
        #[arg(help = "Accumulated loyalty points")]
        points: u64,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Import { target, file } => commands::import::run(target, &file),
        Command::Level { points } => commands::level::run(points),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
