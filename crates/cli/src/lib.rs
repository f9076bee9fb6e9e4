pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pengadaan",
    about = "Pengadaan operator CLI",
    long_about = "Inspect bearer tokens, approval step tables, effective configuration, and live submissions.",
    after_help = "Examples:\n  pengadaan token <jwt>\n  pengadaan status --step 4\n  pengadaan fetch --id PB-2024-001 --token <jwt>"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Decode a bearer token and report role, branch, and validity")]
    Token { token: String },
    #[command(about = "Describe an approval step code for either flow variant")]
    Status {
        #[arg(long)]
        step: i64,
        #[arg(long, help = "Use the partner branch (kerja sama) step table")]
        partner: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Fetch one submission, or a branch's submission list, from the backend")]
    Fetch {
        #[arg(long, help = "Submission id; omit to list submissions instead")]
        id: Option<String>,
        #[arg(long, help = "Branch filter for list mode")]
        branch: Option<u32>,
        #[arg(long)]
        token: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Token { token } => commands::token::run(&token),
        Command::Status { step, partner } => commands::status::run(step, partner),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Fetch { id, branch, token } => {
            commands::fetch::run(id.as_deref(), branch, &token)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
