mod commands;
mod config;
mod input;
mod logging;
mod output;
mod session_file;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

use commands::credit_limit::CreditLimitArgs;
use commands::deals::{DealsArgs, DeleteArgs, ExportArgs, LoginArgs, UnstageArgs};
use commands::murabahah::MurabahahArgs;
use commands::profit::{ProfitArgs, StageArgs};

/// Credit limit, deal profitability and Murabahah calculations
#[derive(Parser)]
#[command(
    name = "aet",
    version,
    about = "Account executive toolkit: credit limits, deal profitability and Murabahah schedules",
    long_about = "A CLI for account executives evaluating trade-credit applicants and \
                  financing deals with decimal precision. Scores credit limits, stages and \
                  saves profitable deals to a hosted store, and builds Murabahah schedules."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file (defaults to ./aet.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a credit limit application
    CreditLimit(CreditLimitArgs),
    /// Print the credit limit scoring rules
    CreditRules,
    /// Calculate profitability for a single deal
    Profit(ProfitArgs),
    /// Build a Murabahah payment schedule
    Murabahah(MurabahahArgs),
    /// Sign in and open a session
    Login(LoginArgs),
    /// Sign out and discard the session
    Logout,
    /// Calculate a deal and add it to the staging area
    Stage(StageArgs),
    /// Remove deals from the staging area
    Unstage(UnstageArgs),
    /// List staged deals with totals
    Staged,
    /// Save every staged deal in one bulk insert
    Save,
    /// List saved deals, newest first
    Deals(DealsArgs),
    /// Delete saved deals by id
    Delete(DeleteArgs),
    /// Export saved deals as CSV
    Export(ExportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let settings = match config::AppConfig::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::CreditLimit(args) => commands::credit_limit::run_credit_limit(args),
        Commands::Profit(args) => commands::profit::run_profit(args),
        Commands::Murabahah(args) => commands::murabahah::run_murabahah(args),
        Commands::Login(args) => commands::deals::run_login(args, &settings),
        Commands::Logout => commands::deals::run_logout(&settings),
        Commands::Stage(args) => commands::profit::run_stage(args, &settings),
        Commands::Unstage(args) => commands::deals::run_unstage(args, &settings),
        Commands::Staged => commands::deals::run_staged(&settings),
        Commands::Save => commands::deals::run_save(&settings),
        Commands::Deals(args) => commands::deals::run_deals(args, &settings),
        Commands::Delete(args) => commands::deals::run_delete(args, &settings),
        Commands::Export(args) => commands::deals::run_export(args, &settings),
        Commands::CreditRules => {
            println!("{}", ae_toolkit_core::credit_limit::rules_overview());
            return;
        }
        Commands::Version => {
            println!("aet {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
