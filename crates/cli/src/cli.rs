//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "seatgrab", version, about = "Scheduled course-seat acquisition")]
pub struct Cli {
    /// Configuration file (overrides SEATGRAB_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with a captcha and save the session
    Login(LoginArgs),
    /// Browse offerings and save chosen classes as targets
    Catalog(CatalogArgs),
    /// List or delete saved targets
    Targets(TargetsArgs),
    /// Acquire every saved target
    Run(RunArgs),
    /// Print the effective configuration (password redacted)
    Config,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Elective batch code to bind the session to (prompted when omitted)
    #[arg(long)]
    pub batch: Option<String>,

    /// Where to write the captcha image
    #[arg(long, default_value = "captcha.png")]
    pub captcha_out: PathBuf,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Course category: menu index 1-6 or a code such as FANKC
    #[arg(long = "type", default_value = "1")]
    pub category: String,

    /// Only show classes with free seats
    #[arg(long)]
    pub available: bool,

    /// Save these class ids as targets
    #[arg(long, num_args = 1..)]
    pub add: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TargetsArgs {
    /// Remove these target ids
    #[arg(long, num_args = 1.., conflicts_with = "clear")]
    pub remove: Vec<String>,

    /// Remove every target
    #[arg(long)]
    pub clear: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Release time: unix seconds, "YYYY-MM-DD HH:MM[:SS]" or "HH:MM[:SS]" (today)
    #[arg(long)]
    pub at: Option<String>,

    /// Print engine metrics when the run ends
    #[arg(long)]
    pub metrics: bool,
}
