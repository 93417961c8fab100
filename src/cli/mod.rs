//! CLI entry point for aws-term.

pub mod commands;

use clap::{Parser, Subcommand};

const AFTER_HELP: &str = "\
Workflow:
  1. Select an SSO profile (or create one)
  2. Choose a browser for authentication
  3. Sign in via AWS SSO in your browser
  4. Select an AWS account
  5. Select a role
  6. Get temporary credentials

Profiles are stored in ~/.aws-terminal/config.toml (override with AWS_TERM_HOME).";

/// AWS SSO terminal session manager
#[derive(Parser, Debug)]
#[command(
    name = "aws-term",
    version,
    about = "AWS SSO terminal session manager",
    after_help = AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Profile to log in with (default: the only or the default profile)
    pub profile: Option<String>,

    /// AWS region for SSO (default: profile region, else detected from the URL)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Print the credentials without offering a session shell
    #[arg(long)]
    pub no_shell: bool,
}

/// Profile management commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Add a new SSO profile
    Add,
    /// List configured profiles
    List,
    /// Set a profile as the default
    SetDefault {
        /// Name of the profile
        name: String,
    },
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
