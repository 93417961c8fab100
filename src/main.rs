//! aws-term binary entry point.

use std::io;

use aws_term::cli::{self, Cli};
use aws_term::config::AppConfig;
use aws_term::error::format_error_help;
use aws_term::{interrupt, terminal, ui};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "AWS_TERM_LOG";

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    terminal::install_panic_hook();
    let cancel = interrupt::install().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not install Ctrl+C handler");
        CancellationToken::new()
    });

    let config = AppConfig::from_env();
    if let Err(err) = cli::commands::run(&cli, &config, cancel).await {
        terminal::restore_terminal();
        tracing::debug!(error = ?err, category = ?err.category(), "run failed");
        let _ = ui::output::error(&mut io::stderr(), &format_error_help(&err));
        std::process::exit(1);
    }
}
