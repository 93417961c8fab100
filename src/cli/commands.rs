//! Handlers behind each CLI command.

use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use crossterm::style::Stylize;
use tokio_util::sync::CancellationToken;

use super::{Cli, Commands};
use crate::browser::SystemBrowsers;
use crate::config::{AppConfig, Profile, ProfileConfig, ProfileStore};
use crate::error::{AwsTermError, Result};
use crate::interrupt;
use crate::session::{SessionFlow, SessionOutcome, SessionRequest};
use crate::shell::{self, ShellLauncher, SystemShell};
use crate::sso::region::{normalize_start_url, validate_start_url};
use crate::sso::write_credentials_file;
use crate::terminal::{StdTerminal, Terminal};
use crate::ui::{output, Selector};

/// Dispatch a parsed command line.
pub async fn run(cli: &Cli, config: &AppConfig, cancel: CancellationToken) -> Result<()> {
    let store = config.profile_store();
    let mut stdout = io::stdout();
    output::header(&mut stdout)?;

    match &cli.command {
        Some(Commands::List) => list_profiles(&store.load()?, &mut stdout),
        Some(Commands::SetDefault { name }) => set_default(&store, name, &mut stdout),
        Some(Commands::Add) => {
            let mut selector = Selector::new(StdTerminal::new(), io::stdout());
            add_profile(&store, &mut selector, cli.region.as_deref()).map(|_| ())
        }
        None => login(cli, config, &store, cancel).await,
    }
}

async fn login(
    cli: &Cli,
    config: &AppConfig,
    store: &dyn ProfileStore,
    cancel: CancellationToken,
) -> Result<()> {
    let mut profiles = store.load()?;
    let mut selector = Selector::new(StdTerminal::new(), io::stdout());

    if profiles.is_empty() && cli.profile.is_none() {
        output::info(selector.output_mut(), "No profiles configured yet.")?;
        let profile = profile_wizard(&mut selector, &mut profiles, cli.region.as_deref())?;
        store.save(&profiles)?;
        output::success(
            selector.output_mut(),
            &format!("Profile '{}' saved!", profile.name),
        )?;
    }

    let region = cli.region.as_deref().or(config.region.as_deref());
    let browsers = SystemBrowsers;
    let outcome = {
        let mut flow =
            SessionFlow::new(&mut selector, &browsers, io::stdout()).with_cancellation(cancel);
        flow.run(
            &profiles,
            SessionRequest {
                profile: cli.profile.as_deref(),
                region,
            },
            |region| config.sso_client(region),
        )
        .await?
    };

    let mut stdout = io::stdout();
    let credentials_path = config.credentials_path();
    let written = match write_credentials_file(&credentials_path, &outcome.credentials) {
        Ok(()) => Some(credentials_path.as_path()),
        Err(err) => {
            tracing::warn!(error = %err, "failed to write credentials file");
            output::error(&mut stdout, &format!("Failed to write credentials file: {err}"))?;
            None
        }
    };
    print_summary(&mut stdout, &outcome, written)?;

    if !cli.no_shell
        && selector.confirm("Open a new shell with these credentials? (Y/n)", true)?
    {
        let shell = shell::default_shell();
        open_session_shell(&SystemShell, &shell, &outcome, &mut stdout)?;
    }
    Ok(())
}

/// Print every saved profile with its region and default marker.
pub fn list_profiles<W: Write>(profiles: &ProfileConfig, out: &mut W) -> Result<()> {
    if profiles.is_empty() {
        output::info(out, "No profiles configured. Run: aws-term add")?;
        return Ok(());
    }
    writeln!(out, "\n{}\n", "Configured profiles:".bold())?;
    for profile in &profiles.profiles {
        let region = profile
            .region
            .as_deref()
            .map(|r| format!(" [{r}]"))
            .unwrap_or_default();
        let marker = if profile.default {
            format!(" {}", "(default)".green())
        } else {
            String::new()
        };
        writeln!(out, "  • {}{region}{marker}", profile.name.as_str().bold())?;
        writeln!(out, "    {}", profile.sso_url.as_str().blue())?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn set_default<W: Write>(store: &dyn ProfileStore, name: &str, out: &mut W) -> Result<()> {
    let mut profiles = store.load()?;
    profiles.set_default(name)?;
    store.save(&profiles)?;
    output::success(out, &format!("Set '{name}' as the default profile"))?;
    Ok(())
}

/// Run the wizard and persist the result.
pub fn add_profile<T: Terminal, W: Write>(
    store: &dyn ProfileStore,
    selector: &mut Selector<T, W>,
    region: Option<&str>,
) -> Result<Profile> {
    let mut profiles = store.load()?;
    let profile = profile_wizard(selector, &mut profiles, region)?;
    store.save(&profiles)?;
    output::success(
        selector.output_mut(),
        &format!("Profile '{}' added successfully!", profile.name),
    )?;
    Ok(profile)
}

/// Ask for a start URL, name, region and default flag.
///
/// A URL that is already configured returns the existing profile untouched.
pub fn profile_wizard<T: Terminal, W: Write>(
    selector: &mut Selector<T, W>,
    profiles: &mut ProfileConfig,
    region: Option<&str>,
) -> Result<Profile> {
    let raw_url =
        selector.input("Enter your AWS SSO start URL (e.g. https://my-org.awsapps.com/start)")?;
    if raw_url.is_empty() {
        return Err(AwsTermError::InvalidInput("SSO URL cannot be empty".into()));
    }
    let sso_url = normalize_start_url(&raw_url);
    validate_start_url(&sso_url)?;

    if let Some(existing) = profiles.contains_url(&sso_url) {
        output::info(
            selector.output_mut(),
            "This SSO URL already exists in your configuration.",
        )?;
        return Ok(existing.clone());
    }

    let name = selector.input("Enter a name for this profile")?;
    if name.is_empty() {
        return Err(AwsTermError::InvalidInput("Profile name cannot be empty".into()));
    }
    if profiles.get(&name).is_some() {
        return Err(AwsTermError::InvalidInput(format!(
            "Profile '{name}' already exists"
        )));
    }

    let region = match region {
        Some(region) => region.to_string(),
        None => selector.input("AWS Region (press Enter to detect from the URL)")?,
    };

    let make_default =
        profiles.is_empty() || selector.confirm("Set as default profile? (y/N)", false)?;

    let mut profile = Profile::new(name, sso_url);
    if !region.is_empty() {
        profile.region = Some(region);
    }
    profile.default = make_default;
    profiles.add_profile(profile.clone());
    Ok(profiles.get(&profile.name).cloned().unwrap_or(profile))
}

/// Summary, sourcing hint, export lines and verification commands.
pub fn print_summary<W: Write>(
    out: &mut W,
    outcome: &SessionOutcome,
    credentials_file: Option<&Path>,
) -> io::Result<()> {
    let creds = &outcome.credentials;
    output::success(out, "Credentials obtained successfully!")?;
    writeln!(out)?;
    writeln!(
        out,
        "  {}  {} ({})",
        "Account:".bold(),
        outcome.account.account_name,
        outcome.account.account_id
    )?;
    writeln!(out, "  {}     {}", "Role:".bold(), outcome.role.role_name)?;
    writeln!(
        out,
        "  {}  {}",
        "Expires:".bold(),
        creds.expiration.with_timezone(&Local).to_rfc2822()
    )?;
    writeln!(out)?;

    writeln!(out, "To use these credentials, you can either:\n")?;
    match credentials_file {
        Some(path) => {
            writeln!(out, "  1. Source the credentials file:")?;
            writeln!(
                out,
                "     {}\n",
                format!("source {}", path.display()).cyan()
            )?;
            writeln!(out, "  2. Or copy these export commands:\n")?;
        }
        None => writeln!(out, "  Copy these export commands:\n")?,
    }
    for line in creds.export_script().lines() {
        writeln!(out, "     {line}")?;
    }
    writeln!(out)?;

    writeln!(out, "{}\n", "─── Verify your session ───".bold().yellow())?;
    writeln!(out, "  After setting credentials, run:\n")?;
    writeln!(out, "    {}", "aws sts get-caller-identity".cyan())?;
    writeln!(out, "    # Shows: Account ID, User ID, and ARN\n")?;
    writeln!(out, "    {}", "aws s3 ls".cyan())?;
    writeln!(out, "    # Lists S3 buckets (if you have permission)\n")
}

/// Run `shell` with the session's credentials until the user exits it.
pub fn open_session_shell<L: ShellLauncher + ?Sized, W: Write>(
    launcher: &L,
    shell: &str,
    outcome: &SessionOutcome,
    out: &mut W,
) -> io::Result<()> {
    let account = &outcome.account.account_name;
    let role = &outcome.role.role_name;
    writeln!(out, "\n{}", "Starting new shell with AWS credentials...".cyan())?;
    writeln!(out, "{}", format!("Account: {account} | Role: {role}").yellow())?;
    writeln!(
        out,
        "{}\n",
        "Type 'exit' to return to your original shell.".yellow()
    )?;
    out.flush()?;

    let ps1 = std::env::var("PS1").ok();
    let env = shell::session_env(&outcome.credentials, account, role, ps1.as_deref());
    let _child = interrupt::child_active();
    match launcher.run(shell, &env) {
        Ok(true) => writeln!(out, "\n{}", "AWS session ended.".cyan()),
        Ok(false) => output::error(out, "Shell exited with a non-zero status"),
        Err(err) => output::error(out, &format!("Shell exited with error: {err}")),
    }
}
