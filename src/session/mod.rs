//! The end-to-end credential session: profile, browser, login, account, role.

use std::io::Write;

use crossterm::style::Stylize;
use tokio_util::sync::CancellationToken;

use crate::auth::{AccessToken, AuthError, DeviceLogin, LoginEvent};
use crate::browser::{Browser, BrowserLauncher};
use crate::config::{Profile, ProfileConfig};
use crate::error::{AwsTermError, Result};
use crate::interrupt;
use crate::sso::{resolve_region, Account, Credentials, IdentityService, Role};
use crate::ui::{output, Entry, Picker};

/// What the user asked for on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRequest<'a> {
    pub profile: Option<&'a str>,
    pub region: Option<&'a str>,
}

/// Everything a finished session produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub profile: Profile,
    pub region: String,
    pub account: Account,
    pub role: Role,
    pub credentials: Credentials,
}

/// Runs each step strictly in order; the first failure aborts the rest.
pub struct SessionFlow<'a, P, B, W>
where
    P: Picker,
    B: BrowserLauncher + ?Sized,
    W: Write,
{
    picker: &'a mut P,
    browsers: &'a B,
    out: W,
    cancel: CancellationToken,
}

impl<'a, P, B, W> SessionFlow<'a, P, B, W>
where
    P: Picker,
    B: BrowserLauncher + ?Sized,
    W: Write,
{
    pub fn new(picker: &'a mut P, browsers: &'a B, out: W) -> Self {
        Self {
            picker,
            browsers,
            out,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run every step. `connect` builds the identity service once the
    /// region is known.
    pub async fn run<S, F>(
        &mut self,
        profiles: &ProfileConfig,
        request: SessionRequest<'_>,
        connect: F,
    ) -> Result<SessionOutcome>
    where
        S: IdentityService,
        F: FnOnce(&str) -> S,
    {
        let profile = self.choose_profile(profiles, request.profile)?;
        let region = resolve_region(request.region, profile.region.as_deref(), &profile.sso_url);
        tracing::debug!(profile = %profile.name, %region, "resolved session target");

        let browser = self.choose_browser()?;
        let service = connect(&region);

        let token = self.authenticate(&service, &profile.sso_url, browser).await?;
        let account = self.choose_account(&service, &token).await?;
        let role = self.choose_role(&service, &token, &account).await?;

        output::info(&mut self.out, "Getting credentials...")?;
        let credentials = service
            .get_role_credentials(&token, &account.account_id, &role.role_name)
            .await
            .map_err(AwsTermError::RoleCredentials)?;

        Ok(SessionOutcome {
            profile,
            region,
            account,
            role,
            credentials,
        })
    }

    /// Explicit name, then the only profile, then the default, then ask.
    pub fn choose_profile(
        &mut self,
        profiles: &ProfileConfig,
        requested: Option<&str>,
    ) -> Result<Profile> {
        if let Some(name) = requested {
            return profiles
                .get(name)
                .cloned()
                .ok_or_else(|| AwsTermError::ProfileNotFound(name.to_string()));
        }
        if let [only] = profiles.profiles.as_slice() {
            output::info(&mut self.out, &format!("Using profile: {}", only.name))?;
            return Ok(only.clone());
        }
        if let Some(default) = profiles.default_profile() {
            output::info(&mut self.out, &format!("Using default profile: {}", default.name))?;
            return Ok(default.clone());
        }

        let entries: Vec<Entry<&Profile>> = profiles
            .profiles
            .iter()
            .map(|p| {
                Entry::new(p.name.clone(), p)
                    .with_detail(p.sso_url.clone())
                    .preferred(p.default)
            })
            .collect();
        let chosen = self.picker.select_value("Select an SSO profile:", &entries)?;
        Ok((*chosen).clone())
    }

    pub fn choose_browser(&mut self) -> Result<Browser> {
        let detected = self.browsers.detect();
        if detected.is_empty() {
            return Err(AwsTermError::NoBrowserFound);
        }
        let entries: Vec<Entry<Browser>> = detected
            .into_iter()
            .map(|b| Entry::new(b.to_string(), b))
            .collect();
        Ok(*self
            .picker
            .select_value("Select a browser for authentication:", &entries)?)
    }

    /// Device-authorization login. Opening the browser is best-effort.
    pub async fn authenticate<S>(
        &mut self,
        service: &S,
        start_url: &str,
        browser: Browser,
    ) -> Result<AccessToken>
    where
        S: IdentityService + ?Sized,
    {
        output::info(&mut self.out, "Registering client with AWS SSO...")?;
        let _watch = interrupt::watch();
        let browsers = self.browsers;
        let out = &mut self.out;
        let mut login = DeviceLogin::new(service, start_url).with_cancellation(self.cancel.clone());
        let result = login
            .run(|event| match event {
                LoginEvent::CodeIssued(session) => {
                    let _ = announce_code(out, &session.verification_uri, &session.user_code);
                    if let Err(err) = browsers.open(browser, &session.verification_uri) {
                        tracing::warn!(%browser, error = %err, "failed to launch browser");
                        let _ = output::error(out, &format!("Failed to open browser: {err}"));
                        let _ = writeln!(out, "Please open the URL manually in your browser.");
                    }
                    let _ = output::info(
                        out,
                        "Waiting for authorization... (press Ctrl+C to cancel)",
                    );
                }
                LoginEvent::Pending => tracing::trace!("authorization pending"),
                LoginEvent::SlowDown { interval } => {
                    tracing::debug!(?interval, "polling slowed down");
                }
            })
            .await;

        match result {
            Ok(token) => {
                output::success(&mut self.out, "Authentication successful!")?;
                Ok(token)
            }
            Err(AuthError::Cancelled) => {
                writeln!(self.out)?;
                Err(AuthError::Cancelled.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn choose_account<S>(&mut self, service: &S, token: &AccessToken) -> Result<Account>
    where
        S: IdentityService + ?Sized,
    {
        output::info(&mut self.out, "Fetching available accounts...")?;
        let accounts = service
            .list_accounts(token)
            .await
            .map_err(AwsTermError::ListAccounts)?;
        if accounts.is_empty() {
            return Err(AwsTermError::NoAccounts);
        }
        let entries: Vec<Entry<Account>> = accounts
            .into_iter()
            .map(|account| {
                let entry = Entry::new(account.label(), account.clone());
                match account.email_address {
                    Some(email) if !email.is_empty() => entry.with_detail(email),
                    _ => entry,
                }
            })
            .collect();
        Ok(self
            .picker
            .select_value("Select an AWS account:", &entries)?
            .clone())
    }

    pub async fn choose_role<S>(
        &mut self,
        service: &S,
        token: &AccessToken,
        account: &Account,
    ) -> Result<Role>
    where
        S: IdentityService + ?Sized,
    {
        output::info(
            &mut self.out,
            &format!("Fetching roles for {}...", account.account_name),
        )?;
        let roles = service
            .list_roles(token, &account.account_id)
            .await
            .map_err(AwsTermError::ListRoles)?;
        if roles.is_empty() {
            return Err(AwsTermError::NoRoles {
                account: account.label(),
            });
        }
        let entries: Vec<Entry<Role>> = roles
            .into_iter()
            .map(|role| Entry::new(role.role_name.clone(), role))
            .collect();
        Ok(self.picker.select_value("Select a role:", &entries)?.clone())
    }
}

fn announce_code<W: Write>(out: &mut W, uri: &str, user_code: &str) -> std::io::Result<()> {
    let rule = "════════════════════════════════════════════";
    writeln!(out)?;
    writeln!(out, "{}", rule.bold().cyan())?;
    writeln!(out, "{}", "  Opening browser for AWS SSO login...".yellow())?;
    writeln!(out, "{}", rule.cyan())?;
    writeln!(out)?;
    writeln!(out, "  If browser doesn't open, visit:")?;
    writeln!(out, "  {}", uri.blue())?;
    writeln!(out)?;
    writeln!(out, "  Verification code: {}", user_code.bold())?;
    writeln!(out)
}
