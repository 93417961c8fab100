//! Interactive subshell carrying the issued credentials.

use std::io;
use std::process::Command;

use crate::sso::Credentials;

pub const SESSION_VAR: &str = "AWS_TERM_SESSION";
pub const ACCOUNT_VAR: &str = "AWS_TERM_ACCOUNT";
pub const ROLE_VAR: &str = "AWS_TERM_ROLE";

const FALLBACK_SHELL: &str = "/bin/bash";

/// Runs a shell to completion with extra environment.
pub trait ShellLauncher {
    /// Returns whether the shell exited successfully.
    fn run(&self, shell: &str, env: &[(String, String)]) -> io::Result<bool>;
}

/// Spawns the real shell attached to this process's stdio.
#[derive(Debug, Clone, Default)]
pub struct SystemShell;

impl ShellLauncher for SystemShell {
    fn run(&self, shell: &str, env: &[(String, String)]) -> io::Result<bool> {
        let status = Command::new(shell)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()?;
        tracing::debug!(shell, code = ?status.code(), "session shell exited");
        Ok(status.success())
    }
}

/// `$SHELL`, or bash when unset.
pub fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}

/// Environment for a session shell.
///
/// `current_ps1` is the inherited prompt; when present (and not on Windows)
/// it is prefixed with `[aws:<role>] `.
pub fn session_env(
    credentials: &Credentials,
    account_name: &str,
    role_name: &str,
    current_ps1: Option<&str>,
) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = credentials
        .env_vars()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    env.push((SESSION_VAR.to_string(), "1".to_string()));
    env.push((ACCOUNT_VAR.to_string(), account_name.to_string()));
    env.push((ROLE_VAR.to_string(), role_name.to_string()));
    if cfg!(not(windows)) {
        if let Some(ps1) = current_ps1 {
            env.push(("PS1".to_string(), format!("[aws:{role_name}] {ps1}")));
        }
    }
    env
}
