use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

/// Temporary role credentials issued for one account/role pair.
///
/// `Debug` never prints the secret parts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl Credentials {
    /// The three environment variables an AWS SDK reads.
    pub fn env_vars(&self) -> [(&'static str, &str); 3] {
        [
            (ACCESS_KEY_VAR, self.access_key_id.as_str()),
            (SECRET_KEY_VAR, self.secret_access_key.as_str()),
            (SESSION_TOKEN_VAR, self.session_token.as_str()),
        ]
    }

    /// A POSIX shell snippet exporting the credentials.
    pub fn export_script(&self) -> String {
        self.env_vars()
            .iter()
            .map(|(name, value)| format!("export {name}=\"{value}\"\n"))
            .collect()
    }
}

/// Write the export script, readable by the owner only.
pub fn write_credentials_file(path: &Path, credentials: &Credentials) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // An existing file keeps its old mode on open; tighten it before writing.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    io::Write::write_all(&mut file, credentials.export_script().as_bytes())?;
    tracing::debug!(path = %path.display(), "credentials file written");
    Ok(())
}
