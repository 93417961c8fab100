//! Runtime settings (environment) and persisted SSO profiles.

pub mod profiles;

pub use profiles::{
    AddOutcome, FileProfileStore, Profile, ProfileConfig, ProfileStore, CONFIG_VERSION,
};

use std::path::{Path, PathBuf};

use crate::sso::SsoClient;

pub const HOME_ENV: &str = "AWS_TERM_HOME";
pub const REGION_ENV: &str = "AWS_TERM_REGION";
pub const OIDC_ENDPOINT_ENV: &str = "AWS_TERM_OIDC_ENDPOINT";
pub const PORTAL_ENDPOINT_ENV: &str = "AWS_TERM_PORTAL_ENDPOINT";

const CONFIG_FILE: &str = "config.toml";
const CREDENTIALS_FILE: &str = "credentials.sh";

/// Settings resolved once at startup.
///
/// Resolution order for the region used by a login:
/// 1. `--region` on the command line
/// 2. `AWS_TERM_REGION`
/// 3. the profile's stored region
/// 4. inference from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub home: PathBuf,
    pub region: Option<String>,
    pub oidc_endpoint: Option<String>,
    pub portal_endpoint: Option<String>,
}

impl AppConfig {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            region: None,
            oidc_endpoint: None,
            portal_endpoint: None,
        }
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            home: get(HOME_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(default_home_dir),
            region: get(REGION_ENV),
            oidc_endpoint: get(OIDC_ENDPOINT_ENV),
            portal_endpoint: get(PORTAL_ENDPOINT_ENV),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.home.join(CREDENTIALS_FILE)
    }

    pub fn profile_store(&self) -> FileProfileStore {
        FileProfileStore::new(self.config_path())
    }

    /// HTTP client for `region`, honoring endpoint overrides.
    pub fn sso_client(&self, region: &str) -> SsoClient {
        let mut client = SsoClient::new(region);
        if let Some(url) = &self.oidc_endpoint {
            client = client.with_oidc_endpoint(url.as_str());
        }
        if let Some(url) = &self.portal_endpoint {
            client = client.with_portal_endpoint(url.as_str());
        }
        client
    }
}

fn default_home_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".aws-terminal"))
        .unwrap_or_else(|| PathBuf::from(".aws-terminal"))
}
