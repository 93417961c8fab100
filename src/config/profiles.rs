use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AwsTermError, Result};

pub const CONFIG_VERSION: u32 = 1;
/// Profiles written by earlier JSON-based releases, read when no TOML file exists.
pub const LEGACY_CONFIG_FILE: &str = "config.json";

/// A saved SSO portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub sso_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub default: bool,
}

impl Profile {
    pub fn new(name: impl Into<String>, sso_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sso_url: sso_url.into(),
            region: None,
            default: false,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// A profile with the same start URL existed and was updated in place.
    Updated,
}

/// All saved profiles. At most one is the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl ProfileConfig {
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn default_profile(&self) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.default)
    }

    /// The profile already pointing at `sso_url`, if any.
    pub fn contains_url(&self, sso_url: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.sso_url == sso_url)
    }

    /// Insert `profile`, or update the entry with the same start URL.
    ///
    /// The first profile saved always becomes the default.
    pub fn add_profile(&mut self, mut profile: Profile) -> AddOutcome {
        if self.profiles.is_empty() {
            profile.default = true;
        }
        let make_default = profile.default;
        let outcome = match self
            .profiles
            .iter_mut()
            .find(|p| p.sso_url == profile.sso_url)
        {
            Some(existing) => {
                existing.name = profile.name.clone();
                existing.region = profile.region.clone();
                existing.default = existing.default || make_default;
                AddOutcome::Updated
            }
            None => {
                self.profiles.push(profile.clone());
                AddOutcome::Added
            }
        };
        if make_default {
            self.mark_default(&profile.name);
        }
        outcome
    }

    /// Make `name` the only default profile.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if self.get(name).is_none() {
            return Err(AwsTermError::ProfileNotFound(name.to_string()));
        }
        self.mark_default(name);
        Ok(())
    }

    fn mark_default(&mut self, name: &str) {
        for profile in &mut self.profiles {
            profile.default = profile.name == name;
        }
    }
}

/// Storage abstraction for the saved profiles.
pub trait ProfileStore: Send + Sync {
    /// A missing store loads as empty.
    fn load(&self) -> Result<ProfileConfig>;
    fn save(&self, config: &ProfileConfig) -> Result<()>;
}

/// Profiles kept in a single TOML file.
///
/// # Example
/// ```no_run
/// use aws_term::config::{FileProfileStore, Profile, ProfileStore};
///
/// let store = FileProfileStore::new("/tmp/aws-term/config.toml");
/// let mut config = store.load()?;
/// config.add_profile(Profile::new("work", "https://acme.awsapps.com/start"));
/// store.save(&config)?;
/// # Ok::<(), aws_term::error::AwsTermError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> Result<ProfileConfig> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return self.load_legacy();
            }
            Err(err) => return Err(err.into()),
        };
        let file: ConfigFile = toml::from_str(&raw)?;
        if file.version > CONFIG_VERSION {
            return Err(AwsTermError::Configuration(format!(
                "{} has version {}, newest supported is {CONFIG_VERSION}",
                self.path.display(),
                file.version
            )));
        }
        Ok(ProfileConfig {
            profiles: file.profiles,
        })
    }

    fn save(&self, config: &ProfileConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = ConfigFile {
            version: CONFIG_VERSION,
            saved_at: Some(Utc::now()),
            profiles: config.profiles.clone(),
        };
        fs::write(&self.path, toml::to_string(&file)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(path = %self.path.display(), count = config.len(), "saved profiles");
        Ok(())
    }
}

impl FileProfileStore {
    /// Import `config.json` from the same directory. It is never written;
    /// the next save produces the TOML file.
    fn load_legacy(&self) -> Result<ProfileConfig> {
        let legacy = self.path.with_file_name(LEGACY_CONFIG_FILE);
        let raw = match fs::read_to_string(&legacy) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProfileConfig::default())
            }
            Err(err) => return Err(err.into()),
        };
        let file: LegacyConfigFile = serde_json::from_str(&raw).map_err(|err| {
            AwsTermError::Serialization(format!("{}: {err}", legacy.display()))
        })?;
        let profiles: Vec<Profile> = file
            .profiles
            .into_iter()
            .map(|mut profile| {
                profile.region = profile.region.filter(|r| !r.trim().is_empty());
                profile
            })
            .collect();
        tracing::info!(
            path = %legacy.display(),
            count = profiles.len(),
            "imported profiles from legacy config"
        );
        Ok(ProfileConfig { profiles })
    }
}

#[derive(Debug, Deserialize)]
struct LegacyConfigFile {
    #[serde(default)]
    profiles: Vec<Profile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "profile")]
    profiles: Vec<Profile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileProfileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileProfileStore::new(dir.path().join("nested").join("config.toml"));
        (dir, store)
    }

    #[test]
    fn first_profile_becomes_default() {
        let mut config = ProfileConfig::default();
        assert_eq!(
            config.add_profile(Profile::new("work", "https://acme.awsapps.com/start")),
            AddOutcome::Added
        );
        assert_eq!(config.default_profile().map(|p| p.name.as_str()), Some("work"));
    }

    #[test]
    fn same_url_updates_existing_entry() {
        let mut config = ProfileConfig::default();
        config.add_profile(Profile::new("work", "https://acme.awsapps.com/start"));
        let outcome = config.add_profile(
            Profile::new("acme", "https://acme.awsapps.com/start").with_region("eu-west-1"),
        );
        assert_eq!(outcome, AddOutcome::Updated);
        assert_eq!(config.len(), 1);
        let profile = config.get("acme").unwrap();
        assert_eq!(profile.region.as_deref(), Some("eu-west-1"));
        assert!(profile.default);
    }

    #[test]
    fn set_default_keeps_exactly_one() {
        let mut config = ProfileConfig::default();
        config.add_profile(Profile::new("a", "https://a.awsapps.com/start"));
        config.add_profile(Profile::new("b", "https://b.awsapps.com/start"));
        config.set_default("b").unwrap();
        let defaults: Vec<_> = config
            .profiles
            .iter()
            .filter(|p| p.default)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(defaults, vec!["b"]);
    }

    #[test]
    fn set_default_unknown_profile_fails() {
        let mut config = ProfileConfig::default();
        let err = config.set_default("nope").unwrap_err();
        assert!(matches!(err, AwsTermError::ProfileNotFound(name) if name == "nope"));
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let (_dir, store) = temp_store();
        let mut config = ProfileConfig::default();
        config.add_profile(Profile::new("work", "https://acme.awsapps.com/start"));
        config.add_profile(
            Profile::new("lab", "https://lab.awsapps.com/start").with_region("eu-central-1"),
        );
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        store.save(&ProfileConfig::default()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn newer_version_is_rejected() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "version = 99\n").unwrap();
        assert!(matches!(
            store.load().unwrap_err(),
            AwsTermError::Configuration(_)
        ));
    }

    #[test]
    fn legacy_json_is_imported_when_toml_is_missing() {
        let (_dir, store) = temp_store();
        let legacy = store.path().with_file_name(LEGACY_CONFIG_FILE);
        fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        fs::write(
            &legacy,
            r#"{"profiles":[
                {"name":"work","sso_url":"https://acme.awsapps.com/start","default":true},
                {"name":"lab","sso_url":"https://lab.awsapps.com/start","region":""},
                {"name":"eu","sso_url":"https://eu.awsapps.com/start","region":"eu-west-1"}
            ]}"#,
        )
        .unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.len(), 3);
        assert_eq!(config.default_profile().unwrap().name, "work");
        assert_eq!(config.get("lab").unwrap().region, None);
        assert_eq!(config.get("eu").unwrap().region.as_deref(), Some("eu-west-1"));

        store.save(&config).unwrap();
        fs::write(&legacy, r#"{"profiles":[]}"#).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn malformed_legacy_json_is_reported() {
        let (_dir, store) = temp_store();
        let legacy = store.path().with_file_name(LEGACY_CONFIG_FILE);
        fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        fs::write(&legacy, "{not json").unwrap();

        assert!(matches!(store.load(), Err(AwsTermError::Serialization(_))));
    }
}
