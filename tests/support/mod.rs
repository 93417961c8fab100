#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_term::auth::AccessToken;
use aws_term::browser::{Browser, BrowserLauncher};
use aws_term::config::{ProfileConfig, ProfileStore};
use aws_term::error::Result as AppResult;
use aws_term::sso::{
    Account, ClientRegistration, Credentials, DeviceCodeGrant, IdentityService, Role,
    ServiceError, TokenPoll,
};
use aws_term::terminal::Terminal;
use aws_term::ui::{Entry, Picker, UiError};
use chrono::{Duration, Utc};
use tokio::time::Instant;

/// Terminal fed from scripted key chunks and lines.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    pub interactive: bool,
    pub raw: bool,
    /// `true` for each enable, `false` for each disable.
    pub transitions: Vec<bool>,
    pub keys: VecDeque<Vec<u8>>,
    pub lines: VecDeque<String>,
}

impl ScriptedTerminal {
    pub fn interactive(keys: &[&[u8]]) -> Self {
        Self {
            interactive: true,
            keys: keys.iter().map(|k| k.to_vec()).collect(),
            ..Self::default()
        }
    }

    pub fn piped(lines: &[&str]) -> Self {
        Self {
            interactive: false,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn raw_entries(&self) -> usize {
        self.transitions.iter().filter(|t| **t).count()
    }
}

impl Terminal for ScriptedTerminal {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn enable_raw(&mut self) -> io::Result<()> {
        assert!(!self.raw, "raw mode entered twice");
        self.raw = true;
        self.transitions.push(true);
        Ok(())
    }

    fn disable_raw(&mut self) -> io::Result<()> {
        self.raw = false;
        self.transitions.push(false);
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.keys.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.lines
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted line"))
    }
}

/// Picker answering from a script; mirrors the selector's short circuits.
#[derive(Debug, Default)]
pub struct RecordingPicker {
    pub answers: VecDeque<usize>,
    /// (title, labels) for every prompt that needed an answer.
    pub prompts: Vec<(String, Vec<String>)>,
    pub auto_picked: Vec<String>,
}

impl RecordingPicker {
    pub fn answering(answers: &[usize]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn titles(&self) -> Vec<&str> {
        self.prompts.iter().map(|(t, _)| t.as_str()).collect()
    }
}

impl Picker for RecordingPicker {
    fn select<V>(&mut self, title: &str, entries: &[Entry<V>]) -> Result<usize, UiError> {
        match entries {
            [] => Err(UiError::EmptyList),
            [only] => {
                self.auto_picked.push(only.label.clone());
                Ok(0)
            }
            _ => {
                self.prompts.push((
                    title.to_string(),
                    entries.iter().map(|e| e.label.clone()).collect(),
                ));
                let answer = self.answers.pop_front().unwrap_or(0);
                if answer >= entries.len() {
                    return Err(UiError::InvalidSelection(answer.to_string()));
                }
                Ok(answer)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeBrowsers {
    pub detected: Vec<Browser>,
    pub fail_open: bool,
    pub opened: Mutex<Vec<(Browser, String)>>,
}

impl FakeBrowsers {
    pub fn with(detected: &[Browser]) -> Self {
        Self {
            detected: detected.to_vec(),
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<(Browser, String)> {
        self.opened.lock().expect("opened lock poisoned").clone()
    }
}

impl BrowserLauncher for FakeBrowsers {
    fn detect(&self) -> Vec<Browser> {
        self.detected.clone()
    }

    fn open(&self, browser: Browser, url: &str) -> io::Result<()> {
        self.opened
            .lock()
            .expect("opened lock poisoned")
            .push((browser, url.to_string()));
        if self.fail_open {
            Err(io::Error::new(io::ErrorKind::NotFound, "browser missing"))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    config: Mutex<ProfileConfig>,
    pub saves: Mutex<usize>,
}

impl InMemoryProfileStore {
    pub fn seeded(config: ProfileConfig) -> Self {
        Self {
            config: Mutex::new(config),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> ProfileConfig {
        self.config.lock().expect("store lock poisoned").clone()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn load(&self) -> AppResult<ProfileConfig> {
        Ok(self.snapshot())
    }

    fn save(&self, config: &ProfileConfig) -> AppResult<()> {
        *self.config.lock().expect("store lock poisoned") = config.clone();
        *self.saves.lock().expect("store lock poisoned") += 1;
        Ok(())
    }
}

/// Identity service driven by scripted answers.
///
/// Token exchanges pop from `polls`; an exhausted script keeps answering
/// pending. The instant of every exchange is recorded.
#[derive(Debug)]
pub struct ScriptedService {
    pub grant: DeviceCodeGrant,
    pub registration_error: Mutex<Option<ServiceError>>,
    pub start_error: Mutex<Option<ServiceError>>,
    pub polls: Mutex<VecDeque<Result<TokenPoll, ServiceError>>>,
    pub exchange_calls: Mutex<Vec<Instant>>,
    pub accounts: Vec<Account>,
    pub roles: HashMap<String, Vec<Role>>,
    pub role_requests: Mutex<Vec<String>>,
    pub credential_requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedService {
    pub fn new(interval: Option<u64>, expires_in: u64) -> Self {
        Self {
            grant: grant(interval, expires_in),
            registration_error: Mutex::new(None),
            start_error: Mutex::new(None),
            polls: Mutex::new(VecDeque::new()),
            exchange_calls: Mutex::new(Vec::new()),
            accounts: Vec::new(),
            roles: HashMap::new(),
            role_requests: Mutex::new(Vec::new()),
            credential_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_polls(self, polls: Vec<Result<TokenPoll, ServiceError>>) -> Self {
        *self.polls.lock().expect("polls lock poisoned") = polls.into();
        self
    }

    pub fn with_accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_roles(mut self, account_id: &str, roles: Vec<Role>) -> Self {
        self.roles.insert(account_id.to_string(), roles);
        self
    }

    pub fn failing_registration(self, error: ServiceError) -> Self {
        *self.registration_error.lock().expect("lock poisoned") = Some(error);
        self
    }

    pub fn failing_start(self, error: ServiceError) -> Self {
        *self.start_error.lock().expect("lock poisoned") = Some(error);
        self
    }

    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.lock().expect("calls lock poisoned").len()
    }

    /// Gaps between consecutive token exchanges.
    pub fn exchange_gaps(&self) -> Vec<std::time::Duration> {
        let calls = self.exchange_calls.lock().expect("calls lock poisoned");
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl IdentityService for ScriptedService {
    async fn register_client(
        &self,
        _client_name: &str,
        _client_type: &str,
        _scopes: &[&str],
    ) -> Result<ClientRegistration, ServiceError> {
        if let Some(err) = self.registration_error.lock().expect("lock poisoned").take() {
            return Err(err);
        }
        Ok(ClientRegistration {
            client_id: "client-1".to_string(),
            client_secret: "client-secret".to_string(),
            expires_at: None,
        })
    }

    async fn start_device_authorization(
        &self,
        _client: &ClientRegistration,
        _start_url: &str,
    ) -> Result<DeviceCodeGrant, ServiceError> {
        if let Some(err) = self.start_error.lock().expect("lock poisoned").take() {
            return Err(err);
        }
        Ok(self.grant.clone())
    }

    async fn exchange_token(
        &self,
        _client: &ClientRegistration,
        _grant_type: &str,
        _device_code: &str,
    ) -> Result<TokenPoll, ServiceError> {
        self.exchange_calls
            .lock()
            .expect("calls lock poisoned")
            .push(Instant::now());
        self.polls
            .lock()
            .expect("polls lock poisoned")
            .pop_front()
            .unwrap_or(Ok(TokenPoll::Pending))
    }

    async fn list_accounts(&self, _token: &AccessToken) -> Result<Vec<Account>, ServiceError> {
        Ok(self.accounts.clone())
    }

    async fn list_roles(
        &self,
        _token: &AccessToken,
        account_id: &str,
    ) -> Result<Vec<Role>, ServiceError> {
        self.role_requests
            .lock()
            .expect("lock poisoned")
            .push(account_id.to_string());
        Ok(self.roles.get(account_id).cloned().unwrap_or_default())
    }

    async fn get_role_credentials(
        &self,
        _token: &AccessToken,
        account_id: &str,
        role_name: &str,
    ) -> Result<Credentials, ServiceError> {
        self.credential_requests
            .lock()
            .expect("lock poisoned")
            .push((account_id.to_string(), role_name.to_string()));
        Ok(credentials())
    }
}

pub fn grant(interval: Option<u64>, expires_in: u64) -> DeviceCodeGrant {
    DeviceCodeGrant {
        device_code: "device-code-1".to_string(),
        user_code: "ABCD-EFGH".to_string(),
        verification_uri: "https://device.sso.us-east-1.amazonaws.com/".to_string(),
        verification_uri_complete: Some(
            "https://device.sso.us-east-1.amazonaws.com/?user_code=ABCD-EFGH".to_string(),
        ),
        expires_in,
        interval,
    }
}

pub fn token(value: &str) -> TokenPoll {
    TokenPoll::Authorized(AccessToken::new(value))
}

pub fn account(id: &str, name: &str) -> Account {
    Account {
        account_id: id.to_string(),
        account_name: name.to_string(),
        email_address: Some(format!("{}@example.com", name.to_lowercase())),
    }
}

pub fn role(name: &str, account_id: &str) -> Role {
    Role {
        role_name: name.to_string(),
        account_id: account_id.to_string(),
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        access_key_id: "ASIAEXAMPLE".to_string(),
        secret_access_key: "secret-key".to_string(),
        session_token: "session-token".to_string(),
        expiration: Utc::now() + Duration::hours(1),
    }
}
