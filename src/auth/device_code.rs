use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::sso::{ClientRegistration, DeviceCodeGrant};

pub const CLIENT_NAME: &str = "aws-term";
pub const CLIENT_TYPE: &str = "public";
pub const SCOPES: &[&str] = &["sso:account:access"];
pub const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Polls never run faster than this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Used when the service sends no interval (or zero).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Longest device-code lifetime honored; larger `expires_in` values are capped.
pub const MAX_CODE_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Where a login attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unregistered,
    Registered,
    AuthorizationStarted,
    Polling,
    Authenticated,
    Expired,
    Failed,
}

/// One device-authorization attempt.
///
/// Created when authorization starts and dropped when the attempt ends.
/// Only `poll_interval` changes afterwards, and only while polling.
///
/// # Example
/// ```no_run
/// use aws_term::auth::DeviceAuthorization;
/// use aws_term::sso::{ClientRegistration, DeviceCodeGrant};
///
/// let session = DeviceAuthorization::new(
///     ClientRegistration {
///         client_id: "client".to_string(),
///         client_secret: "secret".to_string(),
///         expires_at: None,
///     },
///     DeviceCodeGrant {
///         device_code: "device".to_string(),
///         user_code: "ABCD-EFGH".to_string(),
///         verification_uri: "https://device.sso.us-east-1.amazonaws.com/".to_string(),
///         verification_uri_complete: None,
///         expires_in: 600,
///         interval: Some(1),
///     },
/// );
/// assert_eq!(session.user_code, "ABCD-EFGH");
/// ```
#[derive(Clone)]
pub struct DeviceAuthorization {
    pub client: ClientRegistration,
    pub device_code: String,
    pub user_code: String,
    /// The URI to open; pre-filled with the user code when available.
    pub verification_uri: String,
    pub poll_interval: Duration,
    pub expires_at: DateTime<Utc>,
    deadline: Instant,
}

impl DeviceAuthorization {
    pub fn new(client: ClientRegistration, grant: DeviceCodeGrant) -> Self {
        let lifetime = Duration::from_secs(grant.expires_in).min(MAX_CODE_LIFETIME);
        let now = Instant::now();
        Self {
            client,
            device_code: grant.device_code,
            user_code: grant.user_code,
            verification_uri: grant
                .verification_uri_complete
                .unwrap_or(grant.verification_uri),
            poll_interval: initial_interval(grant.interval),
            expires_at: Utc::now()
                + chrono::Duration::from_std(lifetime).unwrap_or(chrono::Duration::zero()),
            deadline: now.checked_add(lifetime).unwrap_or(now),
        }
    }

    /// Whether the device code has outlived `expires_in`.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left before the device code expires.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Slow-down handling: the interval only ever doubles.
    pub fn back_off(&mut self) -> Duration {
        self.poll_interval = self.poll_interval.saturating_mul(2);
        self.poll_interval
    }
}

impl fmt::Debug for DeviceAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceAuthorization")
            .field("client", &self.client)
            .field("device_code", &"<redacted>")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("poll_interval", &self.poll_interval)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn initial_interval(interval: Option<u64>) -> Duration {
    match interval {
        None | Some(0) => DEFAULT_POLL_INTERVAL,
        Some(secs) => Duration::from_secs(secs).max(MIN_POLL_INTERVAL),
    }
}
