//! The remote identity service: OIDC device registration and the SSO portal.

pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod region;

pub use client::SsoClient;
pub use credentials::{write_credentials_file, Credentials};
pub use error::ServiceError;
pub use region::{resolve_region, DEFAULT_REGION};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::AccessToken;

/// Client credentials returned by registration.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for ClientRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistration")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Response to starting device authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCodeGrant {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// The URI with the user code pre-filled, when the service offers one.
    pub verification_uri_complete: Option<String>,
    pub expires_in: u64,
    pub interval: Option<u64>,
}

/// Outcome of one token exchange that is not a hard failure.
#[derive(Debug, Clone)]
pub enum TokenPoll {
    Authorized(AccessToken),
    Pending,
    SlowDown,
}

impl TokenPoll {
    /// Map an OIDC error code onto the retryable poll outcomes.
    pub fn from_error_code(code: &str) -> Option<Self> {
        match code {
            "AuthorizationPendingException" | "authorization_pending" => Some(Self::Pending),
            "SlowDownException" | "slow_down" => Some(Self::SlowDown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: String,
    pub account_name: String,
    pub email_address: Option<String>,
}

impl Account {
    pub fn label(&self) -> String {
        format!("{} ({})", self.account_name, self.account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub role_name: String,
    pub account_id: String,
}

/// Calls the login flow and session orchestration make against AWS.
///
/// [`SsoClient`] talks to the real endpoints; tests script their own.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn register_client(
        &self,
        client_name: &str,
        client_type: &str,
        scopes: &[&str],
    ) -> Result<ClientRegistration, ServiceError>;

    async fn start_device_authorization(
        &self,
        client: &ClientRegistration,
        start_url: &str,
    ) -> Result<DeviceCodeGrant, ServiceError>;

    /// Pending and slow-down answers come back as `Ok`; anything else that
    /// is not a token is an `Err`.
    async fn exchange_token(
        &self,
        client: &ClientRegistration,
        grant_type: &str,
        device_code: &str,
    ) -> Result<TokenPoll, ServiceError>;

    /// Every account the token can see, across all pages.
    async fn list_accounts(&self, token: &AccessToken) -> Result<Vec<Account>, ServiceError>;

    /// Every role in `account_id`, across all pages.
    async fn list_roles(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<Vec<Role>, ServiceError>;

    async fn get_role_credentials(
        &self,
        token: &AccessToken,
        account_id: &str,
        role_name: &str,
    ) -> Result<Credentials, ServiceError>;
}

#[async_trait]
impl<T: IdentityService + ?Sized> IdentityService for Arc<T> {
    async fn register_client(
        &self,
        client_name: &str,
        client_type: &str,
        scopes: &[&str],
    ) -> Result<ClientRegistration, ServiceError> {
        (**self).register_client(client_name, client_type, scopes).await
    }

    async fn start_device_authorization(
        &self,
        client: &ClientRegistration,
        start_url: &str,
    ) -> Result<DeviceCodeGrant, ServiceError> {
        (**self).start_device_authorization(client, start_url).await
    }

    async fn exchange_token(
        &self,
        client: &ClientRegistration,
        grant_type: &str,
        device_code: &str,
    ) -> Result<TokenPoll, ServiceError> {
        (**self).exchange_token(client, grant_type, device_code).await
    }

    async fn list_accounts(&self, token: &AccessToken) -> Result<Vec<Account>, ServiceError> {
        (**self).list_accounts(token).await
    }

    async fn list_roles(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<Vec<Role>, ServiceError> {
        (**self).list_roles(token, account_id).await
    }

    async fn get_role_credentials(
        &self,
        token: &AccessToken,
        account_id: &str,
        role_name: &str,
    ) -> Result<Credentials, ServiceError> {
        (**self)
            .get_role_credentials(token, account_id, role_name)
            .await
    }
}
