use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use super::http::{bearer_headers, read_json, shared_client};
use super::{
    Account, ClientRegistration, Credentials, DeviceCodeGrant, IdentityService, Role, TokenPoll,
};
use crate::auth::AccessToken;

const PAGE_SIZE: &str = "100";

/// HTTP client for the AWS SSO OIDC and portal APIs of one region.
///
/// # Example
/// ```no_run
/// use aws_term::sso::SsoClient;
///
/// let client = SsoClient::new("eu-west-1");
/// assert_eq!(client.region(), "eu-west-1");
/// ```
#[derive(Debug, Clone)]
pub struct SsoClient {
    client: reqwest::Client,
    region: String,
    oidc_endpoint: String,
    portal_endpoint: String,
}

impl SsoClient {
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            client: shared_client().clone(),
            oidc_endpoint: format!("https://oidc.{region}.amazonaws.com"),
            portal_endpoint: format!("https://portal.sso.{region}.amazonaws.com"),
            region,
        }
    }

    pub fn with_oidc_endpoint(mut self, url: impl Into<String>) -> Self {
        self.oidc_endpoint = trim_base(url.into());
        self
    }

    pub fn with_portal_endpoint(mut self, url: impl Into<String>) -> Self {
        self.portal_endpoint = trim_base(url.into());
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Follow `nextToken` until the portal stops returning one.
    async fn paged<T, P>(
        &self,
        path: &str,
        token: &AccessToken,
        base_query: &[(&str, &str)],
    ) -> Result<Vec<T>, ServiceError>
    where
        P: Page<Item = T> + serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.portal_endpoint);
        let mut items = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let headers = bearer_headers(token.secret())?;
            let request = {
                let mut query: Vec<(&str, &str)> = base_query.to_vec();
                query.push(("max_result", PAGE_SIZE));
                if let Some(next) = next_token.as_deref() {
                    query.push(("next_token", next));
                }
                self.client
                    .get(&url)
                    .headers(headers)
                    .query(&query)
            };
            let resp = request.send().await?;
            let page: P = read_json(resp).await?;
            let (batch, next) = page.into_parts();
            items.extend(batch);
            match next.filter(|n| !n.is_empty()) {
                Some(next) => next_token = Some(next),
                None => break,
            }
        }
        tracing::debug!(path, count = items.len(), "portal listing complete");
        Ok(items)
    }
}

#[async_trait]
impl IdentityService for SsoClient {
    async fn register_client(
        &self,
        client_name: &str,
        client_type: &str,
        scopes: &[&str],
    ) -> Result<ClientRegistration, ServiceError> {
        let resp = self
            .client
            .post(format!("{}/client/register", self.oidc_endpoint))
            .json(&RegisterClientRequest {
                client_name,
                client_type,
                scopes,
            })
            .send()
            .await?;
        let payload: RegisterClientResponse = read_json(resp).await?;
        Ok(ClientRegistration {
            client_id: payload.client_id,
            client_secret: payload.client_secret,
            expires_at: payload
                .client_secret_expires_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }

    async fn start_device_authorization(
        &self,
        client: &ClientRegistration,
        start_url: &str,
    ) -> Result<DeviceCodeGrant, ServiceError> {
        let resp = self
            .client
            .post(format!("{}/device_authorization", self.oidc_endpoint))
            .json(&StartDeviceAuthorizationRequest {
                client_id: &client.client_id,
                client_secret: &client.client_secret,
                start_url,
            })
            .send()
            .await?;
        let payload: StartDeviceAuthorizationResponse = read_json(resp).await?;
        Ok(DeviceCodeGrant {
            device_code: payload.device_code,
            user_code: payload.user_code,
            verification_uri: payload.verification_uri,
            verification_uri_complete: payload.verification_uri_complete,
            expires_in: payload.expires_in,
            interval: payload.interval,
        })
    }

    async fn exchange_token(
        &self,
        client: &ClientRegistration,
        grant_type: &str,
        device_code: &str,
    ) -> Result<TokenPoll, ServiceError> {
        let resp = self
            .client
            .post(format!("{}/token", self.oidc_endpoint))
            .json(&CreateTokenRequest {
                client_id: &client.client_id,
                client_secret: &client.client_secret,
                grant_type,
                device_code,
            })
            .send()
            .await?;
        match read_json::<CreateTokenResponse>(resp).await {
            Ok(payload) => Ok(TokenPoll::Authorized(AccessToken {
                access_token: payload.access_token,
                token_type: payload.token_type,
                expires_at: payload
                    .expires_in
                    .map(|secs| Utc::now() + Duration::seconds(secs)),
            })),
            Err(err) => match err.code().and_then(TokenPoll::from_error_code) {
                Some(poll) => Ok(poll),
                None => Err(err),
            },
        }
    }

    async fn list_accounts(&self, token: &AccessToken) -> Result<Vec<Account>, ServiceError> {
        let accounts = self
            .paged::<AccountInfo, AccountPage>("/assignment/accounts", token, &[])
            .await?;
        Ok(accounts
            .into_iter()
            .map(|info| Account {
                account_id: info.account_id,
                account_name: info.account_name.unwrap_or_default(),
                email_address: info.email_address,
            })
            .collect())
    }

    async fn list_roles(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<Vec<Role>, ServiceError> {
        let roles = self
            .paged::<RoleInfo, RolePage>(
                "/assignment/roles",
                token,
                &[("account_id", account_id)],
            )
            .await?;
        Ok(roles
            .into_iter()
            .map(|info| Role {
                role_name: info.role_name,
                account_id: info
                    .account_id
                    .unwrap_or_else(|| account_id.to_string()),
            })
            .collect())
    }

    async fn get_role_credentials(
        &self,
        token: &AccessToken,
        account_id: &str,
        role_name: &str,
    ) -> Result<Credentials, ServiceError> {
        let headers = bearer_headers(token.secret())?;
        let resp = self
            .client
            .get(format!("{}/federation/credentials", self.portal_endpoint))
            .headers(headers)
            .query(&[("account_id", account_id), ("role_name", role_name)])
            .send()
            .await?;
        let payload: RoleCredentialsResponse = read_json(resp).await?;
        let creds = payload.role_credentials;
        let expiration = DateTime::from_timestamp_millis(creds.expiration).ok_or_else(|| {
            ServiceError::InvalidResponse(format!(
                "credential expiration out of range: {}",
                creds.expiration
            ))
        })?;
        Ok(Credentials {
            access_key_id: creds.access_key_id,
            secret_access_key: creds.secret_access_key,
            session_token: creds.session_token,
            expiration,
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

trait Page {
    type Item;
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterClientRequest<'a> {
    client_name: &'a str,
    client_type: &'a str,
    scopes: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterClientResponse {
    client_id: String,
    client_secret: String,
    client_secret_expires_at: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartDeviceAuthorizationRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    start_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartDeviceAuthorizationResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    verification_uri_complete: Option<String>,
    expires_in: u64,
    interval: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    device_code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenResponse {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    account_id: String,
    account_name: Option<String>,
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountPage {
    #[serde(default)]
    account_list: Vec<AccountInfo>,
    next_token: Option<String>,
}

impl Page for AccountPage {
    type Item = AccountInfo;
    fn into_parts(self) -> (Vec<AccountInfo>, Option<String>) {
        (self.account_list, self.next_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleInfo {
    role_name: String,
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RolePage {
    #[serde(default)]
    role_list: Vec<RoleInfo>,
    next_token: Option<String>,
}

impl Page for RolePage {
    type Item = RoleInfo;
    fn into_parts(self) -> (Vec<RoleInfo>, Option<String>) {
        (self.role_list, self.next_token)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleCredentialsResponse {
    role_credentials: RoleCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: i64,
}
