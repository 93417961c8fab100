//! Shared HTTP client and AWS error decoding.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use super::error::ServiceError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

pub const BEARER_HEADER: &str = "x-amz-sso_bearer_token";
pub const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Headers for portal calls authorized by an SSO access token.
///
/// A token that cannot be sent as a header value is rejected rather than
/// dropped, so the call never goes out unauthenticated.
pub fn bearer_headers(access_token: &str) -> Result<HeaderMap, ServiceError> {
    let value = HeaderValue::from_str(access_token).map_err(|_| {
        ServiceError::InvalidResponse("access token is not a valid header value".to_string())
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(BEARER_HEADER, value);
    Ok(headers)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Build a [`ServiceError`] from a failed response.
///
/// The code comes from the `x-amzn-ErrorType` header when present, then the
/// body's `error` or `__type` field.
pub fn status_to_error(status: u16, error_type: Option<&str>, body: &str) -> ServiceError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = error_type
        .and_then(|value| value.split(':').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or(parsed.error)
        .or_else(|| {
            parsed
                .kind
                .as_deref()
                .and_then(|kind| kind.rsplit('#').next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "UnknownError".to_string());
    let message = parsed
        .error_description
        .or(parsed.message)
        .unwrap_or_else(|| body.trim().to_string());
    ServiceError::api(status, code, message)
}

/// Decode a JSON body, or turn a non-success response into an error.
pub async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let error_type = resp
        .headers()
        .get(ERROR_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = resp.text().await.unwrap_or_default();
    Err(status_to_error(status.as_u16(), error_type.as_deref(), &body))
}
