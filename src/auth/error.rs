use thiserror::Error;

use crate::sso::ServiceError;

/// Ways a single device-authorization attempt can fail.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to register client: {0}")]
    RegistrationFailed(#[source] ServiceError),
    #[error("failed to start device authorization: {0}")]
    AuthorizationStartFailed(#[source] ServiceError),
    #[error("failed to get token: {0}")]
    TokenExchangeFailed(#[source] ServiceError),
    #[error("authorization timed out before the login was approved")]
    AuthorizationTimedOut,
    #[error("authorization cancelled")]
    Cancelled,
}
