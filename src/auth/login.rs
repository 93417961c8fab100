use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::device_code::{
    DeviceAuthorization, LoginState, CLIENT_NAME, CLIENT_TYPE, DEVICE_GRANT_TYPE, SCOPES,
};
use super::error::AuthError;
use super::token::AccessToken;
use crate::sso::{ClientRegistration, IdentityService, TokenPoll};

/// Progress notifications emitted while a login runs.
#[derive(Debug)]
pub enum LoginEvent<'a> {
    /// The user code is ready to show and the verification URI to open.
    CodeIssued(&'a DeviceAuthorization),
    Pending,
    SlowDown { interval: Duration },
}

/// Drives one device-authorization attempt against an [`IdentityService`].
///
/// Each step checks the previous one succeeded; [`DeviceLogin::run`] chains
/// them and is what callers normally use.
pub struct DeviceLogin<'a, S: IdentityService + ?Sized> {
    service: &'a S,
    start_url: &'a str,
    cancel: CancellationToken,
    state: LoginState,
}

impl<'a, S: IdentityService + ?Sized> DeviceLogin<'a, S> {
    pub fn new(service: &'a S, start_url: &'a str) -> Self {
        Self {
            service,
            start_url,
            cancel: CancellationToken::new(),
            state: LoginState::Unregistered,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub async fn register(&mut self) -> Result<ClientRegistration, AuthError> {
        match self
            .service
            .register_client(CLIENT_NAME, CLIENT_TYPE, SCOPES)
            .await
        {
            Ok(client) => {
                tracing::debug!(client_id = %client.client_id, "registered device client");
                self.state = LoginState::Registered;
                Ok(client)
            }
            Err(err) => {
                self.state = LoginState::Failed;
                Err(AuthError::RegistrationFailed(err))
            }
        }
    }

    pub async fn start(
        &mut self,
        client: ClientRegistration,
    ) -> Result<DeviceAuthorization, AuthError> {
        match self
            .service
            .start_device_authorization(&client, self.start_url)
            .await
        {
            Ok(grant) => {
                let session = DeviceAuthorization::new(client, grant);
                tracing::debug!(
                    interval_ms = session.poll_interval.as_millis() as u64,
                    expires_at = %session.expires_at,
                    "device authorization started"
                );
                self.state = LoginState::AuthorizationStarted;
                Ok(session)
            }
            Err(err) => {
                self.state = LoginState::Failed;
                Err(AuthError::AuthorizationStartFailed(err))
            }
        }
    }

    /// Exchange the device code until a token arrives, the code expires or
    /// the attempt is cancelled.
    ///
    /// The session is consumed; its backoff state ends with the attempt.
    pub async fn poll<F>(
        &mut self,
        mut session: DeviceAuthorization,
        on_event: &mut F,
    ) -> Result<AccessToken, AuthError>
    where
        F: FnMut(LoginEvent<'_>),
    {
        let cancel = self.cancel.clone();
        self.state = LoginState::Polling;
        loop {
            if session.is_expired() {
                tracing::debug!("device code expired before approval");
                self.state = LoginState::Expired;
                return Err(AuthError::AuthorizationTimedOut);
            }

            let wait = match self
                .service
                .exchange_token(&session.client, DEVICE_GRANT_TYPE, &session.device_code)
                .await
            {
                Ok(TokenPoll::Authorized(token)) => {
                    self.state = LoginState::Authenticated;
                    return Ok(token);
                }
                Ok(TokenPoll::Pending) => {
                    on_event(LoginEvent::Pending);
                    session.poll_interval
                }
                Ok(TokenPoll::SlowDown) => {
                    let interval = session.back_off();
                    tracing::debug!(
                        interval_ms = interval.as_millis() as u64,
                        "service asked to slow down"
                    );
                    on_event(LoginEvent::SlowDown { interval });
                    interval
                }
                Err(err) => {
                    self.state = LoginState::Failed;
                    return Err(AuthError::TokenExchangeFailed(err));
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.state = LoginState::Failed;
                    return Err(AuthError::Cancelled);
                }
                _ = tokio::time::sleep(wait.min(session.remaining())) => {}
            }
        }
    }

    /// Register, start authorization, announce the code and poll.
    pub async fn run<F>(&mut self, mut on_event: F) -> Result<AccessToken, AuthError>
    where
        F: FnMut(LoginEvent<'_>),
    {
        let client = self.register().await?;
        let session = self.start(client).await?;
        on_event(LoginEvent::CodeIssued(&session));
        if self.cancel.is_cancelled() {
            self.state = LoginState::Failed;
            return Err(AuthError::Cancelled);
        }
        self.poll(session, &mut on_event).await
    }
}
