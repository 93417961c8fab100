mod support;

use std::time::Duration;

use aws_term::auth::device_code::{DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
use aws_term::auth::{AuthError, DeviceLogin, LoginEvent, LoginState};
use aws_term::sso::{ServiceError, TokenPoll};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use support::{token, ScriptedService};

const START_URL: &str = "https://acme.awsapps.com/start";

#[tokio::test(start_paused = true)]
async fn slow_down_doubles_interval_and_it_persists() {
    let service = ScriptedService::new(Some(2), 600).with_polls(vec![
        Ok(TokenPoll::Pending),
        Ok(TokenPoll::Pending),
        Ok(TokenPoll::SlowDown),
        Ok(TokenPoll::Pending),
        Ok(token("access-1")),
    ]);

    let mut login = DeviceLogin::new(&service, START_URL);
    let token = login.run(|_| {}).await.expect("login");

    assert_eq!(token.secret(), "access-1");
    assert_eq!(login.state(), LoginState::Authenticated);
    assert_eq!(service.exchange_count(), 5);
    let secs = |s| Duration::from_secs(s);
    assert_eq!(service.exchange_gaps(), vec![secs(2), secs(2), secs(4), secs(4)]);
}

#[tokio::test(start_paused = true)]
async fn token_on_fourth_poll_takes_exactly_four_calls() {
    let service = ScriptedService::new(Some(1), 600).with_polls(vec![
        Ok(TokenPoll::Pending),
        Ok(TokenPoll::Pending),
        Ok(TokenPoll::Pending),
        Ok(token("access-2")),
    ]);

    let mut login = DeviceLogin::new(&service, START_URL);
    let mut pending = 0;
    let result = login
        .run(|event| {
            if matches!(event, LoginEvent::Pending) {
                pending += 1;
            }
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(login.state(), LoginState::Authenticated);
    assert_eq!(service.exchange_count(), 4);
    assert_eq!(pending, 3);
}

#[tokio::test(start_paused = true)]
async fn deadline_stops_polling_without_further_calls() {
    let service = ScriptedService::new(Some(4), 10);

    let mut login = DeviceLogin::new(&service, START_URL);
    let err = login.run(|_| {}).await.unwrap_err();

    assert!(matches!(err, AuthError::AuthorizationTimedOut));
    assert_eq!(login.state(), LoginState::Expired);
    // Calls at 0s, 4s and 8s; the next wake-up at 12s is past the deadline.
    assert_eq!(service.exchange_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_reported_at_the_deadline_after_slow_downs() {
    let service = ScriptedService::new(Some(4), 10)
        .with_polls(vec![Ok(TokenPoll::SlowDown), Ok(TokenPoll::SlowDown)]);
    let started = tokio::time::Instant::now();

    let mut login = DeviceLogin::new(&service, START_URL);
    let err = login.run(|_| {}).await.unwrap_err();

    assert!(matches!(err, AuthError::AuthorizationTimedOut));
    // Calls at 0s and 8s; the 16s back-off is cut short at the 10s deadline.
    assert_eq!(service.exchange_count(), 2);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn missing_interval_uses_default() {
    let service = ScriptedService::new(None, 600)
        .with_polls(vec![Ok(TokenPoll::Pending), Ok(token("access-3"))]);

    let mut login = DeviceLogin::new(&service, START_URL);
    login.run(|_| {}).await.expect("login");

    assert_eq!(service.exchange_gaps(), vec![DEFAULT_POLL_INTERVAL]);
    assert!(DEFAULT_POLL_INTERVAL >= MIN_POLL_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn code_is_announced_before_first_exchange() {
    let service = ScriptedService::new(Some(1), 600).with_polls(vec![Ok(token("access-4"))]);

    let mut login = DeviceLogin::new(&service, START_URL);
    let mut announced = None;
    login
        .run(|event| {
            if let LoginEvent::CodeIssued(session) = event {
                announced = Some((
                    session.user_code.clone(),
                    session.verification_uri.clone(),
                    service.exchange_count(),
                ));
            }
        })
        .await
        .expect("login");

    let (code, uri, calls_so_far) = announced.expect("code announced");
    assert_eq!(code, "ABCD-EFGH");
    assert!(uri.ends_with("?user_code=ABCD-EFGH"));
    assert_eq!(calls_so_far, 0);
}

#[tokio::test(start_paused = true)]
async fn unexpected_exchange_error_fails_immediately() {
    let service = ScriptedService::new(Some(1), 600).with_polls(vec![
        Ok(TokenPoll::Pending),
        Err(ServiceError::api(400, "AccessDeniedException", "denied")),
        Ok(token("never")),
    ]);

    let mut login = DeviceLogin::new(&service, START_URL);
    let err = login.run(|_| {}).await.unwrap_err();

    match err {
        AuthError::TokenExchangeFailed(cause) => {
            assert_eq!(cause.code(), Some("AccessDeniedException"));
        }
        other => panic!("expected TokenExchangeFailed, got {other:?}"),
    }
    assert_eq!(login.state(), LoginState::Failed);
    assert_eq!(service.exchange_count(), 2);
}

#[tokio::test]
async fn registration_failure_is_not_retried() {
    let service = ScriptedService::new(Some(1), 600)
        .failing_registration(ServiceError::Network("connection refused".into()));

    let mut login = DeviceLogin::new(&service, START_URL);
    let err = login.run(|_| {}).await.unwrap_err();

    assert!(matches!(err, AuthError::RegistrationFailed(_)));
    assert_eq!(login.state(), LoginState::Failed);
    assert_eq!(service.exchange_count(), 0);
}

#[tokio::test]
async fn start_failure_is_reported_distinctly() {
    let service = ScriptedService::new(Some(1), 600).failing_start(ServiceError::api(
        400,
        "InvalidRequestException",
        "bad start url",
    ));

    let mut login = DeviceLogin::new(&service, START_URL);
    let err = login.run(|_| {}).await.unwrap_err();

    assert!(matches!(err, AuthError::AuthorizationStartFailed(_)));
    assert_eq!(service.exchange_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_at_sleep_boundary() {
    let service = ScriptedService::new(Some(5), 600);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        trigger.cancel();
    });

    let mut login = DeviceLogin::new(&service, START_URL).with_cancellation(cancel);
    let err = login.run(|_| {}).await.unwrap_err();
    canceller.await.expect("canceller task");

    assert!(matches!(err, AuthError::Cancelled));
    assert_eq!(login.state(), LoginState::Failed);
    // Exchanges at 0s and 5s; cancelled during the second sleep.
    assert_eq!(service.exchange_count(), 2);
}

#[tokio::test]
async fn cancelled_before_polling_makes_no_exchange() {
    let service = ScriptedService::new(Some(1), 600);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut login = DeviceLogin::new(&service, START_URL).with_cancellation(cancel);
    let err = login.run(|_| {}).await.unwrap_err();

    assert!(matches!(err, AuthError::Cancelled));
    assert_eq!(service.exchange_count(), 0);
}
