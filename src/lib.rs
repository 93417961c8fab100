//! aws-term: temporary AWS credentials from an SSO device login.
//!
//! The login registers a public OIDC client, shows a verification code,
//! opens the browser and polls until the user approves. Accounts and roles
//! are then picked with a keyboard-driven selector and the role credentials
//! are exported for the shell.
//!
//! # Quick Start
//!
//! ```no_run
//! use aws_term::auth::DeviceLogin;
//! use aws_term::sso::SsoClient;
//!
//! # async fn example() -> Result<(), aws_term::auth::AuthError> {
//! let client = SsoClient::new("us-east-1");
//! let mut login = DeviceLogin::new(&client, "https://my-org.awsapps.com/start");
//! let token = login.run(|_event| {}).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod browser;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod session;
pub mod shell;
pub mod sso;
pub mod terminal;
pub mod ui;

#[cfg(feature = "cli")]
pub mod cli;
