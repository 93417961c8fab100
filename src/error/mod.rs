//! Error types for aws-term.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::AuthError;
use crate::sso::region::StartUrlError;
use crate::sso::ServiceError;
use crate::ui::UiError;

/// Primary error type for a session run.
#[derive(Error, Debug)]
pub enum AwsTermError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(#[from] StartUrlError),

    #[error("No supported browsers found")]
    NoBrowserFound,

    #[error("No AWS accounts available")]
    NoAccounts,

    #[error("No roles available for account {account}")]
    NoRoles { account: String },

    #[error(transparent)]
    Ui(#[from] UiError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to list accounts: {0}")]
    ListAccounts(#[source] ServiceError),

    #[error("Failed to list roles: {0}")]
    ListRoles(#[source] ServiceError),

    #[error("Failed to get role credentials: {0}")]
    RoleCredentials(#[source] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AwsTermError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ProfileNotFound(_) | Self::InvalidInput(_) | Self::InvalidStartUrl(_) => {
                ErrorCategory::Input
            }
            Self::Ui(UiError::EmptyList | UiError::InvalidSelection(_)) => ErrorCategory::Input,
            Self::Ui(_) | Self::Io(_) => ErrorCategory::Local,
            Self::Configuration(_) | Self::Serialization(_) => ErrorCategory::Configuration,
            Self::NoBrowserFound | Self::NoAccounts | Self::NoRoles { .. } => {
                ErrorCategory::Unavailable
            }
            Self::Auth(AuthError::TokenExchangeFailed(ServiceError::Network(_))) => {
                ErrorCategory::Network
            }
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::ListAccounts(source) | Self::ListRoles(source) | Self::RoleCredentials(source) => {
                match source {
                    ServiceError::Network(_) => ErrorCategory::Network,
                    _ => ErrorCategory::Service,
                }
            }
        }
    }

    /// Errors caused by what the user typed or chose, not by the environment.
    pub fn is_user_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }
}

impl From<toml::de::Error> for AwsTermError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for AwsTermError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AwsTermError>;

/// Map an [`AwsTermError`] to a user-facing message with actionable guidance.
pub fn format_error_help(err: &AwsTermError) -> String {
    match err {
        AwsTermError::ProfileNotFound(name) => {
            format!("Profile '{name}' not found. Run: aws-term list")
        }
        AwsTermError::InvalidStartUrl(_) => {
            format!("{err}. Expected something like https://my-org.awsapps.com/start")
        }
        AwsTermError::NoBrowserFound => {
            "No supported browsers found. Install Chrome, Firefox, Brave, Edge or Safari".to_string()
        }
        AwsTermError::Auth(AuthError::AuthorizationTimedOut) => {
            "The login was not approved in time. Run aws-term again and approve it in the browser"
                .to_string()
        }
        AwsTermError::Auth(AuthError::Cancelled) => "Login cancelled".to_string(),
        AwsTermError::NoAccounts | AwsTermError::NoRoles { .. } => {
            format!("{err}. Check your permission set assignments in IAM Identity Center")
        }
        other => match other.category().recovery_suggestion() {
            RecoverySuggestion::RetryLater => format!("{other}. Check your connection and retry"),
            RecoverySuggestion::CheckConfiguration => {
                format!("{other}. Check ~/.aws-terminal/config.toml or run: aws-term add")
            }
            _ => format!("{other}"),
        },
    }
}
