//! Broad classification used to pick exit guidance.

/// Where an error came from, from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input: profile names, start URLs, selections.
    Input,
    Configuration,
    /// The login itself did not complete.
    Authentication,
    /// The identity service rejected or failed a call.
    Service,
    Network,
    /// Nothing to choose from (no browsers, accounts or roles).
    Unavailable,
    Local,
}

/// Suggested next step for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    CheckInput,
    CheckConfiguration,
    RetryLogin,
    CheckAssignments,
    RetryLater,
    None,
}

impl ErrorCategory {
    pub fn recovery_suggestion(self) -> RecoverySuggestion {
        match self {
            Self::Input => RecoverySuggestion::CheckInput,
            Self::Configuration => RecoverySuggestion::CheckConfiguration,
            Self::Authentication => RecoverySuggestion::RetryLogin,
            Self::Unavailable => RecoverySuggestion::CheckAssignments,
            Self::Service | Self::Network => RecoverySuggestion::RetryLater,
            Self::Local => RecoverySuggestion::None,
        }
    }
}
