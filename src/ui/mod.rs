//! Keyboard-driven list selection and line prompts.

pub mod output;
mod selector;

pub use selector::{parse_index, Choice, ListCursor, Selector, KEY_HINT};

use thiserror::Error;

use crate::terminal::TerminalError;

/// Errors raised by selection and prompting.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("No items available to select from")]
    EmptyList,
    #[error("Invalid selection: {0:?}")]
    InvalidSelection(String),
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One selectable row: a label, an optional second line and an opaque value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    pub label: String,
    pub detail: Option<String>,
    /// Marks the configured default; the cursor starts on the first one.
    pub preferred: bool,
    pub value: V,
}

impl<V> Entry<V> {
    pub fn new(label: impl Into<String>, value: V) -> Self {
        Self {
            label: label.into(),
            detail: None,
            preferred: false,
            value,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn preferred(mut self, preferred: bool) -> Self {
        self.preferred = preferred;
        self
    }

    /// Terminal rows this entry occupies when rendered.
    pub fn rows(&self) -> usize {
        if self.detail.is_some() {
            2
        } else {
            1
        }
    }
}

/// Index of the first preferred entry, or 0.
pub fn preferred_index<V>(entries: &[Entry<V>]) -> usize {
    entries.iter().position(|e| e.preferred).unwrap_or(0)
}

/// Something that can resolve a choice among entries.
///
/// [`Selector`] is the interactive implementation; the session flow is
/// generic over this so each step can be driven without a terminal.
pub trait Picker {
    fn select<V>(&mut self, title: &str, entries: &[Entry<V>]) -> Result<usize, UiError>;

    /// Select and borrow the chosen entry's value.
    fn select_value<'e, V>(
        &mut self,
        title: &str,
        entries: &'e [Entry<V>],
    ) -> Result<&'e V, UiError> {
        let index = self.select(title, entries)?;
        entries
            .get(index)
            .map(|entry| &entry.value)
            .ok_or_else(|| UiError::InvalidSelection(index.to_string()))
    }
}
