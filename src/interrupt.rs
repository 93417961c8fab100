//! Ctrl+C handling.
//!
//! While a login is polling, the first interrupt cancels it through the
//! shared [`CancellationToken`] so the poll loop unwinds at its next sleep.
//! Anywhere else, or on a second press, the terminal is restored and the
//! process exits with 130. Interrupts are ignored while a session shell owns
//! the terminal; the child handles them itself.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::terminal;

static WATCHING: AtomicBool = AtomicBool::new(false);
static CHILD_ACTIVE: AtomicBool = AtomicBool::new(false);

pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ignore,
    Cancel,
    Exit,
}

/// What a single Ctrl+C should do given the current process state.
pub fn decide(child_active: bool, watching: bool, already_cancelled: bool) -> Action {
    if child_active {
        Action::Ignore
    } else if watching && !already_cancelled {
        Action::Cancel
    } else {
        Action::Exit
    }
}

/// Installs the Ctrl+C handler and returns the token it cancels.
#[cfg(feature = "cli")]
pub fn install() -> Result<CancellationToken, ctrlc::Error> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        match decide(
            CHILD_ACTIVE.load(Ordering::SeqCst),
            WATCHING.load(Ordering::SeqCst),
            handler_token.is_cancelled(),
        ) {
            Action::Ignore => {}
            Action::Cancel => handler_token.cancel(),
            Action::Exit => terminal::exit_restored(INTERRUPTED_EXIT_CODE),
        }
    })?;
    Ok(token)
}

/// Marks a region where the first interrupt cancels instead of exiting.
#[must_use]
pub fn watch() -> Flag {
    Flag::raise(&WATCHING)
}

/// Marks a region where a child process owns the terminal.
#[must_use]
pub fn child_active() -> Flag {
    Flag::raise(&CHILD_ACTIVE)
}

/// Lowers its flag on drop.
#[derive(Debug)]
pub struct Flag {
    flag: &'static AtomicBool,
}

impl Flag {
    fn raise(flag: &'static AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for Flag {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
