//! Raw-mode access to the controlling terminal.
//!
//! [`RawSession`] is the only way the rest of the crate enters raw mode. It
//! restores the previous mode when released or dropped, and every forced exit
//! path (panic hook, termination signal, [`exit_restored`]) funnels through
//! [`restore_terminal`] so the parent shell is never left in raw mode.

mod keys;

pub use keys::{decode, Key};

use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::Show;
use crossterm::execute;
use thiserror::Error;

/// Set while the process-wide terminal is in raw mode.
static RAW_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Errors raised while acquiring or reading the terminal.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("Standard input is not an interactive terminal")]
    NotATerminal,
    #[error("Terminal input closed")]
    InputClosed,
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),
}

/// Low-level terminal operations used by [`RawSession`] and line prompts.
pub trait Terminal {
    /// Whether standard input is attached to an interactive terminal.
    fn is_interactive(&self) -> bool;
    fn enable_raw(&mut self) -> io::Result<()>;
    fn disable_raw(&mut self) -> io::Result<()>;
    /// Blocks until at least one byte is available.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Reads one line in cooked mode, without the trailing newline.
    fn read_line(&mut self) -> io::Result<String>;
}

/// The process's real stdin, switched with crossterm.
#[derive(Debug, Default)]
pub struct StdTerminal;

impl StdTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl Terminal for StdTerminal {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn enable_raw(&mut self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        RAW_ACTIVE.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable_raw(&mut self) -> io::Result<()> {
        if RAW_ACTIVE.swap(false, Ordering::SeqCst) {
            crossterm::terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::stdin().lock().read(buf)
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Scoped raw-mode acquisition.
///
/// Holding the session borrows the terminal mutably, so at most one raw-mode
/// acquisition can be live at a time.
pub struct RawSession<'a, T: Terminal + ?Sized> {
    term: &'a mut T,
    released: bool,
}

impl<'a, T: Terminal + ?Sized> RawSession<'a, T> {
    /// Enter raw mode, or fail with [`TerminalError::NotATerminal`] without
    /// touching the terminal mode.
    pub fn acquire(term: &'a mut T) -> Result<Self, TerminalError> {
        if !term.is_interactive() {
            return Err(TerminalError::NotATerminal);
        }
        term.enable_raw()?;
        tracing::trace!("raw mode acquired");
        Ok(Self {
            term,
            released: false,
        })
    }

    /// Block for the next key and decode it.
    pub fn read_key(&mut self) -> Result<Key, TerminalError> {
        let mut buf = [0u8; 3];
        let n = self.term.read_bytes(&mut buf)?;
        if n == 0 {
            return Err(TerminalError::InputClosed);
        }
        Ok(decode(&buf[..n]))
    }

    /// Restore the previous mode now instead of at drop.
    pub fn release(mut self) -> Result<(), TerminalError> {
        self.restore()?;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        tracing::trace!("raw mode released");
        self.term.disable_raw()
    }
}

impl<T: Terminal + ?Sized> Drop for RawSession<'_, T> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Put the real terminal back into cooked mode with a visible cursor.
///
/// Safe to call any number of times and from any thread.
pub fn restore_terminal() {
    if RAW_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), Show);
    }
}

/// Whether the real terminal is currently in raw mode.
pub fn raw_mode_active() -> bool {
    RAW_ACTIVE.load(Ordering::SeqCst)
}

/// Restore the terminal and terminate the process.
pub fn exit_restored(code: i32) -> ! {
    restore_terminal();
    let _ = io::stdout().flush();
    std::process::exit(code);
}

/// Chain a panic hook that restores the terminal before the default report.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        previous(info);
    }));
}
