use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveToPreviousLine, Show};
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};

use super::{output, preferred_index, Entry, Picker, UiError};
use crate::terminal::{self, Key, RawSession, Terminal};

pub const KEY_HINT: &str = "Use ↑/↓ arrows to navigate, Enter to select, q to quit";

/// Result of one interactive selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Picked(usize),
    /// The user asked to abandon the whole program.
    Quit,
}

/// Cursor over a non-empty list; movement clamps at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListCursor {
    len: usize,
    index: usize,
}

impl ListCursor {
    pub fn new(len: usize, start: usize) -> Self {
        Self {
            len,
            index: start.min(len.saturating_sub(1)),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.index + 1 < self.len {
            self.index += 1;
        }
    }
}

/// Interactive single-column selector over a [`Terminal`].
///
/// Falls back to a typed 1-based index when stdin is not a terminal.
pub struct Selector<T: Terminal, W: Write> {
    term: T,
    out: W,
}

impl<T: Terminal, W: Write> Selector<T, W> {
    pub fn new(term: T, out: W) -> Self {
        Self { term, out }
    }

    pub fn terminal(&self) -> &T {
        &self.term
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_parts(self) -> (T, W) {
        (self.term, self.out)
    }

    /// Resolve a choice without exiting on quit.
    pub fn pick<V>(&mut self, title: &str, entries: &[Entry<V>]) -> Result<Choice, UiError> {
        match entries {
            [] => return Err(UiError::EmptyList),
            [only] => {
                output::info(&mut self.out, &format!("Using {}", only.label))?;
                return Ok(Choice::Picked(0));
            }
            _ => {}
        }

        write!(self.out, "\n{}\n\n", title.bold().cyan())?;
        if !self.term.is_interactive() {
            return self.pick_numbered(entries).map(Choice::Picked);
        }

        let mut cursor = ListCursor::new(entries.len(), preferred_index(entries));
        let Self { term, out } = self;
        let mut raw = RawSession::acquire(term)?;
        queue!(out, Hide)?;
        let outcome = drive(&mut raw, out, entries, &mut cursor);
        let shown = execute!(out, Show);
        raw.release()?;
        shown?;

        let choice = outcome?;
        if let Choice::Picked(index) = choice {
            tracing::debug!(index, title, "selection confirmed");
        }
        Ok(choice)
    }

    /// Prompt for one line of input, trimmed.
    pub fn input(&mut self, prompt: &str) -> Result<String, UiError> {
        write!(self.out, "{}: ", prompt.yellow())?;
        self.out.flush()?;
        let line = self.term.read_line()?;
        Ok(line.trim().to_string())
    }

    /// Yes/no prompt; an empty answer takes `default_yes`.
    pub fn confirm(&mut self, prompt: &str, default_yes: bool) -> Result<bool, UiError> {
        let answer = self.input(prompt)?.to_lowercase();
        Ok(match answer.as_str() {
            "" => default_yes,
            "y" | "yes" => true,
            _ => false,
        })
    }

    fn pick_numbered<V>(&mut self, entries: &[Entry<V>]) -> Result<usize, UiError> {
        for (i, entry) in entries.iter().enumerate() {
            writeln!(self.out, "  {}. {}", i + 1, entry.label)?;
            if let Some(detail) = &entry.detail {
                writeln!(self.out, "     {}", detail.as_str().blue())?;
            }
        }
        writeln!(self.out)?;
        let input = self.input("Enter number")?;
        parse_index(&input, entries.len())
    }
}

impl<T: Terminal, W: Write> Picker for Selector<T, W> {
    fn select<V>(&mut self, title: &str, entries: &[Entry<V>]) -> Result<usize, UiError> {
        match self.pick(title, entries)? {
            Choice::Picked(index) => Ok(index),
            Choice::Quit => {
                let _ = writeln!(self.out, "Cancelled.");
                terminal::exit_restored(0)
            }
        }
    }
}

/// Parse a 1-based index typed by the user into a 0-based one.
pub fn parse_index(input: &str, len: usize) -> Result<usize, UiError> {
    let trimmed = input.trim();
    trimmed
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
        .ok_or_else(|| UiError::InvalidSelection(trimmed.to_string()))
}

fn drive<T, W, V>(
    raw: &mut RawSession<'_, T>,
    out: &mut W,
    entries: &[Entry<V>],
    cursor: &mut ListCursor,
) -> Result<Choice, UiError>
where
    T: Terminal + ?Sized,
    W: Write,
{
    loop {
        let rows = render(out, entries, cursor.index())?;
        let key = raw.read_key();
        erase(out, rows)?;
        match key? {
            Key::Up => cursor.up(),
            Key::Down => cursor.down(),
            Key::Confirm => {
                if let Some(entry) = entries.get(cursor.index()) {
                    write!(out, "  {} {}\r\n", "✓".green(), entry.label)?;
                }
                return Ok(Choice::Picked(cursor.index()));
            }
            Key::Quit => return Ok(Choice::Quit),
            Key::Ignored => {}
        }
    }
}

/// Draw every entry plus the hint; returns the number of rows written.
fn render<W: Write, V>(out: &mut W, entries: &[Entry<V>], cursor: usize) -> io::Result<u16> {
    for (i, entry) in entries.iter().enumerate() {
        let marker = if entry.preferred {
            format!(" {}", "(default)".green())
        } else {
            String::new()
        };
        if i == cursor {
            write!(
                out,
                "  {} {}{}\r\n",
                "▸".cyan(),
                entry.label.as_str().bold(),
                marker
            )?;
        } else {
            write!(out, "    {}{}\r\n", entry.label, marker)?;
        }
        if let Some(detail) = &entry.detail {
            write!(out, "    {}\r\n", detail.as_str().blue())?;
        }
    }
    write!(out, "\r\n{}\r\n", KEY_HINT.yellow())?;
    out.flush()?;

    let rows: usize = entries.iter().map(Entry::rows).sum::<usize>() + 2;
    Ok(u16::try_from(rows).unwrap_or(u16::MAX))
}

fn erase<W: Write>(out: &mut W, rows: u16) -> io::Result<()> {
    queue!(out, MoveToPreviousLine(rows), Clear(ClearType::FromCursorDown))?;
    out.flush()
}
