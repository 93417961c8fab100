//! Styled status lines shared by the CLI and the session flow.

use std::io::{self, Write};

use crossterm::style::Stylize;

pub fn header<W: Write>(out: &mut W) -> io::Result<()> {
    let bar = "══════════════════════════════════════════";
    writeln!(out)?;
    writeln!(out, "{}", format!("╔{bar}╗").bold().cyan())?;
    writeln!(
        out,
        "{}",
        "║          AWS Terminal Session            ║".bold().cyan()
    )?;
    writeln!(out, "{}", format!("╚{bar}╝").bold().cyan())?;
    writeln!(out)
}

pub fn info<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.cyan())
}

pub fn success<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "\n{}", format!("✓ {message}").green())
}

pub fn error<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "\n{}", format!("✗ {message}").red())
}

pub fn warning<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.yellow())
}
