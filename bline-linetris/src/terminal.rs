//! Raw-mode terminal session.

use std::io::{self, Write};

use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};

/// Holds the terminal in raw mode on the alternate screen.
///
/// The terminal is restored on [`restore`](Self::restore) or on drop,
/// whichever comes first, so early returns never leave it raw.
pub struct TerminalGuard<W: Write> {
    out: W,
    raw: bool,
    active: bool,
}

impl<W: Write> TerminalGuard<W> {
    /// Enable raw mode and switch `out` to the alternate screen.
    pub fn enter(out: W) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Self::start(out, true)
    }

    #[cfg(test)]
    fn screen_only(out: W) -> io::Result<Self> {
        Self::start(out, false)
    }

    fn start(out: W, raw: bool) -> io::Result<Self> {
        let mut guard = Self {
            out,
            raw,
            active: true,
        };
        execute!(guard.out, EnterAlternateScreen)?;
        Ok(guard)
    }

    /// Leave the alternate screen and raw mode. Later calls do nothing.
    pub fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let raw = if self.raw {
            terminal::disable_raw_mode()
        } else {
            Ok(())
        };
        execute!(self.out, LeaveAlternateScreen)?;
        raw
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!("failed to restore terminal: {e}");
        }
    }
}
