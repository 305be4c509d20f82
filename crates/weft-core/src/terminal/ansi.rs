//! ANSI terminal backend over stdout.
//!
//! Raw-mode enable/disable and size queries go through crossterm; all
//! escape emission is hand-built (see [`super::escape`]). The backend
//! tracks every mode it acquired and releases them in reverse order in
//! `restore`, which also runs on drop so a panic unwinds to a usable
//! terminal.

use std::io::{self, Write};

use crossterm::terminal;

use crate::error::Result;

use super::caps::{self, Capabilities};
use super::escape;
use super::traits::Terminal;

/// Terminal backend writing ANSI escape sequences to stdout.
pub struct AnsiTerminal {
    caps: Capabilities,
    out: io::Stdout,
    raw_mode: bool,
    alt_screen: bool,
    mouse: bool,
    cursor_hidden: bool,
}

impl AnsiTerminal {
    /// Create a new backend, detecting capabilities from the environment.
    pub fn new() -> Self {
        Self {
            caps: caps::detect(),
            out: io::stdout(),
            raw_mode: false,
            alt_screen: false,
            mouse: false,
            cursor_hidden: false,
        }
    }

    /// Restore every acquired mode: mouse reporting off, cursor shown,
    /// alternate screen left, raw mode exited.
    pub fn restore(&mut self) -> Result<()> {
        if self.mouse {
            self.disable_mouse()?;
        }
        if self.cursor_hidden {
            self.show_cursor()?;
        }
        if self.alt_screen {
            self.exit_alt_screen()?;
        }
        self.flush()?;
        if self.raw_mode {
            self.exit_raw_mode()?;
        }
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.out.write_all(s.as_bytes())?;
        Ok(())
    }
}

impl Default for AnsiTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for AnsiTerminal {
    fn size(&self) -> Result<(u16, u16)> {
        let (w, h) = terminal::size()?;
        Ok((w, h))
    }

    fn caps(&self) -> &Capabilities {
        &self.caps
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        if !self.raw_mode {
            terminal::enable_raw_mode()?;
            self.raw_mode = true;
        }
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        if self.raw_mode {
            terminal::disable_raw_mode()?;
            self.raw_mode = false;
        }
        Ok(())
    }

    fn enter_alt_screen(&mut self) -> Result<()> {
        if !self.alt_screen {
            self.write_str(escape::ALT_SCREEN_ENTER)?;
            self.alt_screen = true;
        }
        Ok(())
    }

    fn exit_alt_screen(&mut self) -> Result<()> {
        if self.alt_screen {
            self.write_str(escape::ALT_SCREEN_EXIT)?;
            self.alt_screen = false;
        }
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        if !self.cursor_hidden {
            self.write_str(escape::CURSOR_HIDE)?;
            self.cursor_hidden = true;
        }
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<()> {
        if self.cursor_hidden {
            self.write_str(escape::CURSOR_SHOW)?;
            self.cursor_hidden = false;
        }
        Ok(())
    }

    fn write_direct(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn enable_mouse(&mut self) -> Result<()> {
        if !self.mouse {
            self.write_str(escape::MOUSE_ENABLE)?;
            self.mouse = true;
        }
        Ok(())
    }

    fn disable_mouse(&mut self) -> Result<()> {
        if self.mouse {
            self.write_str(escape::MOUSE_DISABLE)?;
            self.mouse = false;
        }
        Ok(())
    }
}

impl Drop for AnsiTerminal {
    fn drop(&mut self) {
        if self.restore().is_err() {
            tracing::warn!("failed to restore terminal state on drop");
        }
    }
}
