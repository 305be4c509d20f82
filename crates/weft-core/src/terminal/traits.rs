//! Terminal trait.

use crate::buffer::CellChange;
use crate::error::Result;

use super::caps::Capabilities;
use super::escape;

/// Abstraction over terminal backends.
///
/// The default `flush_changes` turns cell changes into minimal escape
/// sequences via [`escape::render_changes`]; backends only supply raw
/// byte output and mode switches.
pub trait Terminal: Send {
    /// Get the current terminal size as (columns, rows).
    fn size(&self) -> Result<(u16, u16)>;

    /// Get the terminal's capabilities.
    fn caps(&self) -> &Capabilities;

    /// Enter raw mode (disable line buffering, echo, etc.).
    fn enter_raw_mode(&mut self) -> Result<()>;

    /// Exit raw mode (restore normal terminal state).
    fn exit_raw_mode(&mut self) -> Result<()>;

    /// Switch to the alternate screen.
    fn enter_alt_screen(&mut self) -> Result<()>;

    /// Return from the alternate screen.
    fn exit_alt_screen(&mut self) -> Result<()>;

    /// Hide the cursor.
    fn hide_cursor(&mut self) -> Result<()>;

    /// Show the cursor.
    fn show_cursor(&mut self) -> Result<()>;

    /// Move the cursor to (x, y), 0-indexed.
    fn set_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        let mut seq = String::new();
        escape::cursor_move(&mut seq, x, y);
        self.write_direct(seq.as_bytes())
    }

    /// Clear the whole screen.
    fn clear(&mut self) -> Result<()> {
        self.write_direct(escape::CLEAR.as_bytes())
    }

    /// Clear from the cursor position to the end of the screen.
    fn clear_to_end(&mut self) -> Result<()> {
        self.write_direct(escape::CLEAR_TO_END.as_bytes())
    }

    /// Flush a set of cell changes to the terminal with minimal escape
    /// sequences.
    fn flush_changes(&mut self, changes: &[CellChange]) -> Result<()> {
        let output = escape::render_changes(changes, self.caps().color_depth);
        if !output.is_empty() {
            self.write_direct(output.as_bytes())?;
            self.flush()?;
        }
        Ok(())
    }

    /// Write raw bytes to the terminal.
    fn write_direct(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flush buffered output to the terminal.
    fn flush(&mut self) -> Result<()>;

    /// Enable mouse event reporting.
    fn enable_mouse(&mut self) -> Result<()>;

    /// Disable mouse event reporting.
    fn disable_mouse(&mut self) -> Result<()>;
}
