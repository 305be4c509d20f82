//! In-memory terminal backend for testing.

use std::sync::{Arc, Mutex};

use crate::error::Result;

use super::caps::Capabilities;
use super::traits::Terminal;

/// In-memory terminal backend.
///
/// All output is captured in a shared byte buffer; clone the handle
/// from [`TestTerminal::shared_output`] before handing the backend off
/// to inspect what it wrote.
pub struct TestTerminal {
    size: (u16, u16),
    caps: Capabilities,
    output: Arc<Mutex<Vec<u8>>>,
    raw_mode: bool,
    alt_screen: bool,
    mouse_enabled: bool,
    cursor_hidden: bool,
}

impl TestTerminal {
    /// Create a new test backend with the given size.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: (width, height),
            caps: Capabilities::default(),
            output: Arc::new(Mutex::new(Vec::new())),
            raw_mode: false,
            alt_screen: false,
            mouse_enabled: false,
            cursor_hidden: false,
        }
    }

    /// A handle to the capture buffer that stays valid after the
    /// backend is moved.
    pub fn shared_output(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.output)
    }

    /// The bytes written to this backend.
    pub fn output(&self) -> Vec<u8> {
        self.output.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// The output decoded as UTF-8 (lossy).
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output()).into_owned()
    }

    /// Discard captured output.
    pub fn clear_output(&mut self) {
        if let Ok(mut g) = self.output.lock() {
            g.clear();
        }
    }

    /// Check if raw mode is active.
    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode
    }

    /// Check if the alternate screen is active.
    pub fn is_alt_screen(&self) -> bool {
        self.alt_screen
    }

    /// Check if mouse reporting is active.
    pub fn is_mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    /// Check if the cursor is hidden.
    pub fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    /// Simulate a terminal resize.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = (width, height);
    }
}

impl Terminal for TestTerminal {
    fn size(&self) -> Result<(u16, u16)> {
        Ok(self.size)
    }

    fn caps(&self) -> &Capabilities {
        &self.caps
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = true;
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = false;
        Ok(())
    }

    fn enter_alt_screen(&mut self) -> Result<()> {
        self.alt_screen = true;
        self.write_direct(super::escape::ALT_SCREEN_ENTER.as_bytes())
    }

    fn exit_alt_screen(&mut self) -> Result<()> {
        self.alt_screen = false;
        self.write_direct(super::escape::ALT_SCREEN_EXIT.as_bytes())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.cursor_hidden = true;
        self.write_direct(super::escape::CURSOR_HIDE.as_bytes())
    }

    fn show_cursor(&mut self) -> Result<()> {
        self.cursor_hidden = false;
        self.write_direct(super::escape::CURSOR_SHOW.as_bytes())
    }

    fn write_direct(&mut self, bytes: &[u8]) -> Result<()> {
        if let Ok(mut g) = self.output.lock() {
            g.extend_from_slice(bytes);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn enable_mouse(&mut self) -> Result<()> {
        self.mouse_enabled = true;
        self.write_direct(super::escape::MOUSE_ENABLE.as_bytes())
    }

    fn disable_mouse(&mut self) -> Result<()> {
        self.mouse_enabled = false;
        self.write_direct(super::escape::MOUSE_DISABLE.as_bytes())
    }
}
