//! Inline-mode scroll-region bookkeeping.
//!
//! In inline mode a widget of fixed height sits at the bottom of the
//! terminal; content printed above it scrolls normally. The sequences
//! here restrict the scroll region to the rows above the widget so the
//! widget's cells are never disturbed, and height changes consume blank
//! rows before they push anything into scrollback.

use weft_core::terminal::escape;

/// Inline-mode geometry and history accounting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InlineState {
    /// Widget height in rows.
    pub height: u16,
    /// Terminal row of the widget's top (0-indexed).
    pub start_row: u16,
    /// Rows of content printed above the widget still on screen.
    pub history_rows: u16,
    /// Total terminal height.
    pub term_height: u16,
}

impl InlineState {
    /// Create inline state for a terminal of `term_height` rows and a
    /// widget of `height` rows (capped to the terminal).
    pub fn new(term_height: u16, height: u16) -> Self {
        let height = height.max(1).min(term_height);
        Self {
            height,
            start_row: term_height - height,
            history_rows: 0,
            term_height,
        }
    }

    /// Escape sequence printing `text` above the widget: restrict the
    /// scroll region to the rows above, write at its bottom, newline to
    /// scroll, reset the region. Widget cells are not repainted.
    pub fn print_above_seq(&mut self, text: &str) -> String {
        if self.start_row == 0 {
            // The widget fills the terminal; there is no region above.
            return String::new();
        }
        let mut out = String::new();
        escape::scroll_region(&mut out, 0, self.start_row - 1);
        escape::cursor_move(&mut out, 0, self.start_row - 1);
        out.push_str(text);
        out.push_str("\r\n");
        out.push_str(escape::SCROLL_REGION_RESET);

        let lines = text.split('\n').count() as u16;
        self.history_rows = (self.history_rows + lines).min(self.start_row);
        out
    }

    /// Escape sequence (if any) for changing the widget height, and the
    /// updated geometry. Growth consumes blank rows above the widget
    /// first; only when those run out does content scroll into
    /// scrollback. Shrinking clears the vacated rows.
    pub fn resize_seq(&mut self, new_height: u16) -> Option<String> {
        let new_height = new_height.max(1).min(self.term_height);
        if new_height == self.height {
            return None;
        }

        let mut out = String::new();
        let old_start = self.start_row;
        let new_start = self.term_height - new_height;

        if new_height > self.height {
            let grow = new_height - self.height;
            let blank_rows = old_start - self.history_rows;
            let scroll_needed = grow.saturating_sub(blank_rows);
            if scroll_needed > 0 && old_start > 0 {
                escape::scroll_region(&mut out, 0, old_start - 1);
                escape::cursor_move(&mut out, 0, old_start - 1);
                for _ in 0..scroll_needed {
                    out.push('\n');
                }
                out.push_str(escape::SCROLL_REGION_RESET);
                self.history_rows -= scroll_needed;
            }
        } else {
            // Vacated widget rows are cleared; content above stays put.
            escape::cursor_move(&mut out, 0, old_start);
            out.push_str(escape::CLEAR_TO_END);
        }

        self.height = new_height;
        self.start_row = new_start;
        self.history_rows = self.history_rows.min(new_start);
        Some(out)
    }

    /// Recompute geometry after a terminal resize.
    pub fn terminal_resized(&mut self, term_height: u16) {
        self.term_height = term_height;
        self.height = self.height.min(term_height).max(1);
        self.start_row = term_height - self.height;
        self.history_rows = self.history_rows.min(self.start_row);
    }

    /// Sequence positioning the cursor at the widget top and clearing
    /// from there (partial clear for a full inline redraw, and the exit
    /// sequence).
    pub fn clear_widget_seq(&self) -> String {
        let mut out = String::new();
        escape::cursor_move(&mut out, 0, self.start_row);
        out.push_str(escape::CLEAR_TO_END);
        out
    }
}
