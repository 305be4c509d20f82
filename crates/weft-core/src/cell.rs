//! Cell type — a single terminal cell.

use crate::style::Style;
use unicode_width::UnicodeWidthChar;

/// A single cell in the terminal screen buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// The rune displayed in this cell.
    pub rune: char,
    /// The style of this cell.
    pub style: Style,
    /// Display width (1 for most chars, 2 for CJK, 0 for continuation).
    pub width: u8,
}

impl Cell {
    /// Create a new cell, auto-detecting width from the rune.
    pub fn new(rune: char, style: Style) -> Self {
        let width = UnicodeWidthChar::width(rune).unwrap_or(0) as u8;
        Self { rune, style, width }
    }

    /// Create a blank cell (space, default style, width 1).
    pub fn blank() -> Self {
        Self {
            rune: ' ',
            style: Style::default(),
            width: 1,
        }
    }

    /// Returns true if this is a blank cell (space with default style).
    pub fn is_blank(&self) -> bool {
        self.rune == ' ' && self.style.is_plain() && self.width == 1
    }

    /// Returns true if this is a wide character (width 2).
    pub fn is_wide(&self) -> bool {
        self.width > 1
    }

    /// Returns true if this is a continuation cell (the second column of
    /// a wide character).
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Create a continuation cell reserving the column after a wide rune.
    pub fn continuation(style: Style) -> Self {
        Self {
            rune: ' ',
            style,
            width: 0,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, NamedColor};

    #[test]
    fn blank_cell() {
        let c = Cell::blank();
        assert!(c.is_blank());
        assert_eq!(c.width, 1);
    }

    #[test]
    fn ascii_cell() {
        let c = Cell::new('A', Style::default());
        assert_eq!(c.width, 1);
        assert!(!c.is_wide());
    }

    #[test]
    fn cjk_cell() {
        let c = Cell::new('世', Style::default());
        assert_eq!(c.width, 2);
        assert!(c.is_wide());
    }

    #[test]
    fn continuation_cell() {
        let c = Cell::continuation(Style::default());
        assert_eq!(c.width, 0);
        assert!(c.is_continuation());
    }

    #[test]
    fn styled_not_blank() {
        let c = Cell::new(' ', Style::new().fg(Color::Named(NamedColor::Red)));
        assert!(!c.is_blank());
    }

    #[test]
    fn space_default_is_blank() {
        let c = Cell::new(' ', Style::default());
        assert!(c.is_blank());
    }
}
