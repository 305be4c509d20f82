//! ANSI escape sequence emission.
//!
//! Builds terminal output from cell changes with minimal escape traffic:
//! contiguous same-row cells share one cursor move, and SGR parameters
//! are only emitted for the delta against the last emitted style.

use std::fmt::Write;

use crate::buffer::CellChange;
use crate::color::{Color, NamedColor, indexed_to_rgb, named_from_index};
use crate::style::Style;

use super::caps::ColorDepth;

/// Append a cursor-position sequence (0-indexed input, 1-indexed wire).
pub fn cursor_move(out: &mut String, x: u16, y: u16) {
    let _ = write!(out, "\x1b[{};{}H", y + 1, x + 1);
}

/// Clear the whole screen.
pub const CLEAR: &str = "\x1b[2J";
/// Clear from the cursor to the end of the screen.
pub const CLEAR_TO_END: &str = "\x1b[0J";
/// Enter the alternate screen.
pub const ALT_SCREEN_ENTER: &str = "\x1b[?1049h";
/// Leave the alternate screen.
pub const ALT_SCREEN_EXIT: &str = "\x1b[?1049l";
/// Hide the cursor.
pub const CURSOR_HIDE: &str = "\x1b[?25l";
/// Show the cursor.
pub const CURSOR_SHOW: &str = "\x1b[?25h";
/// Enable SGR mouse reporting (press, drag, motion, SGR encoding).
pub const MOUSE_ENABLE: &str = "\x1b[?1000h\x1b[?1002h\x1b[?1003h\x1b[?1006h";
/// Disable SGR mouse reporting.
pub const MOUSE_DISABLE: &str = "\x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?1000l";
/// Reset the scroll region to the full screen.
pub const SCROLL_REGION_RESET: &str = "\x1b[r";
/// Reverse index: move up one line, scrolling the region down at the top.
pub const REVERSE_INDEX: &str = "\x1bM";
/// Reset all SGR attributes.
pub const SGR_RESET: &str = "\x1b[0m";

/// Append a scroll-region sequence restricting scrolling to rows
/// `top..=bottom` (0-indexed input, 1-indexed wire).
pub fn scroll_region(out: &mut String, top: u16, bottom: u16) {
    let _ = write!(out, "\x1b[{};{}r", top + 1, bottom + 1);
}

/// Tracks the last emitted style so only deltas hit the wire.
#[derive(Debug)]
pub struct StyleTracker {
    depth: ColorDepth,
    last: Style,
    active: bool,
}

impl StyleTracker {
    /// Create a tracker for the given color depth.
    pub fn new(depth: ColorDepth) -> Self {
        Self {
            depth,
            last: Style::default(),
            active: false,
        }
    }

    /// Emit the minimal SGR transition from the last emitted style to
    /// `next`.
    pub fn transition(&mut self, out: &mut String, next: &Style) {
        if !self.active || needs_reset(&self.last, next) {
            if self.active && !self.last.is_plain() {
                out.push_str(SGR_RESET);
            }
            self.write_full(out, next);
        } else {
            self.write_delta(out, next);
        }
        self.last = *next;
        self.active = true;
    }

    /// Emit a final SGR reset if anything is still active.
    pub fn finish(&mut self, out: &mut String) {
        if self.active && !self.last.is_plain() {
            out.push_str(SGR_RESET);
        }
        self.last = Style::default();
        self.active = false;
    }

    fn write_full(&self, out: &mut String, style: &Style) {
        if !style.fg.is_default() {
            write_fg(out, self.downgrade(style.fg));
        }
        if !style.bg.is_default() {
            write_bg(out, self.downgrade(style.bg));
        }
        if style.bold {
            out.push_str("\x1b[1m");
        }
        if style.dim {
            out.push_str("\x1b[2m");
        }
        if style.italic {
            out.push_str("\x1b[3m");
        }
        if style.underline {
            out.push_str("\x1b[4m");
        }
        if style.reverse {
            out.push_str("\x1b[7m");
        }
    }

    fn write_delta(&self, out: &mut String, next: &Style) {
        if self.last.fg != next.fg {
            if next.fg.is_default() {
                out.push_str("\x1b[39m");
            } else {
                write_fg(out, self.downgrade(next.fg));
            }
        }
        if self.last.bg != next.bg {
            if next.bg.is_default() {
                out.push_str("\x1b[49m");
            } else {
                write_bg(out, self.downgrade(next.bg));
            }
        }
        if !self.last.bold && next.bold {
            out.push_str("\x1b[1m");
        }
        if !self.last.dim && next.dim {
            out.push_str("\x1b[2m");
        }
        if !self.last.italic && next.italic {
            out.push_str("\x1b[3m");
        }
        if !self.last.underline && next.underline {
            out.push_str("\x1b[4m");
        }
        if !self.last.reverse && next.reverse {
            out.push_str("\x1b[7m");
        }
    }

    /// Downgrade a color to the terminal's depth at emission time.
    fn downgrade(&self, color: Color) -> Color {
        match self.depth {
            ColorDepth::TrueColor => color,
            ColorDepth::Extended256 => match color {
                Color::Rgb { r, g, b } => Color::Indexed(rgb_to_256(r, g, b)),
                other => other,
            },
            ColorDepth::Basic16 => match color {
                Color::Rgb { r, g, b } => Color::Named(rgb_to_named(r, g, b)),
                Color::Indexed(i) => Color::Named(index_to_named(i)),
                other => other,
            },
        }
    }
}

/// A full reset is needed when any attribute is being turned OFF; SGR has
/// no per-attribute off codes in the subset we emit.
fn needs_reset(prev: &Style, next: &Style) -> bool {
    (prev.bold && !next.bold)
        || (prev.dim && !next.dim)
        || (prev.italic && !next.italic)
        || (prev.underline && !next.underline)
        || (prev.reverse && !next.reverse)
}

fn write_fg(out: &mut String, color: Color) {
    match color {
        Color::Rgb { r, g, b } => {
            let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
        }
        Color::Indexed(i) => {
            let _ = write!(out, "\x1b[38;5;{i}m");
        }
        Color::Named(n) => {
            let _ = write!(out, "\x1b[{}m", named_fg_code(n));
        }
        Color::Default => out.push_str("\x1b[39m"),
    }
}

fn write_bg(out: &mut String, color: Color) {
    match color {
        Color::Rgb { r, g, b } => {
            let _ = write!(out, "\x1b[48;2;{r};{g};{b}m");
        }
        Color::Indexed(i) => {
            let _ = write!(out, "\x1b[48;5;{i}m");
        }
        Color::Named(n) => {
            let _ = write!(out, "\x1b[{}m", named_bg_code(n));
        }
        Color::Default => out.push_str("\x1b[49m"),
    }
}

fn named_fg_code(color: NamedColor) -> u8 {
    match color {
        NamedColor::Black => 30,
        NamedColor::Red => 31,
        NamedColor::Green => 32,
        NamedColor::Yellow => 33,
        NamedColor::Blue => 34,
        NamedColor::Magenta => 35,
        NamedColor::Cyan => 36,
        NamedColor::White => 37,
        NamedColor::BrightBlack => 90,
        NamedColor::BrightRed => 91,
        NamedColor::BrightGreen => 92,
        NamedColor::BrightYellow => 93,
        NamedColor::BrightBlue => 94,
        NamedColor::BrightMagenta => 95,
        NamedColor::BrightCyan => 96,
        NamedColor::BrightWhite => 97,
    }
}

fn named_bg_code(color: NamedColor) -> u8 {
    named_fg_code(color) + 10
}

/// Render cell changes into a single escape-sequence string.
///
/// Contiguous same-row cells share one cursor move; continuation cells
/// (width 0) produce no output but are accounted for in cursor tracking.
pub fn render_changes(changes: &[CellChange], depth: ColorDepth) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(changes.len() * 12);
    let mut tracker = StyleTracker::new(depth);
    let mut cursor: Option<(u16, u16)> = None;

    for change in changes {
        if change.cell.is_continuation() {
            continue;
        }
        if cursor != Some((change.x, change.y)) {
            cursor_move(&mut out, change.x, change.y);
        }
        tracker.transition(&mut out, &change.cell.style);
        out.push(change.cell.rune);
        cursor = Some((change.x + u16::from(change.cell.width), change.y));
    }

    tracker.finish(&mut out);
    out
}

/// Convert RGB to the nearest 256-color palette index.
///
/// The palette is 16 standard colors, a 6x6x6 cube (16-231), and a
/// grayscale ramp (232-255).
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return (((u16::from(r) - 8) * 24 / 240) as u8) + 232;
    }

    let ri = cube_index(r);
    let gi = cube_index(g);
    let bi = cube_index(b);
    16 + 36 * ri + 6 * gi + bi
}

fn cube_index(val: u8) -> u8 {
    if val < 48 {
        0
    } else if val < 115 {
        1
    } else {
        ((u16::from(val) - 35) / 40) as u8
    }
}

/// Convert RGB to the nearest named 16-color ANSI color by distance.
pub fn rgb_to_named(r: u8, g: u8, b: u8) -> NamedColor {
    let mut best = NamedColor::White;
    let mut best_dist = u32::MAX;
    for idx in 0..16 {
        let name = named_from_index(idx);
        let (cr, cg, cb) = name.rgb();
        let dr = i32::from(r) - i32::from(cr);
        let dg = i32::from(g) - i32::from(cg);
        let db = i32::from(b) - i32::from(cb);
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = name;
        }
    }
    best
}

/// Convert a 256-color index to the nearest named 16-color.
fn index_to_named(idx: u8) -> NamedColor {
    if idx < 16 {
        named_from_index(idx)
    } else {
        let (r, g, b) = indexed_to_rgb(idx);
        rgb_to_named(r, g, b)
    }
}
