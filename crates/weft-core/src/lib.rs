//! weft-core: terminal substrate for the weft TUI framework.
//!
//! This crate provides the low-level pieces with no knowledge of the
//! element tree: geometry, colors and styles, the double-buffered cell
//! grid, the terminal abstraction with ANSI escape emission, and the
//! byte-level input parser and reader.

pub mod buffer;
pub mod cell;
pub mod color;
pub mod error;
pub mod geometry;
pub mod input;
pub mod style;
pub mod terminal;

pub use buffer::{Buffer, CellChange};
pub use cell::Cell;
pub use color::{Color, Gradient, NamedColor};
pub use error::{CoreError, Result};
pub use geometry::{Edges, Rect};
pub use input::{Event, InputReader, Key, KeyEvent, Mods, MouseAction, MouseButton, MouseEvent, Parser};
pub use style::Style;
pub use terminal::{AnsiTerminal, Capabilities, ColorDepth, Terminal, TestTerminal};
