//! Terminal input: event types, byte-stream parsing, reader thread.

mod event;
mod parser;
mod reader;

pub use event::{Event, Key, KeyEvent, Mods, MouseAction, MouseButton, MouseEvent};
pub use parser::Parser;
pub use reader::InputReader;
