//! weft: a declarative, component-based terminal UI framework.
//!
//! Build a tree of styled elements, hand it (or a [`Component`] that
//! produces it) to an [`App`], and the runtime does the rest: flexbox
//! layout, double-buffered diff rendering, input decoding, focus
//! routing, reactive state, and timers/tickers/channel watchers — all
//! driven by a single-threaded cooperative event loop. Apps run full
//! screen or as a fixed-height inline widget at the bottom of a
//! scrolling terminal.
//!
//! ```no_run
//! use weft::{App, el, pct, text};
//!
//! let root = el()
//!     .width(pct(100.0))
//!     .height(pct(100.0))
//!     .child(text("hello weft"));
//! App::new(root).run().ok();
//! ```

pub mod app;
pub mod component;
pub mod element;
pub mod error;
pub mod focus;
pub mod layout;
pub mod render;
pub mod state;
pub mod style;
pub mod watcher;

pub use app::{App, AppHandle};
pub use component::{Cleanup, Component, KeyBinding, KeyMap, KeyPattern};
pub use element::{Element, LayoutResult, WeakElement, el, hr, pct, text};
pub use error::{Error, Result};
pub use focus::FocusManager;
pub use layout::calculate;
pub use render::render_tree;
pub use state::{State, batch};
pub use style::{
    Align, BorderRunes, BorderStyle, Direction, Justify, LayoutStyle, ScrollMode, TextAlign, Value,
};
pub use watcher::{ChannelWatcher, Job, Ticker, Timer, Watcher, WatcherCtx};

// Re-export the substrate types users touch directly.
pub use weft_core::{
    Buffer, Cell, CellChange, Color, Edges, Event, Gradient, Key, KeyEvent, Mods, MouseAction,
    MouseButton, MouseEvent, NamedColor, Rect, Style, Terminal, TestTerminal,
};
