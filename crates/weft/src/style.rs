//! Layout style types: dimension values, flex properties, borders.

use weft_core::Edges;

/// A dimension value for widths, heights, and their min/max bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Value {
    /// Size from content (intrinsic size).
    #[default]
    Auto,
    /// Fixed number of cells.
    Fixed(i32),
    /// Percentage of the parent's size in the same axis.
    Percent(f32),
}

impl Value {
    /// Resolve to cells. `available` is the parent's size in this axis,
    /// or `None` when the parent is auto-sized (percent then resolves
    /// to 0). `intrinsic` is the content-driven size used for `Auto`.
    pub fn resolve(self, available: Option<i32>, intrinsic: i32) -> i32 {
        match self {
            Value::Auto => intrinsic,
            Value::Fixed(n) => n,
            Value::Percent(p) => match available {
                Some(a) => (p / 100.0 * a as f32).round() as i32,
                None => 0,
            },
        }
    }

    /// Returns true for `Auto`.
    pub const fn is_auto(self) -> bool {
        matches!(self, Value::Auto)
    }
}

/// Main-axis direction of a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Children stack top to bottom.
    #[default]
    Column,
    /// Children flow left to right.
    Row,
}

/// Main-axis distribution of children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Justify {
    /// Pack children at the start.
    #[default]
    Start,
    /// Pack children at the end.
    End,
    /// Center children.
    Center,
    /// First child at the start, last at the end, equal gaps between.
    SpaceBetween,
    /// Half-gap at each end, full gap between children.
    SpaceAround,
    /// Equal gap at the ends and between children.
    SpaceEvenly,
}

/// Cross-axis placement of children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    /// Place at the cross-axis start.
    #[default]
    Start,
    /// Place at the cross-axis end.
    End,
    /// Center on the cross axis.
    Center,
    /// Stretch to fill the container's cross axis.
    Stretch,
}

/// Horizontal text alignment within an element's content area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    /// Left-aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right-aligned.
    Right,
}

/// Border style of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderStyle {
    /// No border.
    #[default]
    None,
    /// Single-line box drawing.
    Single,
    /// Double-line box drawing.
    Double,
    /// Single-line with rounded corners.
    Rounded,
    /// Heavy-line box drawing.
    Thick,
}

/// The rune set for one border style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BorderRunes {
    /// Top-left corner.
    pub top_left: char,
    /// Top-right corner.
    pub top_right: char,
    /// Bottom-left corner.
    pub bottom_left: char,
    /// Bottom-right corner.
    pub bottom_right: char,
    /// Horizontal edge.
    pub horizontal: char,
    /// Vertical edge.
    pub vertical: char,
}

impl BorderStyle {
    /// The rune set for this style, or `None` for borderless.
    pub const fn runes(self) -> Option<BorderRunes> {
        match self {
            BorderStyle::None => None,
            BorderStyle::Single => Some(BorderRunes {
                top_left: '┌',
                top_right: '┐',
                bottom_left: '└',
                bottom_right: '┘',
                horizontal: '─',
                vertical: '│',
            }),
            BorderStyle::Double => Some(BorderRunes {
                top_left: '╔',
                top_right: '╗',
                bottom_left: '╚',
                bottom_right: '╝',
                horizontal: '═',
                vertical: '║',
            }),
            BorderStyle::Rounded => Some(BorderRunes {
                top_left: '╭',
                top_right: '╮',
                bottom_left: '╰',
                bottom_right: '╯',
                horizontal: '─',
                vertical: '│',
            }),
            BorderStyle::Thick => Some(BorderRunes {
                top_left: '┏',
                top_right: '┓',
                bottom_left: '┗',
                bottom_right: '┛',
                horizontal: '━',
                vertical: '┃',
            }),
        }
    }

    /// Border thickness in cells (0 or 1 per side).
    pub const fn thickness(self) -> i32 {
        match self {
            BorderStyle::None => 0,
            _ => 1,
        }
    }
}

/// Scroll behavior of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollMode {
    /// Not scrollable.
    #[default]
    None,
    /// Scrolls vertically.
    Vertical,
    /// Scrolls horizontally.
    Horizontal,
    /// Scrolls in both axes.
    Both,
}

impl ScrollMode {
    /// Returns true if this mode scrolls vertically.
    pub const fn vertical(self) -> bool {
        matches!(self, ScrollMode::Vertical | ScrollMode::Both)
    }

    /// Returns true if this mode scrolls horizontally.
    pub const fn horizontal(self) -> bool {
        matches!(self, ScrollMode::Horizontal | ScrollMode::Both)
    }

    /// Returns true for any scrollable mode.
    pub const fn any(self) -> bool {
        !matches!(self, ScrollMode::None)
    }
}

/// Per-element layout inputs for the flex engine.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutStyle {
    /// Preferred width.
    pub width: Value,
    /// Preferred height.
    pub height: Value,
    /// Minimum width bound.
    pub min_width: Value,
    /// Minimum height bound.
    pub min_height: Value,
    /// Maximum width bound.
    pub max_width: Value,
    /// Maximum height bound.
    pub max_height: Value,
    /// Main-axis direction for children.
    pub direction: Direction,
    /// Main-axis distribution of children.
    pub justify: Justify,
    /// Cross-axis placement of children.
    pub align: Align,
    /// Per-child override of the parent's `align`.
    pub align_self: Option<Align>,
    /// Share of positive free space this element absorbs.
    pub flex_grow: f32,
    /// Share of negative free space this element absorbs.
    pub flex_shrink: f32,
    /// Inner spacing between border and content.
    pub padding: Edges,
    /// Outer spacing around the element.
    pub margin: Edges,
    /// Spacing between adjacent children.
    pub gap: i32,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            width: Value::Auto,
            height: Value::Auto,
            min_width: Value::Auto,
            min_height: Value::Auto,
            max_width: Value::Auto,
            max_height: Value::Auto,
            direction: Direction::default(),
            justify: Justify::default(),
            align: Align::default(),
            align_self: None,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            padding: Edges::ZERO,
            margin: Edges::ZERO,
            gap: 0,
        }
    }
}

impl LayoutStyle {
    /// Main-axis size value for the given direction.
    pub fn main_value(&self, dir: Direction) -> Value {
        match dir {
            Direction::Row => self.width,
            Direction::Column => self.height,
        }
    }

    /// Cross-axis size value for the given direction.
    pub fn cross_value(&self, dir: Direction) -> Value {
        match dir {
            Direction::Row => self.height,
            Direction::Column => self.width,
        }
    }
}
