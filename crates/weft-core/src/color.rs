//! Color types for terminal rendering.

/// A terminal color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    /// The terminal's default color (unset).
    #[default]
    Default,
    /// Named ANSI color.
    Named(NamedColor),
    /// 256-color palette index.
    Indexed(u8),
    /// True color RGB.
    Rgb {
        /// Red component.
        r: u8,
        /// Green component.
        g: u8,
        /// Blue component.
        b: u8,
    },
}

/// The 16 standard ANSI colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamedColor {
    /// Black (0).
    Black,
    /// Red (1).
    Red,
    /// Green (2).
    Green,
    /// Yellow (3).
    Yellow,
    /// Blue (4).
    Blue,
    /// Magenta (5).
    Magenta,
    /// Cyan (6).
    Cyan,
    /// White (7).
    White,
    /// Bright black / dark gray (8).
    BrightBlack,
    /// Bright red (9).
    BrightRed,
    /// Bright green (10).
    BrightGreen,
    /// Bright yellow (11).
    BrightYellow,
    /// Bright blue (12).
    BrightBlue,
    /// Bright magenta (13).
    BrightMagenta,
    /// Bright cyan (14).
    BrightCyan,
    /// Bright white (15).
    BrightWhite,
}

impl Color {
    /// Returns true if this is the terminal default (unset) color.
    pub const fn is_default(self) -> bool {
        matches!(self, Color::Default)
    }

    /// Returns true if the color is perceptually light.
    ///
    /// Used for auto-contrast: default text on a light background is
    /// switched to black. `Default` is never light. The test is a
    /// standard luminance weighting; override by setting an explicit
    /// foreground.
    pub fn is_light(self) -> bool {
        match self.rgb_components() {
            Some((r, g, b)) => {
                let lum = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
                lum >= 128.0
            }
            None => false,
        }
    }

    /// Resolve this color to RGB components where possible.
    /// `Default` has no concrete value.
    pub fn rgb_components(self) -> Option<(u8, u8, u8)> {
        match self {
            Color::Default => None,
            Color::Rgb { r, g, b } => Some((r, g, b)),
            Color::Named(n) => Some(n.rgb()),
            Color::Indexed(i) => Some(indexed_to_rgb(i)),
        }
    }

    /// Parse a hex color string like `"#rrggbb"` or `"#rgb"`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::Rgb { r, g, b })
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self::Rgb {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            _ => None,
        }
    }
}

impl NamedColor {
    /// Nominal RGB value of this ANSI color (xterm defaults).
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            NamedColor::Black => (0, 0, 0),
            NamedColor::Red => (128, 0, 0),
            NamedColor::Green => (0, 128, 0),
            NamedColor::Yellow => (128, 128, 0),
            NamedColor::Blue => (0, 0, 128),
            NamedColor::Magenta => (128, 0, 128),
            NamedColor::Cyan => (0, 128, 128),
            NamedColor::White => (192, 192, 192),
            NamedColor::BrightBlack => (128, 128, 128),
            NamedColor::BrightRed => (255, 0, 0),
            NamedColor::BrightGreen => (0, 255, 0),
            NamedColor::BrightYellow => (255, 255, 0),
            NamedColor::BrightBlue => (0, 0, 255),
            NamedColor::BrightMagenta => (255, 0, 255),
            NamedColor::BrightCyan => (0, 255, 255),
            NamedColor::BrightWhite => (255, 255, 255),
        }
    }
}

/// Expand a 256-color palette index to its nominal RGB value.
pub fn indexed_to_rgb(idx: u8) -> (u8, u8, u8) {
    match idx {
        0..=7 => named_from_index(idx).rgb(),
        8..=15 => named_from_index(idx).rgb(),
        16..=231 => {
            // 6x6x6 color cube
            let idx = idx - 16;
            let b_idx = idx % 6;
            let g_idx = (idx / 6) % 6;
            let r_idx = idx / 36;
            let level = |i: u8| if i == 0 { 0 } else { 55 + 40 * i };
            (level(r_idx), level(g_idx), level(b_idx))
        }
        _ => {
            // Grayscale ramp: 232-255 → 8, 18, 28, ..., 238
            let gray = 8 + 10 * (idx - 232);
            (gray, gray, gray)
        }
    }
}

/// Map a palette index 0-15 to its named color.
pub fn named_from_index(idx: u8) -> NamedColor {
    match idx {
        0 => NamedColor::Black,
        1 => NamedColor::Red,
        2 => NamedColor::Green,
        3 => NamedColor::Yellow,
        4 => NamedColor::Blue,
        5 => NamedColor::Magenta,
        6 => NamedColor::Cyan,
        7 => NamedColor::White,
        8 => NamedColor::BrightBlack,
        9 => NamedColor::BrightRed,
        10 => NamedColor::BrightGreen,
        11 => NamedColor::BrightYellow,
        12 => NamedColor::BrightBlue,
        13 => NamedColor::BrightMagenta,
        14 => NamedColor::BrightCyan,
        _ => NamedColor::BrightWhite,
    }
}

/// A linear gradient over evenly spaced color stops.
///
/// `at(t)` maps `t ∈ [0, 1]` to an interpolated color. Stops that are
/// named or indexed are resolved to their nominal RGB values before
/// interpolation.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<Color>,
}

impl Gradient {
    /// Create a gradient from ordered stops. Needs at least one stop.
    pub fn new(stops: Vec<Color>) -> Self {
        Self { stops }
    }

    /// Two-stop gradient.
    pub fn linear(from: Color, to: Color) -> Self {
        Self {
            stops: vec![from, to],
        }
    }

    /// Sample the gradient at `t ∈ [0, 1]` (clamped).
    pub fn at(&self, t: f32) -> Color {
        match self.stops.len() {
            0 => Color::Default,
            1 => self.stops[0],
            n => {
                let t = t.clamp(0.0, 1.0);
                let scaled = t * (n - 1) as f32;
                let lo = (scaled.floor() as usize).min(n - 2);
                let frac = scaled - lo as f32;
                lerp(self.stops[lo], self.stops[lo + 1], frac)
            }
        }
    }
}

fn lerp(a: Color, b: Color, t: f32) -> Color {
    let (ar, ag, ab) = a.rgb_components().unwrap_or((0, 0, 0));
    let (br, bg, bb) = b.rgb_components().unwrap_or((0, 0, 0));
    let mix = |x: u8, y: u8| -> u8 {
        (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8
    };
    Color::Rgb {
        r: mix(ar, br),
        g: mix(ag, bg),
        b: mix(ab, bb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_default() {
        assert!(Color::Default.is_default());
        assert!(!Color::Named(NamedColor::Red).is_default());
    }

    #[test]
    fn white_is_light_black_is_not() {
        assert!(Color::Named(NamedColor::BrightWhite).is_light());
        assert!(Color::Named(NamedColor::White).is_light());
        assert!(!Color::Named(NamedColor::Black).is_light());
        assert!(!Color::Named(NamedColor::Blue).is_light());
    }

    #[test]
    fn default_is_never_light() {
        assert!(!Color::Default.is_light());
    }

    #[test]
    fn rgb_light_threshold() {
        assert!(Color::Rgb {
            r: 255,
            g: 255,
            b: 0
        }
        .is_light());
        assert!(!Color::Rgb { r: 40, g: 40, b: 40 }.is_light());
    }

    #[test]
    fn hex_6_digit() {
        let c = Color::from_hex("#1e1e2e");
        assert_eq!(
            c,
            Some(Color::Rgb {
                r: 30,
                g: 30,
                b: 46
            })
        );
    }

    #[test]
    fn hex_3_digit() {
        let c = Color::from_hex("#f0a");
        assert_eq!(
            c,
            Some(Color::Rgb {
                r: 255,
                g: 0,
                b: 170
            })
        );
    }

    #[test]
    fn hex_invalid() {
        assert!(Color::from_hex("#gg0000").is_none());
        assert!(Color::from_hex("#1234").is_none());
        assert!(Color::from_hex("").is_none());
    }

    #[test]
    fn indexed_cube_expansion() {
        // 196 = pure red corner of the cube
        assert_eq!(indexed_to_rgb(196), (255, 0, 0));
        // 16 = cube black
        assert_eq!(indexed_to_rgb(16), (0, 0, 0));
    }

    #[test]
    fn indexed_grayscale_expansion() {
        assert_eq!(indexed_to_rgb(232), (8, 8, 8));
        assert_eq!(indexed_to_rgb(255), (238, 238, 238));
    }

    #[test]
    fn gradient_endpoints() {
        let g = Gradient::linear(Color::Rgb { r: 0, g: 0, b: 0 }, Color::Rgb {
            r: 255,
            g: 255,
            b: 255,
        });
        assert_eq!(g.at(0.0), Color::Rgb { r: 0, g: 0, b: 0 });
        assert_eq!(
            g.at(1.0),
            Color::Rgb {
                r: 255,
                g: 255,
                b: 255
            }
        );
    }

    #[test]
    fn gradient_midpoint() {
        let g = Gradient::linear(Color::Rgb { r: 0, g: 0, b: 0 }, Color::Rgb {
            r: 100,
            g: 200,
            b: 50,
        });
        assert_eq!(
            g.at(0.5),
            Color::Rgb {
                r: 50,
                g: 100,
                b: 25
            }
        );
    }

    #[test]
    fn gradient_clamps_t() {
        let g = Gradient::linear(Color::Rgb { r: 10, g: 0, b: 0 }, Color::Rgb {
            r: 20,
            g: 0,
            b: 0,
        });
        assert_eq!(g.at(-1.0), g.at(0.0));
        assert_eq!(g.at(2.0), g.at(1.0));
    }

    #[test]
    fn gradient_multi_stop() {
        let g = Gradient::new(vec![
            Color::Rgb { r: 0, g: 0, b: 0 },
            Color::Rgb { r: 100, g: 0, b: 0 },
            Color::Rgb { r: 200, g: 0, b: 0 },
        ]);
        assert_eq!(g.at(0.5), Color::Rgb { r: 100, g: 0, b: 0 });
        assert_eq!(g.at(0.25), Color::Rgb { r: 50, g: 0, b: 0 });
    }

    #[test]
    fn gradient_single_stop() {
        let g = Gradient::new(vec![Color::Named(NamedColor::Red)]);
        assert_eq!(g.at(0.7), Color::Named(NamedColor::Red));
    }
}
