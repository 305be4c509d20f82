//! Terminal capability detection.

/// Level of color support available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorDepth {
    /// 16 ANSI colors.
    Basic16,
    /// 256 color palette.
    Extended256,
    /// 24-bit true color.
    TrueColor,
}

/// Capabilities detected for the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Color support level.
    pub color_depth: ColorDepth,
    /// Whether the terminal supports Unicode output.
    pub unicode: bool,
    /// Whether 24-bit color escape sequences are understood.
    pub truecolor: bool,
    /// Whether the alternate screen is available.
    pub alt_screen: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            color_depth: ColorDepth::TrueColor,
            unicode: true,
            truecolor: true,
            alt_screen: true,
        }
    }
}

/// Detect terminal capabilities from the environment.
pub fn detect() -> Capabilities {
    let color_depth = detect_color_depth();
    Capabilities {
        color_depth,
        unicode: detect_unicode(),
        truecolor: color_depth == ColorDepth::TrueColor,
        alt_screen: true,
    }
}

/// Detect color depth from `COLORTERM` / `TERM`.
fn detect_color_depth() -> ColorDepth {
    if let Ok(ct) = std::env::var("COLORTERM")
        && (ct == "truecolor" || ct == "24bit")
    {
        return ColorDepth::TrueColor;
    }
    if let Ok(term) = std::env::var("TERM")
        && term.contains("256color")
    {
        return ColorDepth::Extended256;
    }
    ColorDepth::Basic16
}

fn detect_unicode() -> bool {
    for var in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(val) = std::env::var(var)
            && !val.is_empty()
        {
            return val.to_ascii_uppercase().contains("UTF-8")
                || val.to_ascii_uppercase().contains("UTF8");
        }
    }
    true
}
