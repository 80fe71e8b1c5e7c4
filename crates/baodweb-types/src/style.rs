//! Text styles and terminal color modes.
//!
//! Layout attaches a [`Style`] to every run of text it emits. Colors are
//! kept at full precision ([`Color::Rgb`]) or as one of the sixteen
//! standard terminal colors, and are only reduced to what the terminal
//! can show when the painter serializes them through
//! [`ColorMode::quantize`].

// -----------------------------------------------------------------------
// Colors
// -----------------------------------------------------------------------

/// The sixteen standard ANSI terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl NamedColor {
    /// All sixteen colors in palette order.
    pub const ALL: [NamedColor; 16] = [
        NamedColor::Black,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Blue,
        NamedColor::Magenta,
        NamedColor::Cyan,
        NamedColor::White,
        NamedColor::BrightBlack,
        NamedColor::BrightRed,
        NamedColor::BrightGreen,
        NamedColor::BrightYellow,
        NamedColor::BrightBlue,
        NamedColor::BrightMagenta,
        NamedColor::BrightCyan,
        NamedColor::BrightWhite,
    ];

    /// Palette index (0..16).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Reference RGB value (xterm defaults), used for nearest-color search.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            NamedColor::Black => (0, 0, 0),
            NamedColor::Red => (205, 0, 0),
            NamedColor::Green => (0, 205, 0),
            NamedColor::Yellow => (205, 205, 0),
            NamedColor::Blue => (0, 0, 238),
            NamedColor::Magenta => (205, 0, 205),
            NamedColor::Cyan => (0, 205, 205),
            NamedColor::White => (229, 229, 229),
            NamedColor::BrightBlack => (127, 127, 127),
            NamedColor::BrightRed => (255, 0, 0),
            NamedColor::BrightGreen => (0, 255, 0),
            NamedColor::BrightYellow => (255, 255, 0),
            NamedColor::BrightBlue => (92, 92, 255),
            NamedColor::BrightMagenta => (255, 0, 255),
            NamedColor::BrightCyan => (0, 255, 255),
            NamedColor::BrightWhite => (255, 255, 255),
        }
    }
}

/// A color as produced by layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the terminal's own palette colors.
    Named(NamedColor),
    /// A 24-bit color (image pixels).
    Rgb(u8, u8, u8),
}

// -----------------------------------------------------------------------
// Style
// -----------------------------------------------------------------------

/// Attributes of one run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Highlighted (`<mark>`) text.
    pub mark: bool,
    pub reverse: bool,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Style {
    pub const PLAIN: Style = Style {
        bold: false,
        italic: false,
        underline: false,
        strike: false,
        mark: false,
        reverse: false,
        fg: None,
        bg: None,
    };

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn strike(mut self) -> Self {
        self.strike = true;
        self
    }

    pub fn mark(mut self) -> Self {
        self.mark = true;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Layer `self` over `base`: attributes are OR-ed, and colors set on
    /// `self` win over those on `base`.
    pub fn over(self, base: Style) -> Style {
        Style {
            bold: self.bold || base.bold,
            italic: self.italic || base.italic,
            underline: self.underline || base.underline,
            strike: self.strike || base.strike,
            mark: self.mark || base.mark,
            reverse: self.reverse || base.reverse,
            fg: self.fg.or(base.fg),
            bg: self.bg.or(base.bg),
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Style::PLAIN
    }
}

// -----------------------------------------------------------------------
// Color modes and quantization
// -----------------------------------------------------------------------

/// What the terminal can display, from least to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorMode {
    NoColor,
    Ansi16,
    Ansi256,
    TrueColor,
}

/// A color reduced to something a given [`ColorMode`] can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizedColor {
    Rgb(u8, u8, u8),
    Indexed(u8),
    Named(NamedColor),
}

impl ColorMode {
    /// Pick a mode from the usual environment hints.
    ///
    /// `NO_COLOR` wins over everything; `COLORTERM=truecolor|24bit` selects
    /// 24-bit color; a `TERM` mentioning `256color` selects the 256-color
    /// palette; anything else gets the 16 standard colors.
    pub fn detect(colorterm: Option<&str>, term: Option<&str>, no_color: bool) -> ColorMode {
        if no_color {
            return ColorMode::NoColor;
        }
        if let Some(ct) = colorterm {
            let ct = ct.to_ascii_lowercase();
            if ct == "truecolor" || ct == "24bit" {
                return ColorMode::TrueColor;
            }
        }
        match term {
            Some("dumb") => ColorMode::NoColor,
            Some(t) if t.contains("256color") => ColorMode::Ansi256,
            _ => ColorMode::Ansi16,
        }
    }

    /// The next less capable mode.
    pub fn degrade(self) -> ColorMode {
        match self {
            ColorMode::TrueColor => ColorMode::Ansi256,
            ColorMode::Ansi256 => ColorMode::Ansi16,
            ColorMode::Ansi16 | ColorMode::NoColor => ColorMode::NoColor,
        }
    }

    /// Reduce `color` to what this mode can emit. `None` means "emit no
    /// color at all".
    pub fn quantize(self, color: Color) -> Option<QuantizedColor> {
        match (self, color) {
            (ColorMode::NoColor, _) => None,
            (_, Color::Named(n)) => Some(QuantizedColor::Named(n)),
            (ColorMode::TrueColor, Color::Rgb(r, g, b)) => Some(QuantizedColor::Rgb(r, g, b)),
            (ColorMode::Ansi256, Color::Rgb(r, g, b)) => {
                Some(QuantizedColor::Indexed(rgb_to_256(r, g, b)))
            },
            (ColorMode::Ansi16, Color::Rgb(r, g, b)) => {
                Some(QuantizedColor::Named(rgb_to_16(r, g, b)))
            },
        }
    }
}

/// Map an RGB triple onto the xterm 256-color palette.
///
/// Greys go to the 24-step grey ramp (232..=255) or the cube's black and
/// white corners; everything else goes to the 6x6x6 color cube.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((r as u16 * 23) / 255) as u8;
    }
    let level = |c: u8| (c as u16 * 5 / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Nearest of the sixteen standard colors by squared RGB distance.
pub fn rgb_to_16(r: u8, g: u8, b: u8) -> NamedColor {
    let dist = |n: &NamedColor| {
        let (nr, ng, nb) = n.rgb();
        let dr = nr as i32 - r as i32;
        let dg = ng as i32 - g as i32;
        let db = nb as i32 - b as i32;
        dr * dr + dg * dg + db * db
    };
    NamedColor::ALL
        .iter()
        .copied()
        .min_by_key(dist)
        .unwrap_or(NamedColor::White)
}
