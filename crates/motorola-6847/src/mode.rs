//! Mode decode and per-mode geometry.

/// What the VDG draws for its 4-bit mode value.
///
/// Bit 0 clear selects the alphanumeric/semigraphics generator. Bit 0 set
/// selects packed graphics; `class` is `(mode + 1) / 2`, 1–8, and odd
/// classes are the four-colour modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdgMode {
    AlphaSemigraphics,
    PackedGraphics { class: u8 },
}

/// Graphics widths in VDG pixels, indexed by class.
const WIDTHS: [usize; 9] = [32, 64, 128, 128, 128, 128, 128, 128, 256];

/// Physical (doubled) scanlines per graphics row, indexed by class − 1.
const GRAPHICS_LINES_PER_ROW: [u16; 8] = [6, 6, 6, 4, 4, 2, 2, 2];

/// Physical scanlines per text row: 12 glyph rows, doubled.
const TEXT_LINES_PER_ROW: u16 = 24;

impl VdgMode {
    #[must_use]
    pub fn from_bits(mode: u8) -> Self {
        let mode = mode & 0x0F;
        if mode & 1 == 0 {
            Self::AlphaSemigraphics
        } else {
            Self::PackedGraphics {
                class: mode.div_ceil(2),
            }
        }
    }

    /// Four-colour graphics (2 bits per pixel).
    #[must_use]
    pub fn is_colour(self) -> bool {
        matches!(self, Self::PackedGraphics { class } if class % 2 == 1)
    }

    /// Visible VDG pixels per row.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Self::AlphaSemigraphics => WIDTHS[0],
            Self::PackedGraphics { class } => WIDTHS[usize::from(class.min(8))],
        }
    }

    /// Bytes of video memory consumed per row.
    #[must_use]
    pub fn bytes_per_row(self) -> u16 {
        match self {
            Self::AlphaSemigraphics => 32,
            _ if self.is_colour() => (self.width() / 4) as u16,
            Self::PackedGraphics { .. } => (self.width() / 8) as u16,
        }
    }

    /// Physical scanlines each row of video memory is repeated for.
    #[must_use]
    pub fn lines_per_row(self) -> u16 {
        match self {
            Self::AlphaSemigraphics => TEXT_LINES_PER_ROW,
            Self::PackedGraphics { class } => {
                GRAPHICS_LINES_PER_ROW[usize::from(class.clamp(1, 8) - 1)]
            }
        }
    }
}
