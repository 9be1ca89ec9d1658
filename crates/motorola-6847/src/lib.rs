//! Motorola MC6847 Video Display Generator.
//!
//! Renders one DVI scanline at a time from shadow video memory. The VDG's
//! 256×192 picture is doubled in both directions and centred in the
//! display's active area, with the remainder filled by border colour.
//!
//! # Modes
//!
//! | Mode bits | Mode | Size | Colours | Bytes/row |
//! |-----------|------|------|---------|-----------|
//! | xxx0 | Alphanumeric / semigraphics | 32×16 chars | 2 + 8 | 32 |
//! | 0001 | CG1 | 64×64 | 4 | 16 |
//! | 0011 | RG1 | 128×64 | 2 | 16 |
//! | 0101 | CG2 | 128×64 | 4 | 32 |
//! | 0111 | RG2 | 128×96 | 2 | 16 |
//! | 1001 | CG3 | 128×96 | 4 | 32 |
//! | 1011 | RG3 | 128×192 | 2 | 16 |
//! | 1101 | CG6 | 128×192 | 4 | 32 |
//! | 1111 | RG6 | 256×192 | 2 | 32 |
//!
//! # Character byte (alphanumeric mode)
//!
//! Bit 7 inverts a text character. Bit 6 (A/S) selects semigraphics. With
//! INT/EXT high a semigraphic byte is SG6: colour in bits 7–6, a 2×3 grid in
//! bits 5–0. Otherwise it is SG4: colour in bits 6–4, a 2×2 grid in bits
//! 3–0. On the Atom INT/EXT is wired to A/S, so every semigraphic is SG6.
//!
//! # Row addressing
//!
//! The VDG has no row counter of its own: it keeps a running row base into
//! video memory and a countdown of scanlines left in the current row. The
//! countdown and the stride both come from the mode in force when the row
//! ends, and a mode change mid-frame forces an immediate row advance.

mod mode;
mod palette;

use emu_core::pixel::BLACK;
use emu_core::{Bus, Font, Observable, Pixel, Value, pixel};

pub use mode::VdgMode;
pub use palette::{Artifact, VDG_PALETTE};

/// Horizontal and vertical doubling of VDG pixels.
pub const XSCALE: usize = 2;
pub const YSCALE: usize = 2;

/// Doubled size of the VDG picture.
pub const ACTIVE_WIDTH: usize = 256 * XSCALE;
pub const ACTIVE_HEIGHT: usize = 192 * YSCALE;

const TEXT_COLUMNS: u16 = 32;
const GLYPH_HEIGHT: usize = 12;
/// Output pixels per character cell.
const CELL_WIDTH: usize = 8 * XSCALE;

/// State of the INT/EXT input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntExt {
    /// Wired to the A/S bit of each character (Atom): semigraphics are SG6.
    #[default]
    FollowsAs,
    /// Driven by a control line: high selects SG6, low SG4.
    Level(bool),
}

/// Control inputs sampled for each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VdgControl {
    /// 4-bit mode value.
    pub mode: u8,
    /// Colour set select.
    pub css: bool,
    pub int_ext: IntExt,
    /// Start of video memory.
    pub base: u16,
}

/// Extended lowercase glyph bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lowercase {
    /// First character code drawn from the second bank.
    pub first: u8,
    /// Last character code drawn from the second bank.
    pub last: u8,
    /// Draw lowercase glyphs paper-on-ink.
    pub inverted: bool,
}

/// Host-selectable rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdgSettings {
    pub ink: Pixel,
    /// Text colour when CSS is set.
    pub ink_alt: Pixel,
    pub paper: Pixel,
    pub artifact: Artifact,
    pub lowercase: Option<Lowercase>,
}

impl Default for VdgSettings {
    fn default() -> Self {
        Self {
            ink: pixel::GREEN,
            ink_alt: pixel::ORANGE,
            paper: BLACK,
            artifact: Artifact::Off,
            lowercase: None,
        }
    }
}

/// Scanline renderer state.
pub struct Vdg {
    h_active: usize,
    v_active: usize,
    font: Font,
    pub settings: VdgSettings,
    /// Offset of the current row from the start of video memory.
    row_base: u16,
    /// Scanlines left in the current row.
    counter: u16,
    prev_mode: u8,
    border: Pixel,
}

impl Vdg {
    /// `font` holds 64 glyphs, or 128 when a lowercase bank is used.
    ///
    /// # Panics
    ///
    /// Panics if the display is smaller than the doubled VDG picture.
    #[must_use]
    pub fn new(h_active: usize, v_active: usize, font: Font) -> Self {
        assert!(
            h_active >= ACTIVE_WIDTH && v_active >= ACTIVE_HEIGHT,
            "{h_active}x{v_active} display cannot hold the {ACTIVE_WIDTH}x{ACTIVE_HEIGHT} VDG picture"
        );
        Self {
            h_active,
            v_active,
            font,
            settings: VdgSettings::default(),
            row_base: 0,
            counter: VdgMode::AlphaSemigraphics.lines_per_row(),
            prev_mode: 0,
            border: BLACK,
        }
    }

    #[must_use]
    pub fn vertical_offset(&self) -> usize {
        (self.v_active - ACTIVE_HEIGHT) / 2
    }

    #[must_use]
    pub fn horizontal_offset(&self) -> usize {
        (self.h_active - ACTIVE_WIDTH) / 2
    }

    /// Scanline within the VDG picture, or `None` in the top or bottom
    /// border.
    #[must_use]
    pub fn active_line(&self, line: usize) -> Option<usize> {
        line.checked_sub(self.vertical_offset())
            .filter(|&relative| relative < ACTIVE_HEIGHT)
    }

    /// What `line` shows under `mode_bits`; `None` for border lines.
    #[must_use]
    pub fn line_mode(&self, line: usize, mode_bits: u8) -> Option<VdgMode> {
        self.active_line(line).map(|_| VdgMode::from_bits(mode_bits))
    }

    /// Render one scanline, choosing border, text or graphics.
    pub fn draw_line<B: Bus + ?Sized>(&mut self, bus: &B, line: usize, control: &VdgControl, out: &mut [Pixel]) {
        match self.line_mode(line, control.mode) {
            None => self.draw_border_line(control.mode, out),
            Some(VdgMode::AlphaSemigraphics) => self.draw_text_line(bus, line, control, out),
            Some(VdgMode::PackedGraphics { class }) => {
                self.draw_graphics_line(bus, line, class, control, out);
            }
        }
    }

    /// Top or bottom border in the colour of the last active line.
    pub fn draw_border_line(&mut self, mode_bits: u8, out: &mut [Pixel]) {
        out[..self.h_active].fill(self.border);
        self.advance_row(mode_bits);
    }

    /// Alphanumeric/semigraphics scanline.
    pub fn draw_text_line<B: Bus + ?Sized>(&mut self, bus: &B, line: usize, control: &VdgControl, out: &mut [Pixel]) {
        let relative = self.begin_active_line(line, control.mode);
        self.border = BLACK;
        let active = self.fill_side_borders(out);
        let sub_row = (relative / YSCALE) % GLYPH_HEIGHT;
        let base = control.base.wrapping_add(self.row_base);
        for (col, cell) in (0..TEXT_COLUMNS).zip(active.chunks_exact_mut(CELL_WIDTH)) {
            let ch = bus.read(base.wrapping_add(col));
            self.draw_cell(ch, sub_row, control, cell);
        }
        self.advance_row(control.mode);
    }

    /// Packed-graphics scanline for `class` (1–8).
    pub fn draw_graphics_line<B: Bus + ?Sized>(
        &mut self,
        bus: &B,
        line: usize,
        class: u8,
        control: &VdgControl,
        out: &mut [Pixel],
    ) {
        self.begin_active_line(line, control.mode);
        self.border = VDG_PALETTE[0];
        let active = self.fill_side_borders(out);
        let mode = VdgMode::PackedGraphics { class };
        let base = control.base.wrapping_add(self.row_base);
        let palette = &VDG_PALETTE[if control.css { 4 } else { 0 }..];
        let width = mode.width();

        if mode.is_colour() {
            decode_fields(bus, base, width / 16, 2, |field| palette[field], active);
        } else if let Some(artifact) = self.settings.artifact.palette().filter(|_| width == 256) {
            decode_fields(bus, base, width / 32, 2, |field| artifact[field], active);
        } else {
            let fg = palette[0];
            decode_fields(bus, base, width / 32, 1, |bit| if bit == 1 { fg } else { BLACK }, active);
        }
        self.advance_row(control.mode);
    }

    fn begin_active_line(&mut self, line: usize, mode_bits: u8) -> usize {
        let relative = line.saturating_sub(self.vertical_offset());
        if relative == 0 {
            self.row_base = 0;
            self.counter = VdgMode::from_bits(mode_bits).lines_per_row();
        }
        relative
    }

    /// Fill the left and right borders; returns the active span.
    fn fill_side_borders<'a>(&self, out: &'a mut [Pixel]) -> &'a mut [Pixel] {
        let left = self.horizontal_offset();
        let line = &mut out[..self.h_active];
        line[..left].fill(self.border);
        line[left + ACTIVE_WIDTH..].fill(self.border);
        &mut line[left..left + ACTIVE_WIDTH]
    }

    fn advance_row(&mut self, mode_bits: u8) {
        self.counter = self.counter.saturating_sub(1);
        if self.counter == 0 || mode_bits != self.prev_mode {
            let mode = VdgMode::from_bits(mode_bits);
            self.counter = mode.lines_per_row();
            self.row_base = self.row_base.wrapping_add(mode.bytes_per_row());
            self.prev_mode = mode_bits;
        }
    }

    fn draw_cell(&self, ch: u8, sub_row: usize, control: &VdgControl, cell: &mut [Pixel]) {
        let paper = self.settings.paper;

        if ch & 0x40 == 0 {
            let mut fg = if control.css { self.settings.ink_alt } else { self.settings.ink };
            let mut bg = paper;
            let mut glyph = usize::from(ch & 0x3F);
            let inverted = match self.settings.lowercase {
                Some(lower) if (lower.first..=lower.last).contains(&ch) => {
                    glyph += 64;
                    lower.inverted
                }
                _ => ch & 0x80 != 0,
            };
            if inverted {
                (fg, bg) = (bg, fg);
            }
            let bits = self.font.row(glyph, sub_row);
            if bits == 0 {
                cell.fill(bg);
                return;
            }
            for (i, pair) in cell.chunks_exact_mut(XSCALE).enumerate() {
                pair.fill(if bits & (0x80 >> i) != 0 { fg } else { bg });
            }
            return;
        }

        let sg6 = match control.int_ext {
            IntExt::FollowsAs => true,
            IntExt::Level(level) => level,
        };
        let (colour, pix_row) = if sg6 {
            let index = usize::from(ch >> 6) + if control.css { 4 } else { 0 };
            (VDG_PALETTE[index], 2 - sub_row / 4)
        } else {
            (VDG_PALETTE[usize::from((ch & 0x70) >> 4)], 1 - sub_row / 6)
        };
        let pair = (ch >> (pix_row * 2)) & 0x3;
        let (left, right) = cell.split_at_mut(CELL_WIDTH / 2);
        left.fill(if pair & 0x2 != 0 { colour } else { paper });
        right.fill(if pair & 0x1 != 0 { colour } else { paper });
    }
}

/// Unpack `words` big-endian 32-bit words of `bits`-wide fields, each
/// widened to fill an equal share of `out`.
fn decode_fields<B: Bus + ?Sized>(
    bus: &B,
    base: u16,
    words: usize,
    bits: u32,
    colour: impl Fn(usize) -> Pixel,
    out: &mut [Pixel],
) {
    let fields_per_word = 32 / bits as usize;
    let widen = out.len() / (words * fields_per_word);
    let mask = (1u32 << bits) - 1;
    let mut pixels = out.chunks_exact_mut(widen);
    for word_index in 0..words {
        let word = bus.read_be32(base.wrapping_add((word_index * 4) as u16));
        for field in 0..fields_per_word as u32 {
            let shift = 32 - bits * (field + 1);
            if let Some(span) = pixels.next() {
                span.fill(colour(((word >> shift) & mask) as usize));
            }
        }
    }
}

impl Observable for Vdg {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "mode" => Some(self.prev_mode.into()),
            "row_base" => Some(self.row_base.into()),
            "counter" => Some(self.counter.into()),
            "border" => Some(self.border.into()),
            "vertical_offset" => Some(self.vertical_offset().into()),
            "horizontal_offset" => Some(self.horizontal_offset().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "mode",
            "row_base",
            "counter",
            "border",
            "vertical_offset",
            "horizontal_offset",
        ]
    }
}
