//! Mullard SAA5050 teletext character generator.
//!
//! Renders a 40×25 teletext page from shadow memory into 480×500 pixels:
//! 12×20 cells with the chip's rounded characters, contiguous and
//! separated mosaics, double height, flash, conceal and held graphics.
//! Display start and cursor come from a [`Crtc6845`].
//!
//! # Control codes
//!
//! Codes 0x00–0x1F occupy a cell and change the attributes of the rest of
//! the row. Most take effect from the next cell ("set-after"); a few apply
//! to their own cell ("set-at"):
//!
//! | Code | Effect | Timing |
//! |------|--------|--------|
//! | 0x01–0x07 | Alphanumeric colour | after |
//! | 0x08/0x09 | Flash / steady | after |
//! | 0x0C/0x0D | Normal / double height | at |
//! | 0x11–0x17 | Graphics colour | after |
//! | 0x18 | Conceal | after |
//! | 0x19/0x1A | Contiguous / separated graphics | after |
//! | 0x1C/0x1D | Black / new background | at |
//! | 0x1E/0x1F | Hold / release graphics | at / after |
//!
//! Every row starts white alphanumerics on black, steady, normal height.
//!
//! # Page memory
//!
//! The page is read from a 1K window: cell (row, col) lives at
//! `page + ((start + row * 40 + col) & 0x3FF)` where `start` is the CRTC
//! display start address.

mod font;
mod mosaic;

use emu_core::pixel::{BLACK, BLUE, CYAN, GREEN, MAGENTA, ORANGE, RED, WHITE, YELLOW};
use emu_core::{Bus, Font, Observable, Pixel, Value};
use motorola_6845::Crtc6845;

pub use font::{CHARACTERS, RoundedFont, ROWS};
pub use mosaic::{mosaic_row, paint_cell};

/// Character columns per row.
pub const COLUMNS: usize = 40;
/// Character rows per page.
pub const TEXT_ROWS: usize = 25;
/// Pixels per cell.
pub const CELL_WIDTH: usize = 12;
/// Active picture width.
pub const WIDTH: usize = COLUMNS * CELL_WIDTH;
/// Active picture height.
pub const HEIGHT: usize = TEXT_ROWS * ROWS;
/// Size of the page window in bytes.
pub const PAGE_WINDOW: u16 = 0x400;

/// Flags register: show control codes as hex digits.
pub const FLAG_DEBUG: u8 = 0x01;
/// Flags register: show concealed text.
pub const FLAG_REVEAL: u8 = 0x02;

/// Fields in one flash cycle.
const FLASH_PERIOD: u8 = 64;
/// Fields of each flash cycle during which flashing text is hidden.
const FLASH_HIDDEN: u8 = 21;

/// Teletext control code values.
pub mod codes {
    pub const ALPHA_RED: u8 = 0x01;
    pub const ALPHA_WHITE: u8 = 0x07;
    pub const FLASH: u8 = 0x08;
    pub const STEADY: u8 = 0x09;
    pub const NORMAL_HEIGHT: u8 = 0x0C;
    pub const DOUBLE_HEIGHT: u8 = 0x0D;
    pub const GRAPHICS_RED: u8 = 0x11;
    pub const GRAPHICS_GREEN: u8 = 0x12;
    pub const GRAPHICS_WHITE: u8 = 0x17;
    pub const CONCEAL: u8 = 0x18;
    pub const CONTIGUOUS: u8 = 0x19;
    pub const SEPARATED: u8 = 0x1A;
    pub const BLACK_BACKGROUND: u8 = 0x1C;
    pub const NEW_BACKGROUND: u8 = 0x1D;
    pub const HOLD: u8 = 0x1E;
    pub const RELEASE: u8 = 0x1F;
}

const COLOURS: [Pixel; 8] = [BLACK, RED, GREEN, YELLOW, BLUE, MAGENTA, CYAN, WHITE];

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Per-page settings, decoded from the teletext registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeletextControl {
    /// Base of the 1K page window.
    pub page: u16,
    pub debug: bool,
    pub reveal: bool,
}

impl TeletextControl {
    /// Decode the flags register.
    #[must_use]
    pub fn from_flags(page: u16, flags: u8) -> Self {
        Self {
            page,
            debug: flags & FLAG_DEBUG != 0,
            reveal: flags & FLAG_REVEAL != 0,
        }
    }
}

/// Attributes in force while walking one character row.
struct RowState {
    fg: Pixel,
    bg: Pixel,
    graphics: bool,
    separated: bool,
    hold: bool,
    flash: bool,
    conceal: bool,
    double_height: bool,
    /// Scan line of the most recent mosaic, for held graphics.
    held: u16,
}

impl RowState {
    fn new() -> Self {
        Self {
            fg: WHITE,
            bg: BLACK,
            graphics: false,
            separated: false,
            hold: false,
            flash: false,
            conceal: false,
            double_height: false,
            held: 0,
        }
    }

    /// Attributes that change before the cell is drawn.
    fn set_at(&mut self, ch: u8) {
        match ch {
            codes::NORMAL_HEIGHT => {
                if self.double_height {
                    self.held = 0;
                    self.double_height = false;
                }
            }
            codes::DOUBLE_HEIGHT => {
                if !self.double_height {
                    self.held = 0;
                    self.double_height = true;
                }
            }
            codes::BLACK_BACKGROUND => self.bg = BLACK,
            codes::NEW_BACKGROUND => self.bg = self.fg,
            codes::HOLD => self.hold = true,
            _ => {}
        }
    }

    /// Attributes that change after the cell is drawn.
    fn set_after(&mut self, ch: u8) {
        match ch {
            codes::ALPHA_RED..=codes::ALPHA_WHITE => {
                self.fg = COLOURS[usize::from(ch)];
                if self.graphics {
                    self.held = 0;
                    self.graphics = false;
                }
                self.conceal = false;
            }
            codes::FLASH => self.flash = true,
            codes::STEADY => self.flash = false,
            codes::GRAPHICS_RED..=codes::GRAPHICS_WHITE => {
                self.fg = COLOURS[usize::from(ch & 7)];
                if !self.graphics {
                    self.held = 0;
                    self.graphics = true;
                }
                self.conceal = false;
            }
            codes::CONCEAL => self.conceal = true,
            codes::CONTIGUOUS => self.separated = false,
            codes::SEPARATED => self.separated = true,
            codes::RELEASE => self.hold = false,
            _ => {}
        }
    }
}

/// The teletext renderer.
pub struct Teletext {
    h_active: usize,
    v_active: usize,
    font: RoundedFont,
    /// Row whose double-height cells show their lower half this field.
    next_double: Option<usize>,
    /// Flash phase, counting fields modulo 64.
    flash_count: u8,
    /// Free-running field counter for cursor blink.
    fields: u32,
}

impl Teletext {
    /// Create a renderer for an `h_active` × `v_active` display.
    ///
    /// Displays of 500 lines or more show the page centred; shorter ones
    /// scale it by dropping scan lines.
    ///
    /// # Panics
    ///
    /// Panics if `h_active` is narrower than the 480-pixel page.
    #[must_use]
    pub fn new(h_active: usize, v_active: usize, font: &Font) -> Self {
        assert!(
            h_active >= WIDTH,
            "{h_active}-pixel line cannot hold a {WIDTH}-pixel teletext page"
        );
        Self {
            h_active,
            v_active,
            font: RoundedFont::new(font),
            next_double: None,
            flash_count: 0,
            fields: 0,
        }
    }

    /// Whether flashing text is in its hidden phase.
    #[must_use]
    pub fn flash_hidden(&self) -> bool {
        self.flash_count < FLASH_HIDDEN
    }

    /// Page scan line shown on display line `line`.
    fn page_line(&self, line: usize) -> Option<usize> {
        if self.v_active >= HEIGHT {
            let top = (self.v_active - HEIGHT) / 2;
            line.checked_sub(top).filter(|&relative| relative < HEIGHT)
        } else {
            (line < self.v_active).then(|| line * HEIGHT / self.v_active)
        }
    }

    fn begin_field(&mut self) {
        self.flash_count = (self.flash_count + 1) % FLASH_PERIOD;
        self.fields = self.fields.wrapping_add(1);
        self.next_double = None;
    }

    /// Render display line `line` into `out[..h_active]`.
    ///
    /// Lines must be rendered in order within a field: double height
    /// relies on the row above having been drawn first.
    pub fn render_line<B: Bus + ?Sized>(
        &mut self,
        bus: &B,
        crtc: &Crtc6845,
        line: usize,
        control: &TeletextControl,
        out: &mut [Pixel],
    ) {
        let out = &mut out[..self.h_active];
        let Some(relative) = self.page_line(line) else {
            out.fill(BLACK);
            return;
        };
        if relative == 0 {
            self.begin_field();
        }

        let left = (self.h_active - WIDTH) / 2;
        let (border, rest) = out.split_at_mut(left);
        let (page, right) = rest.split_at_mut(WIDTH);
        border.fill(BLACK);
        right.fill(BLACK);

        self.render_row(bus, crtc, relative / ROWS, relative % ROWS, control, page);
    }

    fn render_row<B: Bus + ?Sized>(
        &mut self,
        bus: &B,
        crtc: &Crtc6845,
        row: usize,
        sub_row: usize,
        control: &TeletextControl,
        out: &mut [Pixel],
    ) {
        let start = usize::from(crtc.start_address());
        let cursor = usize::from(crtc.cursor_address() & (PAGE_WINDOW - 1));
        let cursor_lit = crtc.cursor_on(self.fields)
            && u8::try_from(sub_row).is_ok_and(|s| crtc.cursor_raster().contains(&s));
        let lower_half = self.next_double == Some(row);

        let mut state = RowState::new();
        for (col, cell) in out.chunks_exact_mut(CELL_WIDTH).enumerate() {
            let offset = (start + row * COLUMNS + col) & usize::from(PAGE_WINDOW - 1);
            let ch = bus.read(control.page.wrapping_add(offset as u16)) & 0x7F;

            state.set_at(ch);
            if ch == codes::DOUBLE_HEIGHT && self.next_double != Some(row) {
                self.next_double = Some(row + 1);
            }

            let glyph_row = if state.double_height {
                sub_row / 2 + if lower_half { ROWS / 2 } else { 0 }
            } else {
                sub_row
            };

            let (mut bits, fg, bg) = if ch < 0x20 && control.debug {
                let digit = HEX_DIGITS[usize::from(ch & 0xF)];
                let bg = if ch & 0x10 != 0 { WHITE } else { BLACK };
                (self.font.row(digit, sub_row), ORANGE, bg)
            } else {
                let mut bits = if ch < 0x20 {
                    if state.hold { state.held } else { 0 }
                } else if state.graphics && ch & 0x20 != 0 {
                    state.held = mosaic_row(ch, sub_row, state.separated, lower_half);
                    state.held
                } else {
                    self.font.row(ch, glyph_row)
                };
                if (state.conceal && !control.reveal) || (state.flash && self.flash_hidden()) {
                    bits = 0;
                }
                (bits, state.fg, state.bg)
            };

            if cursor_lit && offset == cursor {
                bits ^= 0xFFF;
            }
            paint_cell(bits, fg, bg, cell);

            state.set_after(ch);
        }
    }
}

impl Observable for Teletext {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "flash_count" => Some(self.flash_count.into()),
            "flash_hidden" => Some(self.flash_hidden().into()),
            "fields" => Some(self.fields.into()),
            "next_double" => self.next_double.map(Value::from),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["flash_count", "flash_hidden", "fields", "next_double"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::RamBus;

    const PAGE: u16 = 0x8400;
    const H: usize = 800;
    const V: usize = 600;
    const TOP: usize = 50;
    const LEFT: usize = 160;

    fn test_font() -> Font {
        let mut font = Font::blank(CHARACTERS);
        // 'A': an asymmetric shape so upper and lower halves differ.
        font.set_glyph(0x21, [0, 0x10, 0x28, 0x44, 0x44, 0x7C, 0x44, 0x44, 0x44, 0, 0, 0]);
        // 'B'
        font.set_glyph(0x22, [0, 0x78, 0x44, 0x44, 0x78, 0x44, 0x44, 0x44, 0x78, 0, 0, 0]);
        // '1'
        font.set_glyph(0x11, [0, 0x10, 0x30, 0x10, 0x10, 0x10, 0x10, 0x10, 0x38, 0, 0, 0]);
        font
    }

    struct Rig {
        teletext: Teletext,
        bus: RamBus,
        crtc: Crtc6845,
        control: TeletextControl,
        line: Vec<Pixel>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                teletext: Teletext::new(H, V, &test_font()),
                bus: RamBus::new(),
                crtc: Crtc6845::new(),
                control: TeletextControl::from_flags(PAGE, 0),
                line: vec![0; H],
            }
        }

        fn poke_row(&self, row: usize, bytes: &[u8]) {
            self.bus.load(PAGE + (row * COLUMNS) as u16, bytes);
        }

        fn render(&mut self, row: usize, sub_row: usize) {
            let line = TOP + row * ROWS + sub_row;
            self.teletext
                .render_line(&self.bus, &self.crtc, line, &self.control, &mut self.line);
        }

        fn start_field(&mut self) {
            self.render(0, 0);
        }

        fn cell(&self, col: usize) -> &[Pixel] {
            &self.line[LEFT + col * CELL_WIDTH..LEFT + (col + 1) * CELL_WIDTH]
        }

        fn glyph(&self, ch: u8, row: usize) -> u16 {
            self.teletext.font.row(ch, row)
        }
    }

    fn expected(bits: u16, fg: Pixel, bg: Pixel) -> Vec<Pixel> {
        (0..CELL_WIDTH)
            .map(|i| if bits & (0x800 >> i) != 0 { fg } else { bg })
            .collect()
    }

    #[test]
    #[should_panic(expected = "cannot hold")]
    fn narrow_display_rejected() {
        let _ = Teletext::new(400, 600, &test_font());
    }

    #[test]
    fn page_line_centres_or_scales() {
        let tall = Teletext::new(720, 576, &test_font());
        assert_eq!(tall.page_line(37), None);
        assert_eq!(tall.page_line(38), Some(0));
        assert_eq!(tall.page_line(537), Some(499));
        assert_eq!(tall.page_line(538), None);

        let short = Teletext::new(640, 480, &test_font());
        assert_eq!(short.page_line(0), Some(0));
        assert_eq!(short.page_line(479), Some(498));
        assert_eq!(short.page_line(480), None);
    }

    #[test]
    fn lines_outside_page_are_black() {
        let mut rig = Rig::new();
        rig.line.fill(0xFF);
        rig.teletext
            .render_line(&rig.bus, &rig.crtc, 10, &rig.control, &mut rig.line);
        assert!(rig.line.iter().all(|&p| p == BLACK));
    }

    #[test]
    fn colour_code_applies_from_next_cell() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::ALPHA_RED, b'A', b'B']);
        rig.start_field();
        for sub_row in [2, 6, 10] {
            rig.render(0, sub_row);
            assert_eq!(rig.cell(0), expected(0, WHITE, BLACK), "code cell");
            assert_eq!(rig.cell(1), expected(rig.glyph(b'A', sub_row), RED, BLACK));
            assert_eq!(rig.cell(2), expected(rig.glyph(b'B', sub_row), RED, BLACK));
        }
    }

    #[test]
    fn new_background_applies_to_own_cell() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::ALPHA_RED, codes::NEW_BACKGROUND, b'A', codes::BLACK_BACKGROUND]);
        rig.start_field();
        rig.render(0, 4);
        assert_eq!(rig.cell(1), expected(0, RED, RED));
        assert_eq!(rig.cell(2), expected(rig.glyph(b'A', 4), RED, RED));
        assert_eq!(rig.cell(3), expected(0, RED, BLACK));
    }

    #[test]
    fn attributes_reset_each_row() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::ALPHA_RED]);
        rig.poke_row(1, &[b'A']);
        rig.start_field();
        rig.render(1, 6);
        assert_eq!(rig.cell(0), expected(rig.glyph(b'A', 6), WHITE, BLACK));
    }

    #[test]
    fn flash_hides_text_for_21_of_64_fields() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::FLASH, b'A']);
        let hidden: Vec<bool> = (0..192)
            .map(|_| {
                rig.start_field();
                rig.render(0, 6);
                rig.cell(1).iter().all(|&p| p == BLACK)
            })
            .collect();

        let onset = (1..hidden.len())
            .find(|&i| hidden[i] && !hidden[i - 1])
            .expect("flash never hides");
        let period: Vec<bool> = (0..64).map(|field| field < 21).collect();
        assert_eq!(hidden[onset..onset + 64], period[..], "first period");
        assert_eq!(hidden[onset + 64..onset + 128], period[..], "second period");
    }

    #[test]
    fn double_height_spans_two_rows() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::DOUBLE_HEIGHT, b'A']);
        rig.poke_row(1, &[codes::DOUBLE_HEIGHT, b'A']);
        rig.poke_row(2, &[codes::DOUBLE_HEIGHT, b'A']);
        rig.start_field();
        for row in 0..3 {
            for sub_row in 0..ROWS {
                rig.render(row, sub_row);
                let source = sub_row / 2 + if row == 1 { ROWS / 2 } else { 0 };
                assert_eq!(
                    rig.cell(1),
                    expected(rig.glyph(b'A', source), WHITE, BLACK),
                    "row {row} sub-row {sub_row}"
                );
            }
        }
    }

    #[test]
    fn mosaics_are_not_doubled() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::DOUBLE_HEIGHT, codes::GRAPHICS_WHITE, 0x21]);
        rig.poke_row(1, &[codes::GRAPHICS_WHITE, 0x7F]);
        rig.start_field();
        // Top-left block only: lit on block row 0, blank from sub-row 6.
        rig.render(0, 0);
        assert_eq!(rig.cell(2), expected(0xFC0, WHITE, BLACK));
        rig.render(0, 10);
        assert_eq!(rig.cell(2), expected(0, WHITE, BLACK));
        for sub_row in 0..ROWS {
            rig.render(1, sub_row);
            assert_eq!(rig.cell(1), expected(0, WHITE, BLACK), "sub-row {sub_row}");
        }
    }

    #[test]
    fn lower_half_row_keeps_normal_cells() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::DOUBLE_HEIGHT, b'A']);
        rig.poke_row(1, &[b'A']);
        rig.start_field();
        for sub_row in 0..ROWS {
            rig.render(0, sub_row);
        }
        for sub_row in 0..ROWS {
            rig.render(1, sub_row);
            assert_eq!(rig.cell(0), expected(rig.glyph(b'A', sub_row), WHITE, BLACK));
        }
    }

    #[test]
    fn held_graphics_fill_control_cells() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::GRAPHICS_RED, 0x7F, codes::HOLD, codes::RELEASE, codes::BLACK_BACKGROUND]);
        rig.poke_row(1, &[codes::GRAPHICS_RED, 0x7F, codes::BLACK_BACKGROUND]);
        rig.start_field();
        rig.render(0, 8);
        assert_eq!(rig.cell(1), expected(0xFFF, RED, BLACK));
        assert_eq!(rig.cell(2), expected(0xFFF, RED, BLACK), "hold applies at");
        assert_eq!(rig.cell(3), expected(0xFFF, RED, BLACK), "release applies after");
        assert_eq!(rig.cell(4), expected(0, RED, BLACK));
        rig.render(1, 8);
        assert_eq!(rig.cell(2), expected(0, RED, BLACK));
    }

    #[test]
    fn separated_mosaics_leave_gaps() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::GRAPHICS_WHITE, codes::SEPARATED, 0x7F, codes::CONTIGUOUS, 0x7F]);
        rig.start_field();
        rig.render(0, 0);
        assert_eq!(rig.cell(2), expected(0, WHITE, BLACK));
        assert_eq!(rig.cell(4), expected(0xFFF, WHITE, BLACK));
        rig.render(0, 1);
        assert_eq!(rig.cell(2), expected(0x79E, WHITE, BLACK));
    }

    #[test]
    fn capitals_blast_through_graphics() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::GRAPHICS_GREEN, b'A']);
        rig.start_field();
        rig.render(0, 6);
        assert_eq!(rig.cell(1), expected(rig.glyph(b'A', 6), GREEN, BLACK));
    }

    #[test]
    fn conceal_until_reveal() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::CONCEAL, b'A']);
        rig.start_field();
        rig.render(0, 6);
        assert_eq!(rig.cell(1), expected(0, WHITE, BLACK));
        rig.control = TeletextControl::from_flags(PAGE, FLAG_REVEAL);
        rig.render(0, 6);
        assert_eq!(rig.cell(1), expected(rig.glyph(b'A', 6), WHITE, BLACK));
    }

    #[test]
    fn debug_shows_codes_as_hex() {
        let mut rig = Rig::new();
        rig.poke_row(0, &[codes::ALPHA_RED, codes::GRAPHICS_RED]);
        rig.control = TeletextControl::from_flags(PAGE, FLAG_DEBUG);
        rig.start_field();
        rig.render(0, 6);
        assert_eq!(rig.cell(0), expected(rig.glyph(b'1', 6), ORANGE, BLACK));
        assert_eq!(rig.cell(1), expected(rig.glyph(b'1', 6), ORANGE, WHITE));
    }

    #[test]
    fn cursor_inverts_its_raster_band() {
        let mut rig = Rig::new();
        rig.poke_row(1, &[b' '; COLUMNS]);
        rig.crtc.write_address(14);
        rig.crtc.write_data(0);
        rig.crtc.write_address(15);
        rig.crtc.write_data(41);
        rig.start_field();
        rig.render(1, 17);
        assert_eq!(rig.cell(1), expected(0, WHITE, BLACK));
        rig.render(1, 18);
        assert_eq!(rig.cell(1), expected(0xFFF, WHITE, BLACK));
        assert_eq!(rig.cell(0), expected(0, WHITE, BLACK));
    }

    #[test]
    fn start_address_scrolls_within_window() {
        let mut rig = Rig::new();
        rig.bus.load(PAGE + 0x3FF, &[b'A']);
        rig.crtc.write_address(13);
        rig.crtc.write_data(0xFF);
        rig.crtc.write_address(12);
        rig.crtc.write_data(0x03);
        rig.start_field();
        rig.render(0, 6);
        assert_eq!(rig.cell(0), expected(rig.glyph(b'A', 6), WHITE, BLACK));
    }
}
