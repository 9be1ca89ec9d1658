//! Character rounding.
//!
//! The SAA5050 stores 5×9 glyphs in a 6×10 cell and displays each source
//! pixel as a 2×2 block, filling the half-pixel notches of diagonals.
//! Looking at two source rows and three columns around a pixel:
//!
//! ```text
//! A B C      1 2
//! D E F  ->  3 4
//! ```
//!
//! ```text
//! 1 = B | (A & E & !B & !D)
//! 2 = B | (C & E & !B & !F)
//! 3 = E | (!A & !E & B & D)
//! 4 = E | (!C & !E & B & F)
//! ```
//!
//! Each source pair of rows yields two output rows, so the 10 source rows
//! become 20, and each of source columns 1–6 becomes two output pixels.

use emu_core::Font;

/// Displayable characters, codes 0x20–0x7F.
pub const CHARACTERS: usize = 0x60;
/// Output scan lines per character row.
pub const ROWS: usize = 20;

/// Rounded 12×20 glyphs, one 12-bit row bitmap per scan line
/// (bit 11 leftmost).
pub struct RoundedFont {
    rows: Box<[[u16; ROWS]]>,
}

impl RoundedFont {
    /// Round every glyph of an 8×12 source font. Missing glyphs are blank.
    #[must_use]
    pub fn new(source: &Font) -> Self {
        let rows = (0..CHARACTERS).map(|glyph| round_glyph(source, glyph)).collect();
        Self { rows }
    }

    /// Row `sub_row` of the glyph for character code `ch` (0x20–0x7F).
    #[must_use]
    pub fn row(&self, ch: u8, sub_row: usize) -> u16 {
        let index = usize::from(ch.wrapping_sub(0x20));
        self.rows
            .get(index)
            .and_then(|glyph| glyph.get(sub_row))
            .copied()
            .unwrap_or(0)
    }
}

fn round_glyph(source: &Font, glyph: usize) -> [u16; ROWS] {
    let mut out = [0; ROWS];
    for (pair, rows) in out.chunks_exact_mut(2).enumerate() {
        let upper = source.row(glyph, pair + 1);
        let lower = source.row(glyph, pair + 2);
        let (top, bottom) = round_rows(upper, lower);
        rows[0] = top;
        rows[1] = bottom;
    }
    out
}

/// Round one pair of source rows into two 12-pixel output rows.
fn round_rows(mut upper: u8, mut lower: u8) -> (u16, u16) {
    let mut top = 0u16;
    let mut bottom = 0u16;
    for _ in 0..6 {
        let [a, b, c] = [upper & 0x80 != 0, upper & 0x40 != 0, upper & 0x20 != 0];
        let [d, e, f] = [lower & 0x80 != 0, lower & 0x40 != 0, lower & 0x20 != 0];

        let r1 = b | (a & e & !b & !d);
        let r2 = b | (c & e & !b & !f);
        let r3 = e | (!a & !e & b & d);
        let r4 = e | (!c & !e & b & f);

        top = (top << 2) | (u16::from(r1) << 1) | u16::from(r2);
        bottom = (bottom << 2) | (u16::from(r3) << 1) | u16::from(r4);
        upper <<= 1;
        lower <<= 1;
    }
    // Source column 0 only feeds its neighbour, so the cell opens with two
    // blank pixels and column 6 is dropped.
    (top >> 2, bottom >> 2)
}
