//! Attributed 80-column text.
//!
//! 80×40 characters of 8×12 pixels from video RAM, 640 pixels centred on
//! the line. With attribute mode on (`COL80_FG` bit 3), each character has
//! an attribute byte 3200 bytes further on:
//!
//! | Bit | Meaning |
//! |-----|---------|
//! | 7 | Semigraphic: character bits 5–0 are a 2×3 block grid, top left first |
//! | 6–4 | Background |
//! | 3 | Underline (glyph row 10) |
//! | 2–0 | Foreground |
//!
//! Text characters ≥ 0x80 are inverted. Without attributes, bit 7 inverts
//! and `COL80_FG`/`COL80_BG` bits 2–0 give the colours.

use emu_core::pixel::BLACK;
use emu_core::{Bus, Font, Pixel};
use log::debug;
use shadow_bus::ShadowBus;

use crate::config::Platform;
use crate::map::{COL80_ATTR, COL80_BASE, COL80_BG, COL80_FG, COL80_STAT, FB_ADDR};
use crate::palette::VGA80_PALETTE;

pub const COLUMNS: usize = 80;
pub const ROWS: usize = 40;
pub const WIDTH: usize = COLUMNS * 8;
const GLYPH_HEIGHT: usize = 12;
const UNDERLINE_ROW: usize = 10;
/// Offset of the attribute plane from the character plane.
pub const ATTRIBUTE_OFFSET: u16 = (COLUMNS * ROWS) as u16;

/// Reset values of `COL80_BASE`, `COL80_FG`, `COL80_BG` and `COL80_STAT`.
const RESET_REGISTERS: [(u16, u8); 4] = [
    (COL80_BASE, 0x00),
    (COL80_FG, 0xB2),
    (COL80_BG, 0x00),
    (COL80_STAT, 0x12),
];

/// Put the control registers back to their power-on values: display off,
/// green on black, no attributes.
pub fn reset_registers(bus: &ShadowBus) {
    for (address, value) in RESET_REGISTERS {
        bus.write(address, value);
    }
    debug!("VGA80 registers reset");
}

/// The 80-column renderer.
pub struct Vga80 {
    h_active: usize,
    font: Font,
    platform: Platform,
    /// Two pixels per lookup, indexed by `bg(8..6) | x(5) | fg(4..2) | pair(1..0)`.
    lut: Box<[[Pixel; 2]]>,
}

impl Vga80 {
    /// # Panics
    ///
    /// Panics if `h_active` is narrower than 640 pixels.
    #[must_use]
    pub fn new(h_active: usize, font: Font, platform: Platform) -> Self {
        assert!(
            h_active >= WIDTH,
            "{h_active}-pixel line cannot hold {WIDTH} VGA80 pixels"
        );
        let lut = (0..512usize)
            .map(|i| {
                let fg = VGA80_PALETTE[(i >> 2) & 7];
                let bg = VGA80_PALETTE[(i >> 6) & 7];
                [
                    if i & 2 != 0 { fg } else { bg },
                    if i & 1 != 0 { fg } else { bg },
                ]
            })
            .collect();
        Self {
            h_active,
            font,
            platform,
            lut,
        }
    }

    /// Pixel pair for LUT index `index`.
    #[must_use]
    pub fn pair(&self, index: usize) -> [Pixel; 2] {
        self.lut[index & 0x1FF]
    }

    /// Render display line `line` into `out[..h_active]`.
    pub fn render_line<B: Bus + ?Sized>(&self, bus: &B, line: usize, out: &mut [Pixel]) {
        let out = &mut out[..self.h_active];
        let row = line / GLYPH_HEIGHT;
        if row >= ROWS {
            out.fill(BLACK);
            return;
        }
        let sub_row = line % GLYPH_HEIGHT;
        let left = (self.h_active - WIDTH) / 2;
        let (border, rest) = out.split_at_mut(left);
        let (active, right) = rest.split_at_mut(WIDTH);
        border.fill(BLACK);
        right.fill(BLACK);

        let chars = FB_ADDR + (row * COLUMNS) as u16;
        let fg = bus.read(COL80_FG);
        let bg = bus.read(COL80_BG);
        let cells = active.chunks_exact_mut(8).enumerate();

        if fg & COL80_ATTR != 0 {
            let attrs = chars + ATTRIBUTE_OFFSET;
            let shift = (sub_row >> 1) & 6;
            let (smask0, smask1) = (0x10 >> shift, 0x20 >> shift);
            let underline = if sub_row == UNDERLINE_ROW { 0xFF } else { 0 };
            for (col, cell) in cells {
                let mut ch = bus.read(chars + col as u16);
                let attr = bus.read(attrs + col as u16);
                let colours = usize::from(attr & 0x77) << 2;
                if attr & 0x80 != 0 {
                    let block = |mask: u8| self.pair(colours | if ch & mask != 0 { 3 } else { 0 });
                    let (left, right) = (block(smask1), block(smask0));
                    for (i, pair) in [left, left, right, right].into_iter().enumerate() {
                        cell[2 * i..2 * i + 2].copy_from_slice(&pair);
                    }
                } else {
                    if self.platform == Platform::Dragon {
                        ch ^= 0x60;
                    }
                    let mut bits = self.font.row(usize::from(ch & 0x7F), sub_row);
                    if ch >= 0x80 {
                        bits = !bits;
                    }
                    if attr & 0x08 != 0 {
                        bits |= underline;
                    }
                    self.paint(bits, colours, cell);
                }
            }
        } else {
            let colours = usize::from(((bg & 7) << 4) | (fg & 7)) << 2;
            for (col, cell) in cells {
                let mut ch = bus.read(chars + col as u16);
                let inverse = ch & 0x80 != 0;
                if self.platform == Platform::Dragon {
                    ch ^= 0x40;
                }
                let mut bits = self.font.row(usize::from(ch & 0x7F), sub_row);
                if inverse {
                    bits = !bits;
                }
                self.paint(bits, colours, cell);
            }
        }
    }

    fn paint(&self, bits: u8, colours: usize, cell: &mut [Pixel]) {
        for (i, pair) in cell.chunks_exact_mut(2).enumerate() {
            let index = colours | usize::from((bits >> (6 - 2 * i)) & 3);
            pair.copy_from_slice(&self.lut[index]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::RamBus;
    use emu_core::pixel::{BLUE, GREEN, RED, WHITE, YELLOW};

    fn font() -> Font {
        let mut font = Font::blank(128);
        let mut glyph = [0; 12];
        glyph[3] = 0b1100_0011;
        font.set_glyph(0x41, glyph);
        font
    }

    fn cell(out: &[Pixel], col: usize) -> &[Pixel] {
        &out[col * 8..col * 8 + 8]
    }

    #[test]
    fn lut_pairs_follow_index_layout() {
        let vga = Vga80::new(640, font(), Platform::Atom);
        // fg 4 (red), bg 1 (blue)
        let base = (1 << 6) | (4 << 2);
        assert_eq!(vga.pair(base), [BLUE, BLUE]);
        assert_eq!(vga.pair(base | 1), [BLUE, RED]);
        assert_eq!(vga.pair(base | 2), [RED, BLUE]);
        assert_eq!(vga.pair(base | 3), [RED, RED]);
        // Bit 5 is ignored.
        assert_eq!(vga.pair(base | 0x20 | 1), [BLUE, RED]);
    }

    #[test]
    fn default_colours_without_attributes() {
        let bus = RamBus::new();
        bus.write(COL80_FG, 0x06);
        bus.write(COL80_BG, 0x01);
        bus.write(FB_ADDR, 0x41);
        bus.write(FB_ADDR + 1, 0xC1);
        let vga = Vga80::new(640, font(), Platform::Atom);
        let mut out = vec![0; 640];
        vga.render_line(&bus, 3, &mut out);
        let (y, b) = (YELLOW, BLUE);
        assert_eq!(cell(&out, 0), &[y, y, b, b, b, b, y, y]);
        assert_eq!(cell(&out, 1), &[b, b, y, y, y, y, b, b], "bit 7 inverts");
    }

    #[test]
    fn attribute_plane_sets_colours_and_underline() {
        let bus = RamBus::new();
        bus.write(COL80_FG, COL80_ATTR);
        bus.write(FB_ADDR, 0x41);
        bus.write(FB_ADDR + ATTRIBUTE_OFFSET, 0x1F);
        let vga = Vga80::new(640, font(), Platform::Atom);
        let mut out = vec![0; 640];
        vga.render_line(&bus, 3, &mut out);
        let (w, b) = (WHITE, BLUE);
        assert_eq!(cell(&out, 0), &[w, w, b, b, b, b, w, w]);
        vga.render_line(&bus, 10, &mut out);
        assert_eq!(cell(&out, 0), &[w; 8], "underline row");
        vga.render_line(&bus, 9, &mut out);
        assert_eq!(cell(&out, 0), &[b; 8]);
    }

    #[test]
    fn semigraphic_blocks_follow_sub_row() {
        let bus = RamBus::new();
        bus.write(COL80_FG, COL80_ATTR);
        // Top-left (bit 5) and bottom-right (bit 0) blocks, green on black.
        bus.write(FB_ADDR, 0b10_0001);
        bus.write(FB_ADDR + ATTRIBUTE_OFFSET, 0x82);
        let vga = Vga80::new(640, font(), Platform::Atom);
        let mut out = vec![0; 640];
        let (g, k) = (GREEN, BLACK);
        vga.render_line(&bus, 0, &mut out);
        assert_eq!(cell(&out, 0), &[g, g, g, g, k, k, k, k]);
        vga.render_line(&bus, 5, &mut out);
        assert_eq!(cell(&out, 0), &[k; 8]);
        vga.render_line(&bus, 11, &mut out);
        assert_eq!(cell(&out, 0), &[k, k, k, k, g, g, g, g]);
    }

    #[test]
    fn dragon_translates_character_codes() {
        let bus = RamBus::new();
        bus.write(COL80_FG, 0x07);
        bus.write(FB_ADDR, 0x01);
        let vga = Vga80::new(640, font(), Platform::Dragon);
        let mut out = vec![0; 640];
        vga.render_line(&bus, 3, &mut out);
        let (w, k) = (WHITE, BLACK);
        assert_eq!(cell(&out, 0), &[w, w, k, k, k, k, w, w]);
    }

    #[test]
    fn rows_past_forty_and_sides_are_black() {
        let bus = RamBus::new();
        bus.write(COL80_FG, 0x07);
        bus.write(COL80_BG, 0x04);
        let vga = Vga80::new(800, font(), Platform::Atom);
        let mut out = vec![0xFF; 800];
        vga.render_line(&bus, 0, &mut out);
        assert!(out[..80].iter().all(|&p| p == BLACK));
        assert!(out[80..720].iter().all(|&p| p == RED));
        assert!(out[720..].iter().all(|&p| p == BLACK));
        vga.render_line(&bus, 480, &mut out);
        assert!(out.iter().all(|&p| p == BLACK));
    }

    #[test]
    fn reset_restores_power_on_registers() {
        let bus = ShadowBus::new(8);
        bus.write(COL80_BASE, 0x80);
        reset_registers(&bus);
        assert_eq!(
            [COL80_BASE, COL80_FG, COL80_BG, COL80_STAT].map(|a| bus.read(a)),
            [0x00, 0xB2, 0x00, 0x12]
        );
    }
}
