//! Block mosaics and 12-pixel cell expansion.

use emu_core::Pixel;

/// Scan lines blanked between separated blocks: the last line of each of
/// the three block rows and the first line of the two lower ones.
const SEPARATED_GAPS: u32 = 0b1000_0110_0000_0110_0001;

/// 12-bit patterns for a (left, right) block pair, indexed by
/// `left | right << 1`.
const SOLID: [u16; 4] = [0x000, 0xFC0, 0x03F, 0xFFF];
const SEPARATED: [u16; 4] = [0x000, 0x780, 0x01E, 0x79E];

/// One scan line of mosaic character `ch` (0x20–0x3F or 0x60–0x7F).
///
/// The six blocks map to bits 0–1 (top), 2–3 (middle) and 4, 6 (bottom).
/// Mosaics are never doubled: on the lower row of a double-height pair
/// (`second_half`) they are blank.
#[must_use]
pub fn mosaic_row(ch: u8, sub_row: usize, separated: bool, second_half: bool) -> u16 {
    if second_half || (separated && SEPARATED_GAPS & (1 << sub_row) != 0) {
        return 0;
    }
    let c = ch.wrapping_sub(0x20);
    let pair = match sub_row {
        0..=5 => c & 0x3,
        14..=19 => ((c >> 4) & 0x1) | ((c >> 5) & 0x2),
        _ => (c >> 2) & 0x3,
    };
    let table = if separated { &SEPARATED } else { &SOLID };
    table[usize::from(pair)]
}

/// Nibble to four 0/1 pixel bytes, most significant bit in the first byte.
const NIBBLE: [u32; 16] = {
    let mut table = [0; 16];
    let mut n = 0;
    while n < 16 {
        let mut k = 0;
        while k < 4 {
            if n & (8 >> k) != 0 {
                table[n] |= 1 << (8 * k);
            }
            k += 1;
        }
        n += 1;
    }
    table
};

/// Paint a 12-pixel row bitmap (bit 11 leftmost) into `out[..12]`.
///
/// Works four pixels at a time: each pixel byte is either `fg` or `bg`
/// selected by a 0/1 byte mask, with no carries between lanes.
pub fn paint_cell(bits: u16, fg: Pixel, bg: Pixel, out: &mut [Pixel]) {
    let (fg, bg) = (u32::from(fg), u32::from(bg));
    for (index, quad) in out[..12].chunks_exact_mut(4).enumerate() {
        let mask = NIBBLE[usize::from((bits >> (8 - 4 * index)) & 0xF)];
        let word = mask * fg + (mask ^ 0x0101_0101) * bg;
        quad.copy_from_slice(&word.to_le_bytes());
    }
}
