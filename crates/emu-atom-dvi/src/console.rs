//! Text output from the board itself, such as the power-on banner.

use shadow_bus::ShadowBus;

use crate::map::{COL80_BASE, COL80_ON, FB_ADDR, FB_LEN};

/// A cursor over video RAM that writes ASCII in the current display's
/// character set.
#[derive(Debug, Default)]
pub struct Console {
    row: usize,
    col: usize,
}

impl Console {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Write one character. Form feed (0x0C) clears the screen, `\n` starts a new line.
    pub fn putc(&mut self, bus: &ShadowBus, c: u8) {
        let wide = bus.read(COL80_BASE) & COL80_ON != 0;
        let (columns, rows) = if wide { (80, 25) } else { (32, 16) };
        match c {
            b'\n' => self.new_line(rows),
            0x0C => {
                bus.fill(FB_ADDR, FB_LEN, 0x20);
                self.row = 0;
                self.col = 0;
            }
            _ => {
                let code = if wide { ascii_to_vga80(c) } else { ascii_to_atom(c) };
                bus.write(FB_ADDR + (self.row * columns + self.col) as u16, code);
                self.col += 1;
                if self.col == columns {
                    self.new_line(rows);
                }
            }
        }
    }

    pub fn print(&mut self, bus: &ShadowBus, text: &str) {
        for c in text.bytes() {
            self.putc(bus, c);
        }
    }

    fn new_line(&mut self, rows: usize) {
        self.col = 0;
        self.row = (self.row + 1) % rows;
    }
}

/// ASCII to the VDG's internal code, non-inverted.
#[must_use]
pub fn ascii_to_atom(c: u8) -> u8 {
    let code = c.wrapping_add(0x20);
    if code < 0x80 { code ^ 0x60 } else { code }
}

/// ASCII to the VGA80 font, which keeps uppercase and symbols in place.
#[must_use]
pub fn ascii_to_vga80(c: u8) -> u8 {
    match c {
        0x60..=0x7F => c - 0x20,
        0x40..=0x5F => c - 0x40,
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_codes_match_vdg_character_set() {
        assert_eq!(ascii_to_atom(b'A'), 0x01);
        assert_eq!(ascii_to_atom(b'@'), 0x00);
        assert_eq!(ascii_to_atom(b' '), 0x20);
        assert_eq!(ascii_to_atom(b'0'), 0x30);
    }

    #[test]
    fn banner_lands_at_top_left() {
        let bus = ShadowBus::new(8);
        let mut console = Console::new();
        console.print(&bus, "\x0CACORN ATOM");
        assert_eq!(bus.read(FB_ADDR), 0x01);
        assert_eq!(bus.read(FB_ADDR + 5), 0x20);
        assert_eq!(bus.read(FB_ADDR + 0x1FFF), 0x20);
        assert_eq!(console.position(), (0, 10));
    }

    #[test]
    fn newline_and_wrap_follow_vdg_geometry() {
        let bus = ShadowBus::new(8);
        let mut console = Console::new();
        console.print(&bus, "A\nB");
        assert_eq!(bus.read(FB_ADDR + 32), 0x02);
        for _ in 0..32 {
            console.putc(&bus, b'C');
        }
        assert_eq!(console.position(), (2, 1));
    }

    #[test]
    fn wide_mode_uses_eighty_columns() {
        let bus = ShadowBus::new(8);
        bus.write(COL80_BASE, COL80_ON);
        let mut console = Console::new();
        console.print(&bus, "\na");
        assert_eq!(bus.read(FB_ADDR + 80), 0x41);
    }
}
