//! Motorola 6845 CRT Controller.
//!
//! Only the register file is modelled: the teletext renderer takes its
//! display start address and cursor from here, and the host programs it
//! through the usual two-port protocol (write a register number to the
//! address port, then a value to the data port).
//!
//! # Registers
//!
//! | Reg | Function | Width |
//! |-----|----------|-------|
//! | R0–R3 | Horizontal timing | 8 |
//! | R4–R7 | Vertical timing | 5–7 |
//! | R8 | Interlace mode | 8 |
//! | R9 | Max scan line | 5 |
//! | R10 | Cursor start (bits 4–0), blink mode (bits 6–5) | 7 |
//! | R11 | Cursor end | 5 |
//! | R12/R13 | Display start address hi/lo | 14 |
//! | R14/R15 | Cursor address hi/lo | 14 |
//! | R16/R17 | Light pen (read-only) | 14 |
//!
//! # Concurrency
//!
//! Registers are atomics: writes arrive from the bus event handler while
//! the render loop reads them. A 14-bit address may be seen half updated
//! for one line.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU8, Ordering};

use emu_core::{Observable, Value};

pub const REGISTER_COUNT: usize = 18;

/// Writable bits of each register.
const MASKS: [u8; REGISTER_COUNT] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0x1F, 0x7F, 0x7F, 0xFF, 0x1F, 0x7F, 0x1F, 0x3F, 0xFF, 0x3F, 0xFF,
    0x3F, 0xFF,
];

const R_CURSOR_START: usize = 10;
const R_CURSOR_END: usize = 11;
const R_START_HI: usize = 12;
const R_START_LO: usize = 13;
const R_CURSOR_HI: usize = 14;
const R_CURSOR_LO: usize = 15;
const R_LIGHT_PEN_HI: usize = 16;

/// Power-on values: a two-line cursor at the foot of a 20-line cell,
/// blinking at 1/32 field rate.
const RESET_VALUES: [(usize, u8); 2] = [(R_CURSOR_START, 0x72), (R_CURSOR_END, 0x13)];

/// Cursor display mode from R10 bits 6–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorBlink {
    Steady,
    Hidden,
    /// On for 8 fields of every 16.
    Fast,
    /// On for 16 fields of every 32.
    Slow,
}

/// 6845 register file.
pub struct Crtc6845 {
    address: AtomicU8,
    registers: [AtomicU8; REGISTER_COUNT],
}

impl Crtc6845 {
    #[must_use]
    pub fn new() -> Self {
        let crtc = Self {
            address: AtomicU8::new(0),
            registers: std::array::from_fn(|_| AtomicU8::new(0)),
        };
        crtc.reset();
        crtc
    }

    pub fn reset(&self) {
        self.address.store(0, Ordering::Relaxed);
        for register in &self.registers {
            register.store(0, Ordering::Relaxed);
        }
        for (index, value) in RESET_VALUES {
            self.registers[index].store(value, Ordering::Relaxed);
        }
    }

    /// Address port: select a register.
    pub fn write_address(&self, value: u8) {
        self.address.store(value & 0x1F, Ordering::Relaxed);
    }

    /// Data port: write the selected register. Unknown and read-only
    /// registers ignore the write.
    pub fn write_data(&self, value: u8) {
        let index = usize::from(self.address.load(Ordering::Relaxed));
        if index < R_LIGHT_PEN_HI {
            self.registers[index].store(value & MASKS[index], Ordering::Relaxed);
        }
    }

    /// Data port read: only the cursor and light pen registers are readable.
    #[must_use]
    pub fn read_data(&self) -> u8 {
        let index = usize::from(self.address.load(Ordering::Relaxed));
        if (R_CURSOR_HI..REGISTER_COUNT).contains(&index) {
            self.register(index)
        } else {
            0
        }
    }

    #[must_use]
    pub fn selected(&self) -> u8 {
        self.address.load(Ordering::Relaxed)
    }

    /// Raw register value; out-of-range indices read as 0.
    #[must_use]
    pub fn register(&self, index: usize) -> u8 {
        self.registers
            .get(index)
            .map_or(0, |register| register.load(Ordering::Relaxed))
    }

    fn pair(&self, hi: usize, lo: usize) -> u16 {
        (u16::from(self.register(hi)) << 8) | u16::from(self.register(lo))
    }

    /// 14-bit display start address (R12/R13).
    #[must_use]
    pub fn start_address(&self) -> u16 {
        self.pair(R_START_HI, R_START_LO)
    }

    /// 14-bit cursor address (R14/R15).
    #[must_use]
    pub fn cursor_address(&self) -> u16 {
        self.pair(R_CURSOR_HI, R_CURSOR_LO)
    }

    /// Scan lines of a character row covered by the cursor.
    #[must_use]
    pub fn cursor_raster(&self) -> RangeInclusive<u8> {
        (self.register(R_CURSOR_START) & 0x1F)..=self.register(R_CURSOR_END)
    }

    #[must_use]
    pub fn cursor_blink(&self) -> CursorBlink {
        match (self.register(R_CURSOR_START) >> 5) & 0x3 {
            0 => CursorBlink::Steady,
            1 => CursorBlink::Hidden,
            2 => CursorBlink::Fast,
            _ => CursorBlink::Slow,
        }
    }

    /// Whether the cursor is lit during field `frame`.
    #[must_use]
    pub fn cursor_on(&self, frame: u32) -> bool {
        match self.cursor_blink() {
            CursorBlink::Steady => true,
            CursorBlink::Hidden => false,
            CursorBlink::Fast => frame & 0x08 == 0,
            CursorBlink::Slow => frame & 0x10 == 0,
        }
    }
}

impl Default for Crtc6845 {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for Crtc6845 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "address" => Some(self.selected().into()),
            "start" => Some(self.start_address().into()),
            "cursor" => Some(self.cursor_address().into()),
            _ => {
                let index: usize = path.strip_prefix('r')?.parse().ok()?;
                (index < REGISTER_COUNT).then(|| self.register(index).into())
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["address", "start", "cursor", "r<n>"]
    }
}
