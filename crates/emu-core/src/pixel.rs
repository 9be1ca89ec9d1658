//! RGB332 output pixels.
//!
//! The DVI line buffers carry one byte per pixel: red in bits 7–5, green in
//! bits 4–2, blue in bits 1–0.

/// One RGB332 pixel.
pub type Pixel = u8;

pub const BLACK: Pixel = 0x00;

pub const RED: Pixel = 0xE0;
pub const GREEN: Pixel = 0x1C;
pub const BLUE: Pixel = 0x03;

/// Dim channel intensities.
pub const RED_1: Pixel = 0x60;
pub const GREEN_2: Pixel = 0x14;
pub const GREEN_1: Pixel = 0x0C;
pub const BLUE_1: Pixel = 0x01;

pub const YELLOW: Pixel = RED | GREEN;
pub const MAGENTA: Pixel = RED | BLUE;
pub const CYAN: Pixel = GREEN | BLUE;
pub const WHITE: Pixel = RED | GREEN | BLUE;
pub const ORANGE: Pixel = RED | GREEN_2;
pub const DIM_WHITE: Pixel = RED_1 | GREEN_1 | BLUE_1;
