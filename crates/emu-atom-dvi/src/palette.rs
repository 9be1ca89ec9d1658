//! VGA80 colours.

use emu_core::Pixel;
use emu_core::pixel::{BLACK, BLUE, CYAN, GREEN, MAGENTA, RED, WHITE, YELLOW};

/// Three-bit colour index (bit 2 red, bit 1 green, bit 0 blue) to RGB332.
pub const VGA80_PALETTE: [Pixel; 8] = [BLACK, BLUE, GREEN, CYAN, RED, MAGENTA, YELLOW, WHITE];
