//! VDG colour sets.

use emu_core::Pixel;
use emu_core::pixel::{BLACK, BLUE, CYAN, GREEN, MAGENTA, ORANGE, RED, WHITE, YELLOW};

/// The nine VDG colours in CSS order: the first four are colour set 0,
/// the next four colour set 1 (selected by the CSS pin), then black.
pub const VDG_PALETTE: [Pixel; 9] = [GREEN, YELLOW, BLUE, RED, WHITE, CYAN, MAGENTA, ORANGE, BLACK];

/// Artifact colours seen on NTSC sets in the 256-pixel mono mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Artifact {
    #[default]
    Off,
    BlueOrange,
    OrangeBlue,
}

impl Artifact {
    /// Colours for each 2-bit pixel pair, or `None` when artifacting is off.
    #[must_use]
    pub fn palette(self) -> Option<[Pixel; 4]> {
        match self {
            Self::Off => None,
            Self::BlueOrange => Some([BLACK, BLUE, ORANGE, WHITE]),
            Self::OrangeBlue => Some([BLACK, ORANGE, BLUE, WHITE]),
        }
    }
}
