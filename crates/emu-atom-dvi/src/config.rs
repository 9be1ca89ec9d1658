//! Board configuration.

use emu_core::Font;
use mos_sid_6581::SidModel;
use motorola_6847::{Artifact, Lowercase};

/// Host machine whose PIA drives the VDG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Atom,
    Dragon,
}

/// Active area of the DVI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTiming {
    pub h_active: usize,
    pub v_active: usize,
}

impl DisplayTiming {
    pub const VGA_640X480: Self = Self::new(640, 480);
    pub const PAL_720X576: Self = Self::new(720, 576);
    pub const SVGA_800X600: Self = Self::new(800, 600);

    #[must_use]
    pub const fn new(h_active: usize, v_active: usize) -> Self {
        Self { h_active, v_active }
    }
}

impl Default for DisplayTiming {
    fn default() -> Self {
        Self::VGA_640X480
    }
}

/// Glyph tables for the three character generators.
pub struct FontSet {
    /// VDG characters: 64 glyphs, or 128 with a lowercase bank.
    pub vdg: Font,
    /// VGA80 characters: 128 glyphs.
    pub vga80: Font,
    /// SAA5050 source characters 0x20–0x7F: 96 glyphs.
    pub teletext: Font,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            vdg: Font::blank(128),
            vga80: Font::blank(128),
            teletext: Font::blank(96),
        }
    }
}

/// Configuration for creating an [`AtomDvi`](crate::AtomDvi).
pub struct AtomDviConfig {
    pub platform: Platform,
    pub timing: DisplayTiming,
    /// Let the host read back video RAM from the board.
    pub vdu_ram_enabled: bool,
    /// Print the power-on banner, for hosts whose reset the board drives.
    pub emulate_reset: bool,
    /// Line buffers in the render pool (2–4).
    pub line_pool_size: usize,
    /// Event ring capacity (power of two).
    pub event_capacity: usize,
    /// Pending SID commands between the event handler and the audio tick.
    pub audio_fifo_capacity: usize,
    pub sid_model: SidModel,
    pub bus_clock_hz: u64,
    pub sample_rate: u64,
    pub artifact: Artifact,
    pub lowercase: Option<Lowercase>,
    /// Claim the CRTC and flags registers and allow teletext pages.
    pub teletext_enabled: bool,
    pub fonts: FontSet,
}

impl Default for AtomDviConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Atom,
            timing: DisplayTiming::default(),
            vdu_ram_enabled: true,
            emulate_reset: false,
            line_pool_size: 2,
            event_capacity: shadow_bus::DEFAULT_EVENT_CAPACITY,
            audio_fifo_capacity: 32,
            sid_model: SidModel::Mos8580,
            bus_clock_hz: 1_000_000,
            sample_rate: 50_000,
            artifact: Artifact::Off,
            lowercase: None,
            teletext_enabled: true,
            fonts: FontSet::default(),
        }
    }
}

impl AtomDviConfig {
    /// # Panics
    ///
    /// Panics on a configuration the board cannot run.
    pub fn validate(&self) {
        let pool = self.line_pool_size;
        assert!(
            (2..=4).contains(&pool),
            "line pool size {pool} is outside 2..=4"
        );
        assert!(
            self.timing.v_active % pool == 0,
            "frame height {} is not a multiple of the line pool size {pool}",
            self.timing.v_active
        );
        assert!(
            self.audio_fifo_capacity > 0,
            "audio FIFO needs at least one slot"
        );
        assert!(
            self.sample_rate > 0 && self.sample_rate <= self.bus_clock_hz,
            "sample rate {} Hz is not reachable from a {} Hz bus clock",
            self.sample_rate,
            self.bus_clock_hz
        );
        assert!(
            self.fonts.vga80.glyph_count() >= 128,
            "VGA80 font has {} glyphs, needs 128",
            self.fonts.vga80.glyph_count()
        );
        assert!(
            self.fonts.teletext.glyph_count() >= 96,
            "teletext font has {} glyphs, needs 96",
            self.fonts.teletext.glyph_count()
        );
        let vdg_needed = if self.lowercase.is_some() { 128 } else { 64 };
        assert!(
            self.fonts.vdg.glyph_count() >= vdg_needed,
            "VDG font has {} glyphs, needs {vdg_needed}",
            self.fonts.vdg.glyph_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AtomDviConfig::default().validate();
    }

    #[test]
    #[should_panic(expected = "outside 2..=4")]
    fn pool_of_five_rejected() {
        let config = AtomDviConfig {
            line_pool_size: 5,
            ..AtomDviConfig::default()
        };
        config.validate();
    }

    #[test]
    #[should_panic(expected = "not a multiple")]
    fn frame_height_must_divide_by_pool() {
        let config = AtomDviConfig {
            timing: DisplayTiming::new(640, 482),
            line_pool_size: 4,
            ..AtomDviConfig::default()
        };
        config.validate();
    }

    #[test]
    #[should_panic(expected = "needs 128")]
    fn lowercase_needs_second_bank() {
        let config = AtomDviConfig {
            lowercase: Some(Lowercase {
                first: 0x80,
                last: 0x9F,
                inverted: false,
            }),
            fonts: FontSet {
                vdg: Font::blank(64),
                ..FontSet::default()
            },
            ..AtomDviConfig::default()
        };
        config.validate();
    }
}
