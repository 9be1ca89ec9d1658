//! Per-line choice between the VDG, VGA80 and teletext renderers.

use std::sync::Arc;

use emu_core::pixel::BLACK;
use emu_core::{Bus, Observable, Pixel, Value};
use motorola_6845::Crtc6845;
use motorola_6847::{IntExt, Vdg, VdgControl, VdgMode, VdgSettings};
use mullard_saa5050::{Teletext, TeletextControl};

use crate::config::{DisplayTiming, FontSet, Platform};
use crate::map::{
    ATOM_PIA_A, ATOM_PIA_C, COL80_BASE, COL80_ON, DRAGON_PIA_B, FB_ADDR, TELETEXT_ENABLE,
    TELETEXT_PAGE, TELETEXT_REG_FLAGS,
};
use crate::vga80::Vga80;

/// What a display line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    /// VDG top or bottom border.
    BorderOnly,
    AlphaSemigraphics,
    PackedGraphics { class: u8 },
    Attributed80Column,
    Teletext,
}

impl VideoMode {
    fn name(self) -> &'static str {
        match self {
            Self::BorderOnly => "border",
            Self::AlphaSemigraphics => "alpha",
            Self::PackedGraphics { .. } => "graphics",
            Self::Attributed80Column => "vga80",
            Self::Teletext => "teletext",
        }
    }
}

/// Read the VDG control inputs from the host's PIA.
#[must_use]
pub fn vdg_control<B: Bus + ?Sized>(platform: Platform, bus: &B) -> VdgControl {
    match platform {
        Platform::Atom => VdgControl {
            mode: bus.read(ATOM_PIA_A) >> 4,
            css: bus.read(ATOM_PIA_C) & 0x08 != 0,
            int_ext: IntExt::FollowsAs,
            base: FB_ADDR,
        },
        Platform::Dragon => {
            let pia = bus.read(DRAGON_PIA_B);
            VdgControl {
                mode: ((pia & 0x80) >> 7) | ((pia & 0x70) >> 3),
                css: pia & 0x08 != 0,
                int_ext: IntExt::Level(pia & 0x10 != 0),
                base: FB_ADDR,
            }
        }
    }
}

/// All three renderers and the state that picks between them.
pub struct VideoPipeline {
    platform: Platform,
    vdg: Vdg,
    vga80: Vga80,
    teletext: Option<Teletext>,
    crtc: Arc<Crtc6845>,
    last_mode: VideoMode,
}

impl VideoPipeline {
    #[must_use]
    pub fn new(
        platform: Platform,
        timing: DisplayTiming,
        fonts: FontSet,
        settings: VdgSettings,
        teletext: bool,
        crtc: Arc<Crtc6845>,
    ) -> Self {
        let FontSet {
            vdg,
            vga80,
            teletext: teletext_font,
        } = fonts;
        let mut vdg = Vdg::new(timing.h_active, timing.v_active, vdg);
        vdg.settings = settings;
        Self {
            platform,
            vdg,
            vga80: Vga80::new(timing.h_active, vga80, platform),
            teletext: teletext
                .then(|| Teletext::new(timing.h_active, timing.v_active, &teletext_font)),
            crtc,
            last_mode: VideoMode::BorderOnly,
        }
    }

    #[must_use]
    pub fn vdg(&self) -> &Vdg {
        &self.vdg
    }

    /// Which renderer draws `line` given the current registers.
    #[must_use]
    pub fn select<B: Bus + ?Sized>(&self, bus: &B, line: usize, control: &VdgControl) -> VideoMode {
        if bus.read(COL80_BASE) & COL80_ON != 0 {
            return VideoMode::Attributed80Column;
        }
        if self.teletext.is_some() && bus.read(TELETEXT_REG_FLAGS) & TELETEXT_ENABLE != 0 {
            return VideoMode::Teletext;
        }
        match self.vdg.line_mode(line, control.mode) {
            None => VideoMode::BorderOnly,
            Some(VdgMode::AlphaSemigraphics) => VideoMode::AlphaSemigraphics,
            Some(VdgMode::PackedGraphics { class }) => VideoMode::PackedGraphics { class },
        }
    }

    /// Render display line `line` into `out` and report what it showed.
    pub fn render_line<B: Bus + ?Sized>(&mut self, bus: &B, line: usize, out: &mut [Pixel]) -> VideoMode {
        let control = vdg_control(self.platform, bus);
        let mode = self.select(bus, line, &control);
        match mode {
            VideoMode::BorderOnly => self.vdg.draw_border_line(control.mode, out),
            VideoMode::AlphaSemigraphics => self.vdg.draw_text_line(bus, line, &control, out),
            VideoMode::PackedGraphics { class } => {
                self.vdg.draw_graphics_line(bus, line, class, &control, out);
            }
            VideoMode::Attributed80Column => self.vga80.render_line(bus, line, out),
            VideoMode::Teletext => match &mut self.teletext {
                Some(teletext) => {
                    let flags = TeletextControl::from_flags(TELETEXT_PAGE, bus.read(TELETEXT_REG_FLAGS));
                    teletext.render_line(bus, &self.crtc, line, &flags, out);
                }
                None => out.fill(BLACK),
            },
        }
        self.last_mode = mode;
        mode
    }
}

impl Observable for VideoPipeline {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("vdg.") {
            return self.vdg.query(rest);
        }
        if let Some(rest) = path.strip_prefix("teletext.") {
            return self.teletext.as_ref()?.query(rest);
        }
        match path {
            "mode" => Some(self.last_mode.name().into()),
            "teletext_fitted" => Some(self.teletext.is_some().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["mode", "teletext_fitted", "vdg.<path>", "teletext.<path>"]
    }
}
