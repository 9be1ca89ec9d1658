//! SID state-variable multi-mode filter.
//!
//! Two-integrator-loop filter with simultaneous low-pass, band-pass and
//! high-pass outputs, summed according to the mode bits of register $18.
//!
//! The 6581 cutoff curve is non-linear with a floor around 200 Hz; the 8580
//! is close to linear over a wider range and resonates less.

#![allow(clippy::cast_precision_loss)]

use crate::SidModel;

/// State-variable filter.
pub struct Filter {
    lp: f32,
    bp: f32,
    hp: f32,

    /// 11-bit cutoff frequency register.
    pub cutoff: u16,
    /// 4-bit resonance.
    pub resonance: u8,
    /// Mode bits from $18: bit 4 LP, bit 5 BP, bit 6 HP.
    pub mode: u8,
    /// Voices routed through the filter (bits 0–2 of $17).
    pub routing: u8,
    /// External input routed through the filter (bit 3 of $17).
    pub ext_in: bool,

    model: SidModel,
}

impl Filter {
    #[must_use]
    pub fn new(model: SidModel) -> Self {
        Self {
            lp: 0.0,
            bp: 0.0,
            hp: 0.0,
            cutoff: 0,
            resonance: 0,
            mode: 0,
            routing: 0,
            ext_in: false,
            model,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.model);
    }

    /// Cutoff low register: bits 0–2 only.
    pub fn set_cutoff_low(&mut self, value: u8) {
        self.cutoff = (self.cutoff & 0x7F8) | u16::from(value & 0x07);
    }

    /// Cutoff high register: bits 3–10.
    pub fn set_cutoff_high(&mut self, value: u8) {
        self.cutoff = (self.cutoff & 0x007) | (u16::from(value) << 3);
    }

    /// Resonance/routing register $17.
    pub fn set_resonance_routing(&mut self, value: u8) {
        self.resonance = value >> 4;
        self.routing = value & 0x07;
        self.ext_in = value & 0x08 != 0;
    }

    /// Run one cycle and return the sum of the enabled outputs.
    pub fn clock(&mut self, input: f32) -> f32 {
        let fc = self.cutoff_coefficient();
        let res = self.resonance_coefficient();

        self.hp = input - self.lp - res * self.bp;
        self.bp += fc * self.hp;
        self.lp += fc * self.bp;

        let mut output = 0.0;
        if self.mode & 0x10 != 0 {
            output += self.lp;
        }
        if self.mode & 0x20 != 0 {
            output += self.bp;
        }
        if self.mode & 0x40 != 0 {
            output += self.hp;
        }
        output
    }

    fn cutoff_coefficient(&self) -> f32 {
        let x = f32::from(self.cutoff) / 2047.0;
        match self.model {
            // Quadratic fit to reSID's 6581 curve.
            SidModel::Mos6581 => (0.003 + 0.02 * x + 0.33 * x * x).clamp(0.002, 0.36),
            SidModel::Mos8580 => 0.001 + x * 0.549,
        }
    }

    fn resonance_coefficient(&self) -> f32 {
        let r = f32::from(self.resonance);
        match self.model {
            SidModel::Mos6581 => 0.7 + r / 15.0,
            SidModel::Mos8580 => 0.7 + r * (0.7 / 15.0),
        }
    }

    /// Whether voice `voice` (0–2) is routed through the filter.
    #[must_use]
    pub fn voice_routed(&self, voice: usize) -> bool {
        self.routing & (1 << voice) != 0
    }
}
