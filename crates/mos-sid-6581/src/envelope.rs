//! SID ADSR envelope generator.
//!
//! A rate counter divides the bus clock by the selected period; each
//! overflow moves the level one step. Decay and release are further divided
//! by an exponential counter whose period grows as the level falls.

#![allow(clippy::cast_possible_truncation)]

/// Rate counter periods in bus cycles, shared by all three phases.
/// Index 0 = 2 ms full attack, index 15 = 8 s.
const RATE_PERIODS: [u16; 16] = [
    9, 32, 63, 95, 149, 220, 267, 313, 392, 977, 1954, 3126, 3907, 11_720, 19_532, 31_251,
];

/// Level thresholds below which the exponential period doubles.
const EXP_STEPS: [(u8, u8); 5] = [(0x5D, 1), (0x36, 2), (0x1A, 4), (0x0E, 8), (0x06, 16)];

/// Envelope phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR envelope generator for one voice.
pub struct Envelope {
    /// Output level (0–255).
    pub level: u8,
    pub phase: Phase,
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    rate_counter: u16,
    exp_counter: u8,
    exp_period: u8,
    prev_gate: bool,
}

impl Envelope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: 0,
            phase: Phase::Release,
            attack: 0,
            decay: 0,
            sustain: 0,
            release: 0,
            rate_counter: 0,
            exp_counter: 0,
            exp_period: 1,
            prev_gate: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Attack/decay register: attack in the high nibble.
    pub fn set_attack_decay(&mut self, value: u8) {
        self.attack = value >> 4;
        self.decay = value & 0x0F;
    }

    /// Sustain/release register: sustain in the high nibble.
    pub fn set_sustain_release(&mut self, value: u8) {
        self.sustain = value >> 4;
        self.release = value & 0x0F;
    }

    fn sustain_level(&self) -> u8 {
        self.sustain * 0x11
    }

    /// Clock once per bus cycle with the voice's current gate bit.
    pub fn clock(&mut self, gate: bool) {
        if gate && !self.prev_gate {
            self.phase = Phase::Attack;
            self.rate_counter = 0;
            self.exp_counter = 0;
        } else if !gate && self.prev_gate {
            self.phase = Phase::Release;
        }
        self.prev_gate = gate;

        let period = match self.phase {
            Phase::Attack => RATE_PERIODS[usize::from(self.attack)],
            Phase::Decay => RATE_PERIODS[usize::from(self.decay)],
            Phase::Release => RATE_PERIODS[usize::from(self.release)],
            Phase::Sustain => return,
        };

        self.rate_counter += 1;
        if self.rate_counter < period {
            return;
        }
        self.rate_counter = 0;

        if self.phase == Phase::Attack {
            self.level = self.level.saturating_add(1);
            if self.level == 0xFF {
                self.phase = Phase::Decay;
            }
            self.update_exp_period();
            return;
        }

        self.exp_counter += 1;
        if self.exp_counter < self.exp_period {
            return;
        }
        self.exp_counter = 0;

        let floor = if self.phase == Phase::Decay {
            self.sustain_level()
        } else {
            0
        };
        if self.level > floor {
            self.level -= 1;
            self.update_exp_period();
        }
        if self.phase == Phase::Decay && self.level <= floor {
            self.level = floor;
            self.phase = Phase::Sustain;
        }
    }

    fn update_exp_period(&mut self) {
        self.exp_period = EXP_STEPS
            .iter()
            .find(|&&(threshold, _)| self.level >= threshold)
            .map_or(30, |&(_, period)| period);
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_settles_on_sustain_level() {
        let mut env = Envelope::new();
        env.set_attack_decay(0x00);
        env.set_sustain_release(0x80);
        for _ in 0..200_000 {
            env.clock(true);
        }
        assert_eq!(env.phase, Phase::Sustain);
        assert_eq!(env.level, 0x88);
    }

    #[test]
    fn exponential_period_lengthens_at_low_levels() {
        let mut env = Envelope::new();
        env.level = 0x05;
        env.update_exp_period();
        assert_eq!(env.exp_period, 30);
        env.level = 0x60;
        env.update_exp_period();
        assert_eq!(env.exp_period, 1);
    }
}
