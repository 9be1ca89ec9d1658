//! SID voice: oscillator and waveform generation.
//!
//! 24-bit phase accumulator, four waveform generators combined by AND,
//! ring modulation, hard sync, and the test bit.

#![allow(clippy::cast_possible_truncation)]

/// Noise shift register power-on value.
const NOISE_SEED: u32 = 0x7F_FFFF;

const ACCUMULATOR_MASK: u32 = 0x00FF_FFFF;
const ACCUMULATOR_MSB: u32 = 0x0080_0000;

/// Control register bits.
const GATE: u8 = 0x01;
const SYNC: u8 = 0x02;
const RING: u8 = 0x04;
const TEST: u8 = 0x08;

/// One SID oscillator.
pub struct Voice {
    /// 24-bit phase accumulator.
    pub accumulator: u32,
    /// 16-bit frequency register.
    pub frequency: u16,
    /// 12-bit pulse width register.
    pub pulse_width: u16,
    /// Control register (waveform select in the high nibble).
    pub control: u8,
    /// 23-bit noise shift register.
    noise: u32,
    /// Accumulator bit 19 before the last step.
    noise_clock: bool,
}

impl Voice {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accumulator: 0,
            frequency: 0,
            pulse_width: 0,
            control: 0,
            noise: NOISE_SEED,
            noise_clock: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Write one of the four oscillator registers (`offset` 0–4 within the
    /// voice's seven-register block). Envelope registers are handled by the
    /// caller.
    pub fn write_register(&mut self, offset: u8, value: u8) {
        match offset {
            0 => self.frequency = (self.frequency & 0xFF00) | u16::from(value),
            1 => self.frequency = (self.frequency & 0x00FF) | (u16::from(value) << 8),
            2 => self.pulse_width = (self.pulse_width & 0x0F00) | u16::from(value),
            3 => self.pulse_width = (self.pulse_width & 0x00FF) | (u16::from(value & 0x0F) << 8),
            4 => self.control = value,
            _ => {}
        }
    }

    #[must_use]
    pub fn gate(&self) -> bool {
        self.control & GATE != 0
    }

    #[must_use]
    pub fn synced(&self) -> bool {
        self.control & SYNC != 0
    }

    /// Step the accumulator one cycle and clock the noise register on a
    /// rising edge of accumulator bit 19. The test bit holds both at reset.
    pub fn clock(&mut self) {
        if self.control & TEST != 0 {
            self.accumulator = 0;
            self.noise = NOISE_SEED;
            self.noise_clock = false;
            return;
        }

        self.accumulator = self.accumulator.wrapping_add(u32::from(self.frequency)) & ACCUMULATOR_MASK;

        let bit19 = self.accumulator & (1 << 19) != 0;
        if bit19 && !self.noise_clock {
            let feedback = ((self.noise >> 22) ^ (self.noise >> 17)) & 1;
            self.noise = ((self.noise << 1) | feedback) & 0x7F_FFFF;
        }
        self.noise_clock = bit19;
    }

    /// Reset the accumulator if the sync source's MSB just rose.
    pub fn apply_sync(&mut self, source_prev_msb: bool, source_msb: bool) {
        if source_msb && !source_prev_msb {
            self.accumulator = 0;
        }
    }

    /// 12-bit waveform output. Several selected waveforms are ANDed.
    ///
    /// `ring_source_msb` is the MSB of the ring modulation source voice.
    #[must_use]
    pub fn waveform_output(&self, ring_source_msb: bool) -> u16 {
        let select = self.control >> 4;
        if select == 0 {
            return 0;
        }

        let mut output = 0x0FFF;
        if select & 0x1 != 0 {
            output &= self.triangle(ring_source_msb);
        }
        if select & 0x2 != 0 {
            output &= self.sawtooth();
        }
        if select & 0x4 != 0 {
            output &= self.pulse();
        }
        if select & 0x8 != 0 {
            output &= self.noise();
        }
        output
    }

    fn triangle(&self, ring_source_msb: bool) -> u16 {
        let mut acc = self.accumulator;
        if self.control & RING != 0 && ring_source_msb {
            acc ^= ACCUMULATOR_MSB;
        }
        let folded = if acc & ACCUMULATOR_MSB != 0 {
            acc ^ 0x007F_FFFF
        } else {
            acc
        };
        ((folded >> 11) & 0x0FFF) as u16
    }

    fn sawtooth(&self) -> u16 {
        (self.accumulator >> 12) as u16
    }

    fn pulse(&self) -> u16 {
        if self.sawtooth() < self.pulse_width & 0x0FFF {
            0x0FFF
        } else {
            0
        }
    }

    /// Eight shift register taps land on output bits 11..4.
    fn noise(&self) -> u16 {
        const TAPS: [u32; 8] = [20, 18, 14, 11, 9, 5, 2, 0];
        TAPS.iter()
            .enumerate()
            .fold(0, |out, (i, &tap)| out | ((((self.noise >> tap) & 1) as u16) << (11 - i)))
    }

    /// Accumulator bit 23.
    #[must_use]
    pub fn msb(&self) -> bool {
        self.accumulator & ACCUMULATOR_MSB != 0
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}
