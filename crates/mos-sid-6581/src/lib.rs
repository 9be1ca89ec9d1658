//! MOS 6581/8580 SID (Sound Interface Device).
//!
//! Three voices, each with a 24-bit phase-accumulator oscillator, four
//! waveform generators and an ADSR envelope, mixed through a shared
//! state-variable filter. The chip is stepped in bus cycles through
//! [`Tickable`]; [`Sid::output`] holds the mix after the most recent cycle,
//! so a host sampling every N cycles decimates by taking the last value.
//!
//! # Register map (29 registers)
//!
//! | Offset | Register          |
//! |--------|-------------------|
//! | $00    | Voice 1 freq lo   |
//! | $01    | Voice 1 freq hi   |
//! | $02    | Voice 1 PW lo     |
//! | $03    | Voice 1 PW hi     |
//! | $04    | Voice 1 control   |
//! | $05    | Voice 1 AD        |
//! | $06    | Voice 1 SR        |
//! | $07–$0D | Voice 2 (same layout) |
//! | $0E–$14 | Voice 3 (same layout) |
//! | $15    | Filter cutoff lo  |
//! | $16    | Filter cutoff hi  |
//! | $17    | Filter routing + resonance |
//! | $18    | Volume + filter mode |
//! | $19    | Paddle X (read-only) |
//! | $1A    | Paddle Y (read-only) |
//! | $1B    | OSC3 output (read-only) |
//! | $1C    | ENV3 output (read-only) |

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod envelope;
mod filter;
mod voice;

use emu_core::{Observable, Tickable, Value};

pub use envelope::{Envelope, Phase};
pub use filter::Filter;
pub use voice::Voice;

/// Number of registers, including the read-only ones.
pub const REGISTER_COUNT: u8 = 29;
/// Registers below this offset are write-only.
pub const WRITABLE_REGISTERS: u8 = 25;
/// OSC3 read-back register.
pub const REG_OSC3: u8 = 0x1B;
/// ENV3 read-back register.
pub const REG_ENV3: u8 = 0x1C;

/// Chip revision. Selects the filter curve and resonance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidModel {
    #[default]
    Mos6581,
    Mos8580,
}

/// SID chip.
pub struct Sid {
    pub voices: [Voice; 3],
    pub envelopes: [Envelope; 3],
    pub filter: Filter,
    /// 4-bit master volume.
    pub volume: u8,
    /// Voice 3 excluded from the mix (bit 7 of $18). Its oscillator and
    /// envelope keep running for OSC3/ENV3.
    pub voice3_off: bool,
    model: SidModel,
    output: i16,
    cycles: u64,
}

impl Sid {
    #[must_use]
    pub fn new(model: SidModel) -> Self {
        Self {
            voices: [Voice::new(), Voice::new(), Voice::new()],
            envelopes: [Envelope::new(), Envelope::new(), Envelope::new()],
            filter: Filter::new(model),
            volume: 0,
            voice3_off: false,
            model,
            output: 0,
            cycles: 0,
        }
    }

    #[must_use]
    pub fn model(&self) -> SidModel {
        self.model
    }

    /// Power-on state: all oscillators, envelopes and filter cleared.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        for envelope in &mut self.envelopes {
            envelope.reset();
        }
        self.filter.reset();
        self.volume = 0;
        self.voice3_off = false;
        self.output = 0;
    }

    /// Read a register. Only OSC3 and ENV3 return data.
    #[must_use]
    pub fn read(&self, reg: u8) -> u8 {
        match reg & 0x1F {
            REG_OSC3 => (self.voices[2].waveform_output(self.voices[1].msb()) >> 4) as u8,
            REG_ENV3 => self.envelopes[2].level,
            _ => 0,
        }
    }

    /// Write a register. Read-only offsets are ignored.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x1F {
            reg @ 0x00..=0x14 => {
                let index = usize::from(reg / 7);
                match reg % 7 {
                    5 => self.envelopes[index].set_attack_decay(value),
                    6 => self.envelopes[index].set_sustain_release(value),
                    offset => self.voices[index].write_register(offset, value),
                }
            }
            0x15 => self.filter.set_cutoff_low(value),
            0x16 => self.filter.set_cutoff_high(value),
            0x17 => self.filter.set_resonance_routing(value),
            0x18 => {
                self.volume = value & 0x0F;
                self.filter.mode = value & 0x70;
                self.voice3_off = value & 0x80 != 0;
            }
            _ => {}
        }
    }

    /// Mixed output after the most recent cycle, full-scale signed 16-bit.
    #[must_use]
    pub fn output(&self) -> i16 {
        self.output
    }

    /// Cycles run since construction.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Tickable for Sid {
    /// One bus cycle: oscillators, sync, envelopes, filter and mix.
    fn tick(&mut self) {
        let prev_msb = [
            self.voices[0].msb(),
            self.voices[1].msb(),
            self.voices[2].msb(),
        ];

        for voice in &mut self.voices {
            voice.clock();
        }

        // Voice n is synced and ring-modulated by voice n-1 (mod 3).
        for i in 0..3 {
            let source = (i + 2) % 3;
            if self.voices[i].synced() {
                let source_msb = self.voices[source].msb();
                self.voices[i].apply_sync(prev_msb[source], source_msb);
            }
        }

        for (envelope, voice) in self.envelopes.iter_mut().zip(&self.voices) {
            envelope.clock(voice.gate());
        }

        let mut filtered = 0.0;
        let mut direct = 0.0;
        for i in 0..3 {
            if i == 2 && self.voice3_off {
                continue;
            }
            let ring_msb = self.voices[(i + 2) % 3].msb();
            let waveform = self.voices[i].waveform_output(ring_msb);
            let centred = f32::from(waveform.cast_signed() - 2048);
            let amplitude = centred * f32::from(self.envelopes[i].level) / 255.0;
            if self.filter.voice_routed(i) {
                filtered += amplitude;
            } else {
                direct += amplitude;
            }
        }

        let mixed = (self.filter.clock(filtered) + direct) * f32::from(self.volume) / 15.0;
        // Three voices at full amplitude span ±6144.
        let normalised = (mixed / 6144.0).clamp(-1.0, 1.0);
        self.output = (normalised * f32::from(i16::MAX)) as i16;
        self.cycles += 1;
    }
}

impl Observable for Sid {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "volume" => Some(self.volume.into()),
            "output" => Some(Value::U16(self.output.cast_unsigned())),
            "cycles" => Some(self.cycles.into()),
            "osc3" => Some(self.read(REG_OSC3).into()),
            "env3" => Some(self.read(REG_ENV3).into()),
            "filter.cutoff" => Some(self.filter.cutoff.into()),
            "filter.mode" => Some(self.filter.mode.into()),
            _ => {
                let rest = path.strip_prefix("voice")?;
                let (index, field) = rest.split_once('.')?;
                let index: usize = index.parse().ok()?;
                let voice = self.voices.get(index)?;
                let envelope = &self.envelopes[index];
                match field {
                    "frequency" => Some(voice.frequency.into()),
                    "pulse_width" => Some(voice.pulse_width.into()),
                    "control" => Some(voice.control.into()),
                    "envelope" => Some(envelope.level.into()),
                    _ => None,
                }
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "volume",
            "output",
            "cycles",
            "osc3",
            "env3",
            "filter.cutoff",
            "filter.mode",
            "voice<n>.frequency",
            "voice<n>.pulse_width",
            "voice<n>.control",
            "voice<n>.envelope",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::Ticks;

    /// Run `cycles` cycles, sampling every 20 (50 kHz at 1 MHz).
    fn run_sampled(sid: &mut Sid, cycles: u32) -> Vec<i16> {
        let mut samples = Vec::new();
        for _ in 0..cycles / 20 {
            sid.tick_n(Ticks::new(20));
            samples.push(sid.output());
        }
        samples
    }

    #[test]
    fn silent_when_no_voices_active() {
        let mut sid = Sid::new(SidModel::Mos8580);
        let samples = run_sampled(&mut sid, 20_000);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn sawtooth_swings_both_ways() {
        let mut sid = Sid::new(SidModel::Mos8580);
        // ~440 Hz at 1 MHz: 440 * 2^24 / 1e6 ≈ 7382
        let freq: u16 = 7382;
        sid.write(0x00, (freq & 0xFF) as u8);
        sid.write(0x01, (freq >> 8) as u8);
        sid.write(0x05, 0x00);
        sid.write(0x06, 0xF0);
        sid.write(0x04, 0x21);
        sid.write(0x18, 0x0F);

        let samples = run_sampled(&mut sid, 40_000);
        assert!(samples.iter().any(|&s| s > 300));
        assert!(samples.iter().any(|&s| s < -300));
    }

    #[test]
    fn voice_registers_decode_by_block() {
        let mut sid = Sid::new(SidModel::Mos6581);
        sid.write(0x07, 0x34);
        sid.write(0x08, 0x12);
        sid.write(0x13, 0xA5);
        sid.write(0x14, 0x3C);
        assert_eq!(sid.voices[1].frequency, 0x1234);
        assert_eq!(sid.envelopes[2].attack, 0xA);
        assert_eq!(sid.envelopes[2].decay, 0x5);
        assert_eq!(sid.envelopes[2].sustain, 0x3);
        assert_eq!(sid.envelopes[2].release, 0xC);
    }

    #[test]
    fn attack_reaches_max_then_sustains() {
        let mut sid = Sid::new(SidModel::Mos6581);
        sid.write(0x05, 0x00);
        sid.write(0x06, 0xF0);
        sid.write(0x04, 0x01);
        sid.tick_n(Ticks::new(3000));
        assert_eq!(sid.envelopes[0].level, 0xFF);
        assert_eq!(sid.envelopes[0].phase, Phase::Sustain);
    }

    #[test]
    fn release_decays_to_zero() {
        let mut sid = Sid::new(SidModel::Mos6581);
        sid.write(0x05, 0x00);
        sid.write(0x06, 0xF0);
        sid.write(0x04, 0x01);
        sid.tick_n(Ticks::new(3000));
        sid.write(0x04, 0x00);
        sid.tick_n(Ticks::new(50_000));
        assert_eq!(sid.envelopes[0].level, 0);
    }

    #[test]
    fn osc3_and_env3_read_back() {
        let mut sid = Sid::new(SidModel::Mos8580);
        sid.write(0x0E, 0xFF);
        sid.write(0x0F, 0xFF);
        sid.write(0x13, 0x00);
        sid.write(0x14, 0xF0);
        sid.write(0x12, 0x21);
        sid.tick_n(Ticks::new(3000));
        assert!(sid.read(REG_OSC3) > 0);
        assert_eq!(sid.read(REG_ENV3), 0xFF);
        assert_eq!(sid.read(0x00), 0, "write-only registers read as zero");
    }

    #[test]
    fn reset_silences_a_playing_voice() {
        let mut sid = Sid::new(SidModel::Mos8580);
        sid.write(0x01, 0x20);
        sid.write(0x06, 0xF0);
        sid.write(0x04, 0x21);
        sid.write(0x18, 0x0F);
        sid.tick_n(Ticks::new(5000));
        assert!(sid.envelopes[0].level > 0);

        sid.reset();
        sid.tick_n(Ticks::new(100));
        assert_eq!(sid.envelopes[0].level, 0);
        assert_eq!(sid.output(), 0);
        assert_eq!(sid.model(), SidModel::Mos8580);
    }

    #[test]
    fn filter_attenuates_routed_voice() {
        let rms = |filtered: bool| -> f32 {
            let mut sid = Sid::new(SidModel::Mos6581);
            sid.write(0x00, 0xFF);
            sid.write(0x01, 0xFF);
            sid.write(0x05, 0x00);
            sid.write(0x06, 0xF0);
            sid.write(0x04, 0x21);
            if filtered {
                sid.write(0x15, 0x00);
                sid.write(0x16, 0x00);
                sid.write(0x17, 0x01);
                sid.write(0x18, 0x1F);
            } else {
                sid.write(0x18, 0x0F);
            }
            let samples = run_sampled(&mut sid, 60_000);
            let settled = &samples[200..];
            let sum: f32 = settled.iter().map(|&s| f32::from(s) * f32::from(s)).sum();
            (sum / settled.len() as f32).sqrt()
        };

        let direct = rms(false);
        let filtered = rms(true);
        assert!(filtered < direct * 0.8, "filtered {filtered} vs direct {direct}");
    }

    #[test]
    fn observable_voice_paths() {
        let mut sid = Sid::new(SidModel::Mos8580);
        sid.write(0x0B, 0x41);
        assert_eq!(sid.query("voice1.control"), Some(Value::U8(0x41)));
        assert_eq!(sid.query("voice3.control"), None);
        assert_eq!(sid.query("volume"), Some(Value::U8(0)));
    }
}
