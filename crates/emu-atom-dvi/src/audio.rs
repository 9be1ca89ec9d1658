//! SID playback from captured register writes.
//!
//! The event handler forwards each host write to the SID block as a
//! [`SidCommand`] on a bounded queue. Once per sample period the consumer
//! applies every pending command in arrival order, clocks the SID for one
//! period, hands the sample to a [`SampleSink`] and copies OSC3/ENV3 back
//! into shadow memory for the host to read.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use emu_core::{MasterClock, Observable, Tickable, Ticks, Value};
use log::info;
use mos_sid_6581::{REG_ENV3, REG_OSC3, REGISTER_COUNT, Sid, SidModel};
use ringbuf::HeapCons;
use ringbuf::traits::Consumer;
use shadow_bus::{Permission, ShadowBus};

use crate::map::{SID_BASE, SID_ENV3, SID_OSC3, SID_POTX, SID_POTY, SID_READABLE, SID_WRITABLE};

/// Resolution of the PWM DAC.
pub const PWM_BITS: u32 = 11;

/// A pending change to the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidCommand {
    Write { register: u8, value: u8 },
    /// Clear every register, from the host reset line.
    Reset,
}

/// Where finished samples go.
pub trait SampleSink {
    fn emit(&mut self, sample: i16);
}

impl<F: FnMut(i16)> SampleSink for F {
    fn emit(&mut self, sample: i16) {
        self(sample);
    }
}

/// Duty level for the PWM DAC: the sample offset to unsigned and cut to
/// [`PWM_BITS`].
#[must_use]
pub fn pwm_level(sample: i16) -> u16 {
    ((i32::from(sample) + 0x8000) >> (16 - PWM_BITS)) as u16
}

/// Keeps every sample, for capture and tests.
#[derive(Debug, Default)]
pub struct SampleRecorder {
    pub samples: Vec<i16>,
}

impl SampleSink for SampleRecorder {
    fn emit(&mut self, sample: i16) {
        self.samples.push(sample);
    }
}

/// Runs the SID one sample period at a time.
pub struct AudioEventConsumer {
    sid: Sid,
    commands: HeapCons<SidCommand>,
    bus: Arc<ShadowBus>,
    ticks_per_sample: Ticks,
    samples: u64,
    applied: u64,
    resets: u64,
}

impl AudioEventConsumer {
    /// Claim the SID register block and power up the synthesizer.
    #[must_use]
    pub fn new(
        bus: Arc<ShadowBus>,
        commands: HeapCons<SidCommand>,
        model: SidModel,
        clock: MasterClock,
        sample_rate: u64,
    ) -> Self {
        bus.set_permission(SID_BASE, SID_WRITABLE, Permission::WRITE_ONLY);
        bus.set_permission(SID_BASE + SID_WRITABLE as u16, SID_READABLE, Permission::READ_ONLY);
        bus.fill(SID_BASE, SID_WRITABLE + SID_READABLE, 0);
        // No paddles fitted.
        bus.write(SID_POTX, 0xFF);
        bus.write(SID_POTY, 0xFF);

        let mut sid = Sid::new(model);
        sid.reset();
        clear_registers(&mut sid);

        let ticks_per_sample = clock.ticks_per_sample(sample_rate);
        info!(
            "SID {model:?} at {} Hz, {sample_rate} samples/s, {} cycles per sample",
            clock.frequency_hz,
            ticks_per_sample.get()
        );
        Self {
            sid,
            commands,
            bus,
            ticks_per_sample,
            samples: 0,
            applied: 0,
            resets: 0,
        }
    }

    #[must_use]
    pub fn sid(&self) -> &Sid {
        &self.sid
    }

    #[must_use]
    pub fn ticks_per_sample(&self) -> Ticks {
        self.ticks_per_sample
    }

    /// One sample period. Never blocks.
    pub fn tick(&mut self, sink: &mut dyn SampleSink) {
        while let Some(command) = self.commands.try_pop() {
            self.apply(command);
        }
        self.sid.tick_n(self.ticks_per_sample);
        sink.emit(self.sid.output());
        self.samples += 1;

        self.bus.write(SID_OSC3, self.sid.read(REG_OSC3));
        self.bus.write(SID_ENV3, self.sid.read(REG_ENV3));
    }

    fn apply(&mut self, command: SidCommand) {
        match command {
            SidCommand::Write { register, value } => self.sid.write(register & 0x1F, value),
            SidCommand::Reset => {
                clear_registers(&mut self.sid);
                self.resets += 1;
            }
        }
        self.applied += 1;
    }
}

fn clear_registers(sid: &mut Sid) {
    for register in 0..REGISTER_COUNT {
        sid.write(register, 0);
    }
}

impl Observable for AudioEventConsumer {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("sid.") {
            return self.sid.query(rest);
        }
        match path {
            "samples" => Some(self.samples.into()),
            "applied" => Some(self.applied.into()),
            "resets" => Some(self.resets.into()),
            "ticks_per_sample" => Some(self.ticks_per_sample.get().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["samples", "applied", "resets", "ticks_per_sample", "sid.<path>"]
    }
}

/// Fixed-rate pacing for [`AudioEventConsumer::tick`].
pub struct AudioTimer {
    period: Duration,
}

impl AudioTimer {
    #[must_use]
    pub fn new(clock: MasterClock, sample_rate: u64) -> Self {
        Self {
            period: clock.duration_of(clock.ticks_per_sample(sample_rate)),
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick `consumer` once per period forever.
    ///
    /// Deadlines advance by whole periods; if the thread falls more than a
    /// period behind, the schedule restarts from now rather than bursting.
    pub fn run(&self, mut consumer: AudioEventConsumer, mut sink: impl SampleSink) {
        let mut deadline = Instant::now();
        loop {
            consumer.tick(&mut sink);
            deadline += self.period;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else if now - deadline > self.period {
                deadline = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Producer, Split};
    use ringbuf::{HeapProd, HeapRb};

    fn rig(capacity: usize) -> (Arc<ShadowBus>, HeapProd<SidCommand>, AudioEventConsumer) {
        let bus = Arc::new(ShadowBus::new(32));
        let (producer, consumer) = HeapRb::<SidCommand>::new(capacity).split();
        let audio = AudioEventConsumer::new(
            Arc::clone(&bus),
            consumer,
            SidModel::Mos8580,
            MasterClock::new(1_000_000),
            50_000,
        );
        (bus, producer, audio)
    }

    fn write(producer: &mut HeapProd<SidCommand>, register: u8, value: u8) {
        assert!(producer.try_push(SidCommand::Write { register, value }).is_ok());
    }

    #[test]
    fn pwm_level_spans_eleven_bits() {
        assert_eq!(pwm_level(i16::MIN), 0);
        assert_eq!(pwm_level(0), 1024);
        assert_eq!(pwm_level(i16::MAX), 2047);
    }

    #[test]
    fn init_claims_register_block() {
        let (bus, _producer, audio) = rig(4);
        assert_eq!(audio.ticks_per_sample(), Ticks::new(20));
        assert_eq!(bus.permission(SID_BASE), Permission::WRITE_ONLY);
        assert_eq!(bus.permission(SID_BASE + 0x18), Permission::WRITE_ONLY);
        assert_eq!(bus.permission(SID_POTX), Permission::READ_ONLY);
        assert_eq!(bus.permission(SID_ENV3), Permission::READ_ONLY);
        assert_eq!(bus.permission(SID_BASE + 0x1D), Permission::NONE);
        assert_eq!(bus.read(SID_POTX), 0xFF);
    }

    #[test]
    fn commands_apply_in_arrival_order() {
        let (_bus, mut producer, mut audio) = rig(8);
        write(&mut producer, 0x18, 0x05);
        write(&mut producer, 0x18, 0x0A);
        write(&mut producer, 0x18, 0x0F);
        audio.tick(&mut SampleRecorder::default());
        assert_eq!(audio.sid().volume, 0x0F);
        assert_eq!(audio.query("applied"), Some(Value::U64(3)));
    }

    #[test]
    fn burst_drains_within_one_tick() {
        let (_bus, mut producer, mut audio) = rig(32);
        for value in 0..32u8 {
            write(&mut producer, 0x18, value & 0x0F);
        }
        let mut recorder = SampleRecorder::default();
        audio.tick(&mut recorder);
        assert_eq!(audio.query("applied"), Some(Value::U64(32)));
        assert_eq!(audio.sid().volume, 0x0F);
        assert_eq!(recorder.samples.len(), 1);
        assert_eq!(audio.sid().cycles(), 20);
    }

    #[test]
    fn voice_three_feeds_back_into_shadow() {
        let (bus, mut producer, mut audio) = rig(16);
        // Voice 3: fast sawtooth, gate on, instant attack, full sustain.
        write(&mut producer, 0x0F, 0x40);
        write(&mut producer, 0x13, 0x00);
        write(&mut producer, 0x14, 0xF0);
        write(&mut producer, 0x12, 0x21);
        let mut recorder = SampleRecorder::default();
        for _ in 0..50 {
            audio.tick(&mut recorder);
        }
        assert!(bus.read(SID_ENV3) > 0);
        assert!(bus.read(SID_OSC3) > 0);
    }

    #[test]
    fn reset_silences_without_touching_shadow() {
        let (bus, mut producer, mut audio) = rig(8);
        bus.write(SID_BASE + 0x18, 0x0F);
        write(&mut producer, 0x18, 0x0F);
        assert!(producer.try_push(SidCommand::Reset).is_ok());
        audio.tick(&mut SampleRecorder::default());
        assert_eq!(audio.sid().volume, 0);
        assert_eq!(bus.read(SID_BASE + 0x18), 0x0F);
        assert_eq!(audio.query("resets"), Some(Value::U64(1)));
    }

    #[test]
    fn closures_are_sample_sinks() {
        let (_bus, _producer, mut audio) = rig(4);
        let mut levels = Vec::new();
        audio.tick(&mut |sample: i16| levels.push(pwm_level(sample)));
        assert_eq!(levels, vec![pwm_level(0)]);
    }

    #[test]
    fn timer_period_matches_sample_rate() {
        let timer = AudioTimer::new(MasterClock::new(1_000_000), 50_000);
        assert_eq!(timer.period(), Duration::from_micros(20));
    }
}
