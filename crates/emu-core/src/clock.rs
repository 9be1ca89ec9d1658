//! Bus clock configuration.

use std::time::Duration;

use crate::Ticks;

/// Clock of the observed host bus.
///
/// Audio synthesis is stepped in bus cycles; the sample timer derives its
/// period from this frequency.
#[derive(Debug, Clone, Copy)]
pub struct MasterClock {
    /// Bus frequency in Hz (`1_000_000` for the Atom).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Bus cycles per output sample (integer division).
    #[must_use]
    pub const fn ticks_per_sample(&self, sample_rate_hz: u64) -> Ticks {
        Ticks::new(self.frequency_hz / sample_rate_hz)
    }

    /// Wall-clock duration of `ticks` bus cycles.
    #[must_use]
    pub const fn duration_of(&self, ticks: Ticks) -> Duration {
        Duration::from_nanos(ticks.get() * 1_000_000_000 / self.frequency_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_audio_tick_is_twenty_cycles() {
        let clock = MasterClock::new(1_000_000);
        let ticks = clock.ticks_per_sample(50_000);
        assert_eq!(ticks, Ticks::new(20));
        assert_eq!(clock.duration_of(ticks), Duration::from_micros(20));
    }
}
