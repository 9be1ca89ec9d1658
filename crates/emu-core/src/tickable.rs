//! Trait for components that can be advanced by clock ticks.

use crate::Ticks;

/// A component that can be advanced by bus clock ticks.
pub trait Tickable {
    /// Advance the component by one bus cycle.
    fn tick(&mut self);

    /// Advance the component by multiple cycles.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
