//! The write event stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

use log::warn;

use crate::ShadowBus;

/// Ring of shadow addresses, appended by the capture port.
///
/// The write cursor counts every record ever published; a slot index is the
/// cursor masked by the capacity. The producer never waits: when the reader
/// is more than `capacity` records behind, the oldest records are gone.
pub struct EventStream {
    slots: Box<[AtomicU16]>,
    mask: usize,
    write: AtomicUsize,
}

impl EventStream {
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of two.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "event ring capacity {capacity} is not a power of two"
        );
        Self {
            slots: (0..capacity).map(|_| AtomicU16::new(0)).collect(),
            mask: capacity - 1,
            write: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Total records published since start-up (wrapping).
    #[must_use]
    pub fn written(&self) -> usize {
        self.write.load(Ordering::Acquire)
    }

    /// Append one address. Only the capture port calls this.
    pub(crate) fn publish(&self, address: u16) {
        let cursor = self.write.load(Ordering::Relaxed);
        self.slots[cursor & self.mask].store(address, Ordering::Relaxed);
        self.write.store(cursor.wrapping_add(1), Ordering::Release);
    }

    fn slot(&self, cursor: usize) -> u16 {
        self.slots[cursor & self.mask].load(Ordering::Relaxed)
    }
}

/// Receives drained events in interrupt context.
///
/// Implementations must not block or allocate: they run once per captured
/// write.
pub trait CaptureHandler {
    fn on_capture(&mut self, address: u16, bus: &ShadowBus);
}

impl<F: FnMut(u16, &ShadowBus)> CaptureHandler for F {
    fn on_capture(&mut self, address: u16, bus: &ShadowBus) {
        self(address, bus);
    }
}

/// The single consumer of the event stream.
pub struct EventReader {
    bus: Arc<ShadowBus>,
    read: usize,
    overrun: u64,
}

impl EventReader {
    pub(crate) fn new(bus: Arc<ShadowBus>) -> Self {
        let read = bus.events.written();
        Self {
            bus,
            read,
            overrun: 0,
        }
    }

    /// Next unread address, or `None` when the reader has caught up.
    ///
    /// If the producer has lapped the reader, skips to the oldest record
    /// still in the ring and counts the lost ones.
    pub fn poll_event(&mut self) -> Option<u16> {
        let events = &self.bus.events;
        let write = events.written();
        let pending = write.wrapping_sub(self.read);
        if pending == 0 {
            return None;
        }
        if pending > events.capacity() {
            self.overrun += (pending - events.capacity()) as u64;
            self.read = write.wrapping_sub(events.capacity());
        }
        let address = events.slot(self.read);
        self.read = self.read.wrapping_add(1);
        Some(address)
    }

    /// Poll until empty, handing every address to `handler`.
    ///
    /// Returns the number of events delivered.
    pub fn drain(&mut self, handler: &mut dyn CaptureHandler) -> usize {
        let lost_before = self.overrun;
        let mut delivered = 0;
        while let Some(address) = self.poll_event() {
            handler.on_capture(address, &self.bus);
            delivered += 1;
        }
        if self.overrun != lost_before {
            warn!(
                "event ring overrun: {} records lost",
                self.overrun - lost_before
            );
        }
        delivered
    }

    /// Records lost to overruns since start-up.
    #[must_use]
    pub fn overrun(&self) -> u64 {
        self.overrun
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<ShadowBus> {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "not a power of two")]
    fn capacity_must_be_power_of_two() {
        let _ = EventStream::with_capacity(24);
    }

    #[test]
    fn empty_reader_polls_none() {
        let bus = Arc::new(ShadowBus::new(8));
        let mut reader = bus.event_reader();
        assert_eq!(reader.poll_event(), None);
    }

    #[test]
    fn records_arrive_in_publish_order() {
        let bus = Arc::new(ShadowBus::new(8));
        let mut reader = bus.event_reader();
        for address in [0xBDC0, 0xBDC4, 0xBDF0] {
            bus.events.publish(address);
        }
        assert_eq!(reader.poll_event(), Some(0xBDC0));
        assert_eq!(reader.poll_event(), Some(0xBDC4));
        assert_eq!(reader.poll_event(), Some(0xBDF0));
        assert_eq!(reader.poll_event(), None);
    }

    #[test]
    fn overrun_keeps_newest_capacity_records() {
        let bus = Arc::new(ShadowBus::new(4));
        let mut reader = bus.event_reader();
        for address in 0..10u16 {
            bus.events.publish(address);
        }
        let got: Vec<u16> = std::iter::from_fn(|| reader.poll_event()).collect();
        assert_eq!(got, vec![6, 7, 8, 9]);
        assert_eq!(reader.overrun(), 6);
    }

    #[test]
    fn drain_hands_each_address_to_closure() {
        let bus = Arc::new(ShadowBus::new(8));
        let mut reader = bus.event_reader();
        bus.write(0xB000, 0x10);
        bus.events.publish(0xB000);
        let mut seen = Vec::new();
        let delivered = reader.drain(&mut |address: u16, bus: &ShadowBus| {
            seen.push((address, bus.read(address)));
        });
        assert_eq!(delivered, 1);
        assert_eq!(seen, vec![(0xB000, 0x10)]);
    }
}
