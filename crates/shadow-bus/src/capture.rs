//! Bus-side capture port.
//!
//! Stands in for the capture state machine: it sees each host bus cycle,
//! consults the permission tag and either updates the shadow cell, drives
//! the data bus, or does nothing.

use std::sync::Arc;
use std::thread::Thread;

use crate::{Permission, ShadowBus};

/// The producer end of the shadow bus.
///
/// Exactly one port exists per [`ShadowBus`]; methods take `&mut self` so
/// the event stream keeps a single producer.
pub struct CapturePort {
    bus: Arc<ShadowBus>,
    interrupt: Option<Thread>,
}

impl CapturePort {
    pub(crate) fn new(bus: Arc<ShadowBus>) -> Self {
        Self {
            bus,
            interrupt: None,
        }
    }

    /// Wake `thread` after every published event, like the DMA-complete
    /// interrupt.
    pub fn set_interrupt_target(&mut self, thread: Thread) {
        self.interrupt = Some(thread);
    }

    /// Host CPU write cycle. Returns whether the write was captured.
    pub fn bus_write(&mut self, address: u16, value: u8) -> bool {
        if self.bus.is_paused() || !self.bus.permission(address).contains(Permission::WRITE) {
            return false;
        }
        self.bus.write(address, value);
        self.publish(address);
        true
    }

    /// Host CPU read cycle. Returns the value driven onto the data bus, or
    /// `None` if the location is left for other devices.
    pub fn bus_read(&mut self, address: u16) -> Option<u8> {
        if self.bus.is_paused() || !self.bus.permission(address).contains(Permission::READ) {
            return None;
        }
        Some(self.bus.read(address))
    }

    /// Host CPU read cycle answered by another device with `value`.
    /// Returns whether the value was captured.
    pub fn bus_snoop(&mut self, address: u16, value: u8) -> bool {
        if self.bus.is_paused() || !self.bus.permission(address).contains(Permission::SNOOP) {
            return false;
        }
        self.bus.write(address, value);
        self.publish(address);
        true
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<ShadowBus> {
        &self.bus
    }

    fn publish(&self, address: u16) {
        self.bus.events.publish(address);
        if let Some(thread) = &self.interrupt {
            thread.unpark();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<ShadowBus>, CapturePort) {
        let bus = Arc::new(ShadowBus::new(32));
        let port = bus.capture_port();
        (bus, port)
    }

    #[test]
    fn write_to_untagged_address_is_dropped() {
        let (bus, mut port) = setup();
        assert!(!port.bus_write(0x2000, 0x55));
        assert_eq!(bus.read(0x2000), 0);
        assert_eq!(bus.event_stream().written(), 0);
    }

    #[test]
    fn write_only_stores_and_announces_but_never_drives() {
        let (bus, mut port) = setup();
        bus.set_permission_byte(0xB000, Permission::WRITE_ONLY);
        assert!(port.bus_write(0xB000, 0xF0));
        assert_eq!(bus.read(0xB000), 0xF0);
        assert_eq!(bus.event_stream().written(), 1);
        assert_eq!(port.bus_read(0xB000), None);
    }

    #[test]
    fn read_only_drives_but_ignores_writes() {
        let (bus, mut port) = setup();
        bus.set_permission_byte(0xBDDB, Permission::READ_ONLY);
        bus.write(0xBDDB, 0x7F);
        assert!(!port.bus_write(0xBDDB, 0x00));
        assert_eq!(port.bus_read(0xBDDB), Some(0x7F));
        assert_eq!(bus.event_stream().written(), 0);
    }

    #[test]
    fn snoop_captures_foreign_read_value() {
        let (bus, mut port) = setup();
        bus.set_permission_byte(0xB001, Permission::READ_SNOOP);
        assert_eq!(port.bus_read(0xB001), None);
        assert!(port.bus_snoop(0xB001, 0x3C));
        assert_eq!(bus.read(0xB001), 0x3C);
        assert_eq!(bus.event_stream().written(), 1);
    }

    #[test]
    fn paused_port_ignores_every_cycle() {
        let (bus, mut port) = setup();
        bus.set_permission(0x8000, 0x2000, Permission::READ_WRITE);
        bus.pause();
        assert!(!port.bus_write(0x8000, 0x41));
        assert_eq!(port.bus_read(0x8000), None);
        assert!(bus.resume());
        assert!(port.bus_write(0x8000, 0x41));
        assert_eq!(port.bus_read(0x8000), Some(0x41));
    }
}
