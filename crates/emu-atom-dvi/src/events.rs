//! Routing captured writes to the audio queue and the CRTC.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};

use emu_core::{Observable, Value};
use log::{debug, warn};
use motorola_6845::Crtc6845;
use ringbuf::HeapProd;
use ringbuf::traits::Producer;
use shadow_bus::{CaptureHandler, EventReader, ShadowBus};

use crate::audio::SidCommand;
use crate::map::{SID_BASE, SID_WRITABLE, TELETEXT_CRTA, TELETEXT_CRTB};
use crate::vga80;

/// Interrupt-context handler: classifies each captured address.
///
/// Values are read from the shadow at drain time, so repeated writes to one
/// address between drains all deliver the latest value.
pub struct EventDispatcher {
    sid: HeapProd<SidCommand>,
    reset: Arc<AtomicBool>,
    crtc: Arc<Crtc6845>,
    sid_writes: u64,
    sid_dropped: u64,
    crtc_writes: u64,
    ignored: u64,
}

impl EventDispatcher {
    #[must_use]
    pub fn new(sid: HeapProd<SidCommand>, reset: Arc<AtomicBool>, crtc: Arc<Crtc6845>) -> Self {
        Self {
            sid,
            reset,
            crtc,
            sid_writes: 0,
            sid_dropped: 0,
            crtc_writes: 0,
            ignored: 0,
        }
    }

    /// Queue a SID reset if the reset line was pulsed since the last call.
    pub fn forward_reset(&mut self) {
        if self.reset.swap(false, Ordering::AcqRel) {
            self.send(SidCommand::Reset);
        }
    }

    /// SID commands lost to a full queue.
    #[must_use]
    pub fn sid_dropped(&self) -> u64 {
        self.sid_dropped
    }

    fn send(&mut self, command: SidCommand) {
        if self.sid.try_push(command).is_err() {
            self.sid_dropped += 1;
        }
    }
}

impl CaptureHandler for EventDispatcher {
    fn on_capture(&mut self, address: u16, bus: &ShadowBus) {
        let offset = address.wrapping_sub(SID_BASE);
        if usize::from(offset) < SID_WRITABLE {
            self.send(SidCommand::Write {
                register: offset as u8,
                value: bus.read(address),
            });
            self.sid_writes += 1;
        } else if address == TELETEXT_CRTA {
            self.crtc.write_address(bus.read(address));
        } else if address == TELETEXT_CRTB {
            let value = bus.read(address);
            self.crtc.write_data(value);
            self.crtc_writes += 1;
            debug!("CRTC R{} = {value:#04x}", self.crtc.selected());
        } else {
            self.ignored += 1;
        }
    }
}

impl Observable for EventDispatcher {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "sid_writes" => Some(self.sid_writes.into()),
            "sid_dropped" => Some(self.sid_dropped.into()),
            "crtc_writes" => Some(self.crtc_writes.into()),
            "ignored" => Some(self.ignored.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["sid_writes", "sid_dropped", "crtc_writes", "ignored"]
    }
}

/// Drains the event ring into the dispatcher whenever the capture port
/// raises its interrupt.
pub struct EventPump {
    reader: EventReader,
    dispatcher: EventDispatcher,
}

impl EventPump {
    #[must_use]
    pub fn new(reader: EventReader, dispatcher: EventDispatcher) -> Self {
        Self { reader, dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn overrun(&self) -> u64 {
        self.reader.overrun()
    }

    /// Forward a pending reset, then every queued event.
    pub fn step(&mut self) -> usize {
        let dropped = self.dispatcher.sid_dropped;
        self.dispatcher.forward_reset();
        let delivered = self.reader.drain(&mut self.dispatcher);
        if self.dispatcher.sid_dropped != dropped {
            warn!(
                "audio queue full: {} SID commands lost",
                self.dispatcher.sid_dropped - dropped
            );
        }
        delivered
    }

    /// Drain on every wake-up, forever.
    pub fn run(mut self) {
        loop {
            self.step();
            thread::park();
        }
    }
}

impl Observable for EventPump {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "overrun" => Some(self.overrun().into()),
            _ => self.dispatcher.query(path),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["overrun", "sid_writes", "sid_dropped", "crtc_writes", "ignored"]
    }
}

/// The host reset (BREAK) line.
///
/// Puts the VGA80 registers back to power-on values and asks the event
/// pump to silence the SID.
#[derive(Clone)]
pub struct ResetLine {
    bus: Arc<ShadowBus>,
    pending: Arc<AtomicBool>,
    pump: Option<Thread>,
}

impl ResetLine {
    #[must_use]
    pub fn new(bus: Arc<ShadowBus>, pending: Arc<AtomicBool>) -> Self {
        Self {
            bus,
            pending,
            pump: None,
        }
    }

    pub fn set_pump(&mut self, thread: Thread) {
        self.pump = Some(thread);
    }

    pub fn pulse(&self) {
        vga80::reset_registers(&self.bus);
        self.pending.store(true, Ordering::Release);
        if let Some(pump) = &self.pump {
            pump.unpark();
        }
    }
}
