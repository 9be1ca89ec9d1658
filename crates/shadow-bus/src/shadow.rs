//! The shadow memory array.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use emu_core::Bus;
use log::{debug, info};

use crate::capture::CapturePort;
use crate::events::{EventReader, EventStream};
use crate::{Permission, WINDOW_SIZE};

/// Shadow copy of the host's 64K address space.
///
/// Shared between the capture side, the event drain, the render loop and
/// the audio timer, usually behind an [`Arc`].
pub struct ShadowBus {
    values: Box<[AtomicU8]>,
    permissions: Box<[AtomicU8]>,
    /// Lowest and highest address ever tagged with a permission.
    low: AtomicUsize,
    high: AtomicUsize,
    paused: AtomicBool,
    pub(crate) events: EventStream,
    reader_claimed: AtomicBool,
    port_claimed: AtomicBool,
}

impl ShadowBus {
    /// Allocate the full window with every cell zeroed and untagged.
    ///
    /// # Panics
    ///
    /// Panics if `event_capacity` is not a power of two.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        info!("shadow bus: {WINDOW_SIZE} cells, {event_capacity}-entry event ring");
        Self {
            values: (0..WINDOW_SIZE).map(|_| AtomicU8::new(0)).collect(),
            permissions: (0..WINDOW_SIZE).map(|_| AtomicU8::new(0)).collect(),
            low: AtomicUsize::new(WINDOW_SIZE),
            high: AtomicUsize::new(0),
            paused: AtomicBool::new(false),
            events: EventStream::with_capacity(event_capacity),
            reader_claimed: AtomicBool::new(false),
            port_claimed: AtomicBool::new(false),
        }
    }

    /// Tag `[start, start + len)` with `permission`.
    ///
    /// # Panics
    ///
    /// Panics if the range runs past the top of the 64K window.
    pub fn set_permission(&self, start: u16, len: usize, permission: Permission) {
        let first = usize::from(start);
        assert!(
            first + len <= WINDOW_SIZE,
            "permission range {first:#06X}+{len:#X} leaves the 64K window"
        );
        if len == 0 {
            return;
        }
        for tag in &self.permissions[first..first + len] {
            tag.store(permission.bits(), Ordering::Relaxed);
        }
        if !permission.is_empty() {
            self.low.fetch_min(first, Ordering::Relaxed);
            self.high.fetch_max(first + len - 1, Ordering::Relaxed);
        }
        debug!("permission {permission:?} on {first:#06X}..{:#06X}", first + len);
    }

    /// Tag a single address.
    pub fn set_permission_byte(&self, address: u16, permission: Permission) {
        self.set_permission(address, 1, permission);
    }

    #[must_use]
    pub fn permission(&self, address: u16) -> Permission {
        Permission::from_bits_truncate(self.permissions[usize::from(address)].load(Ordering::Relaxed))
    }

    /// The address range the capture decode must cover, if any address
    /// has ever been tagged.
    #[must_use]
    pub fn permission_window(&self) -> Option<RangeInclusive<u16>> {
        let low = self.low.load(Ordering::Relaxed);
        let high = self.high.load(Ordering::Relaxed);
        (low <= high).then(|| low as u16..=high as u16)
    }

    /// Current shadow value, regardless of permission.
    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        self.values[usize::from(address)].load(Ordering::Relaxed)
    }

    /// Overwrite a shadow value, regardless of permission. Raises no event.
    pub fn write(&self, address: u16, value: u8) {
        self.values[usize::from(address)].store(value, Ordering::Relaxed);
    }

    /// Copy `out.len()` bytes starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if the run leaves the window.
    pub fn read_into(&self, start: u16, out: &mut [u8]) {
        let first = Self::checked_run(start, out.len());
        for (dst, cell) in out.iter_mut().zip(&self.values[first..]) {
            *dst = cell.load(Ordering::Relaxed);
        }
    }

    /// Store `bytes` starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if the run leaves the window.
    pub fn write_bytes(&self, start: u16, bytes: &[u8]) {
        let first = Self::checked_run(start, bytes.len());
        for (cell, &byte) in self.values[first..].iter().zip(bytes) {
            cell.store(byte, Ordering::Relaxed);
        }
    }

    /// Store the bytes of `text` starting at `start`.
    pub fn write_str(&self, start: u16, text: &str) {
        self.write_bytes(start, text.as_bytes());
    }

    /// Set `len` cells starting at `start` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if the run leaves the window.
    pub fn fill(&self, start: u16, len: usize, value: u8) {
        let first = Self::checked_run(start, len);
        for cell in &self.values[first..first + len] {
            cell.store(value, Ordering::Relaxed);
        }
    }

    /// Freeze the capture address decode. Bus cycles are ignored until
    /// [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Restart the capture decode. Returns whether it was paused.
    pub fn resume(&self) -> bool {
        self.paused.swap(false, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn event_stream(&self) -> &EventStream {
        &self.events
    }

    /// Claim the single consumer end of the event stream.
    ///
    /// # Panics
    ///
    /// Panics if a reader has already been claimed.
    #[must_use]
    pub fn event_reader(self: &Arc<Self>) -> EventReader {
        assert!(
            !self.reader_claimed.swap(true, Ordering::AcqRel),
            "event reader already claimed"
        );
        EventReader::new(Arc::clone(self))
    }

    /// Claim the single producer: the capture port.
    ///
    /// # Panics
    ///
    /// Panics if the port has already been claimed.
    #[must_use]
    pub fn capture_port(self: &Arc<Self>) -> CapturePort {
        assert!(
            !self.port_claimed.swap(true, Ordering::AcqRel),
            "capture port already claimed"
        );
        CapturePort::new(Arc::clone(self))
    }

    fn checked_run(start: u16, len: usize) -> usize {
        let first = usize::from(start);
        assert!(
            first + len <= WINDOW_SIZE,
            "run {first:#06X}+{len:#X} leaves the 64K window"
        );
        first
    }
}

impl Bus for ShadowBus {
    fn read(&self, address: u16) -> u8 {
        ShadowBus::read(self, address)
    }

    fn write(&self, address: u16, value: u8) {
        ShadowBus::write(self, address, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> ShadowBus {
        ShadowBus::new(32)
    }

    #[test]
    fn fresh_cells_are_zero_and_untagged() {
        let bus = bus();
        assert_eq!(bus.read(0x8000), 0);
        assert_eq!(bus.permission(0x8000), Permission::NONE);
        assert_eq!(bus.permission_window(), None);
    }

    #[test]
    fn set_permission_covers_exact_range() {
        let bus = bus();
        bus.set_permission(0xBDC0, 25, Permission::WRITE_ONLY);
        assert_eq!(bus.permission(0xBDBF), Permission::NONE);
        assert_eq!(bus.permission(0xBDC0), Permission::WRITE_ONLY);
        assert_eq!(bus.permission(0xBDD8), Permission::WRITE_ONLY);
        assert_eq!(bus.permission(0xBDD9), Permission::NONE);
    }

    #[test]
    fn permission_window_spans_tagged_ranges() {
        let bus = bus();
        bus.set_permission(0xB000, 1, Permission::WRITE_ONLY);
        bus.set_permission(0x8000, 0x2000, Permission::READ_WRITE);
        assert_eq!(bus.permission_window(), Some(0x8000..=0xB000));
    }

    #[test]
    fn range_ending_at_top_of_window_is_accepted() {
        let bus = bus();
        bus.set_permission(0xFFF0, 16, Permission::READ_ONLY);
        assert_eq!(bus.permission(0xFFFF), Permission::READ_ONLY);
    }

    #[test]
    #[should_panic(expected = "leaves the 64K window")]
    fn range_past_top_of_window_panics() {
        bus().set_permission(0xFFF0, 17, Permission::READ_ONLY);
    }

    #[test]
    fn software_writes_ignore_permissions_and_raise_no_event() {
        let bus = bus();
        bus.write(0x1234, 0x56);
        assert_eq!(bus.read(0x1234), 0x56);
        assert_eq!(bus.event_stream().written(), 0);
    }

    #[test]
    fn block_helpers() {
        let bus = bus();
        bus.fill(0x8000, 4, 0x20);
        bus.write_str(0x8001, "AB");
        let mut out = [0; 4];
        bus.read_into(0x8000, &mut out);
        assert_eq!(out, [0x20, b'A', b'B', 0x20]);
        assert_eq!(bus.read_be32(0x8000), 0x2041_4220);
    }

    #[test]
    fn resume_reports_previous_pause_state() {
        let bus = bus();
        assert!(!bus.resume());
        bus.pause();
        assert!(bus.is_paused());
        assert!(bus.resume());
        assert!(!bus.is_paused());
    }

    #[test]
    #[should_panic(expected = "already claimed")]
    fn second_reader_panics() {
        let bus = Arc::new(bus());
        let _first = bus.event_reader();
        let _second = bus.event_reader();
    }
}
