//! Memory interface seen by the renderers and the audio consumer.

use std::cell::Cell;

/// Software view of a 64K address space.
///
/// Accessors take `&self`: the memory behind a bus is shared between the
/// capture side and several consumers, so implementations provide their
/// own interior mutability.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&self, address: u16, value: u8);

    /// Read a big-endian 32-bit word from four consecutive addresses.
    ///
    /// Addresses wrap at the top of the 64K window.
    fn read_be32(&self, address: u16) -> u32 {
        u32::from_be_bytes([
            self.read(address),
            self.read(address.wrapping_add(1)),
            self.read(address.wrapping_add(2)),
            self.read(address.wrapping_add(3)),
        ])
    }
}

/// Plain 64K RAM for single-threaded hosts and tests.
pub struct RamBus {
    cells: Box<[Cell<u8>]>,
}

impl RamBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: (0..0x1_0000).map(|_| Cell::new(0)).collect(),
        }
    }

    /// Copy `bytes` into memory starting at `address`.
    pub fn load(&self, address: u16, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            self.write(address.wrapping_add(offset as u16), byte);
        }
    }
}

impl Default for RamBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for RamBus {
    fn read(&self, address: u16) -> u8 {
        self.cells[usize::from(address)].get()
    }

    fn write(&self, address: u16, value: u8) {
        self.cells[usize::from(address)].set(value);
    }
}
