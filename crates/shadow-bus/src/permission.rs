//! Per-address permission tags.

use bitflags::bitflags;

bitflags! {
    /// How the capture hardware treats bus cycles at one address.
    ///
    /// Bit layout matches the tag byte the capture state machine reads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permission: u8 {
        /// Drive the shadow value onto the bus during host reads.
        const READ = 0b001;
        /// Store host writes and raise an event.
        const WRITE = 0b010;
        /// Store the value another device drives during host reads.
        const SNOOP = 0b100;
    }
}

impl Permission {
    pub const NONE: Self = Self::empty();
    pub const READ_ONLY: Self = Self::READ;
    pub const WRITE_ONLY: Self = Self::WRITE;
    pub const READ_WRITE: Self = Self::READ.union(Self::WRITE);
    pub const READ_SNOOP: Self = Self::SNOOP;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_tags_match_hardware_bits() {
        assert_eq!(Permission::NONE.bits(), 0);
        assert_eq!(Permission::READ_ONLY.bits(), 0b001);
        assert_eq!(Permission::WRITE_ONLY.bits(), 0b010);
        assert_eq!(Permission::READ_WRITE.bits(), 0b011);
        assert_eq!(Permission::READ_SNOOP.bits(), 0b100);
    }
}
