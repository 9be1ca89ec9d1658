//! Shadow memory for a passively observed 8-bit bus.
//!
//! The capture hardware watches the host CPU's address, data and R/W lines.
//! Every address in the 64K window has a shadow cell holding a value and a
//! [`Permission`] tag:
//!
//! | Tag          | Bus write            | Bus read                      |
//! |--------------|----------------------|-------------------------------|
//! | `NONE`       | ignored              | not driven                    |
//! | `READ_ONLY`  | ignored              | driven from the cell          |
//! | `WRITE_ONLY` | stored, event raised | not driven                    |
//! | `READ_WRITE` | stored, event raised | driven from the cell          |
//! | `READ_SNOOP` | ignored              | bus value stored, event raised|
//!
//! Each accepted store appends the address to the [`EventStream`], a
//! power-of-two ring that overwrites its oldest entries when the consumer
//! falls behind. A single [`EventReader`] drains the ring and hands each
//! address to a [`CaptureHandler`].
//!
//! # Concurrency
//!
//! Cells are relaxed atomics: a consumer may see a multi-byte value half
//! updated, exactly as the hardware allows. The ring's write cursor is
//! published with release ordering so an address is always visible before
//! the cursor that covers it.

mod capture;
mod events;
mod permission;
mod shadow;

pub use capture::CapturePort;
pub use events::{CaptureHandler, EventReader, EventStream};
pub use permission::Permission;
pub use shadow::ShadowBus;

/// Number of addressable cells (the full 16-bit window).
pub const WINDOW_SIZE: usize = 0x1_0000;

/// Default event ring length (32 entries, the hardware DMA ring).
pub const DEFAULT_EVENT_CAPACITY: usize = 32;
