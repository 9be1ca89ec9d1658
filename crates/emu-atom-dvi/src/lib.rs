//! Acorn Atom video and sound from a shadowed host bus.
//!
//! The board watches the host's address, data and R/W lines. Writes to
//! claimed addresses land in a 64K shadow of host memory and are announced
//! on an event ring. Two real-time consumers run from that state:
//!
//! - the **video pipeline** renders one DVI line at a time, ahead of the
//!   display, from the MC6847 VDG modes, the VGA80 80-column mode or an
//!   SAA5050 teletext page;
//! - the **audio pipeline** replays SID register writes into a
//!   cycle-stepped synthesizer and emits one sample every period.
//!
//! [`AtomDvi`] wires the chip crates together and can either be driven
//! synchronously (tests, capture) or split into threads with
//! [`AtomDvi::spawn`].

pub mod audio;
#[cfg(feature = "capture")]
pub mod capture;
mod config;
pub mod console;
pub mod events;
pub mod line_pool;
pub mod map;
mod palette;
mod system;
pub mod vga80;
pub mod video;

pub use audio::{AudioEventConsumer, AudioTimer, SampleRecorder, SampleSink, SidCommand, pwm_level};
pub use config::{AtomDviConfig, DisplayTiming, FontSet, Platform};
pub use console::Console;
pub use events::{EventDispatcher, EventPump, ResetLine};
pub use line_pool::{LinePool, LineRequest, LineRequester, LineSlot, NoSync, RenderWorker, SyncOutput};
pub use palette::VGA80_PALETTE;
pub use system::{AtomDvi, AtomDviParts, RunningAtomDvi};
pub use video::{VideoMode, VideoPipeline};
