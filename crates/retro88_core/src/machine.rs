//! The concrete bank-switched machine: memory map, port decode and the
//! wiring of CPU, interrupt controller and tick sources.

mod bank;
mod bus;
mod ports;
mod system;


pub use bank::{BankState, RomMode};
pub use bus::MainBus;
pub use system::{Machine, MachineConfig, MachineHandle};

use crate::bus::BusError;

/// Number of 4th-ROM (extension) pages selectable through port 0x32.
pub const EXT_ROM_PAGES: usize = 4;
/// Bytes per text/graphics line in a VRAM plane.
pub const VRAM_LINE_BYTES: usize = 80;
/// Visible lines tracked for redraw.
pub const VRAM_LINES: usize = 200;
pub const VRAM_PLANES: usize = 3;

/// Interrupt channel of the vertical-retrace tick source.
pub const VRTC_CHANNEL: u8 = 1;
/// Interrupt channel of the real-time-clock tick source.
pub const RTC_CHANNEL: u8 = 2;

#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    #[error("extension ROM page {page} does not exist (pages 0-3)")]
    InvalidRomPage { page: usize },
    #[error("failed to spawn CPU thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("CPU thread panicked")]
    CpuThreadPanicked,
    #[error(transparent)]
    Bus(#[from] BusError),
}
