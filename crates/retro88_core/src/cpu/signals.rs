use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::bus::{Device, DeviceKey, DeviceRegistry};

/// Lines into the CPU that other threads may drive.
///
/// Tick sources, the interrupt controller and debugger front ends flip these
/// between instructions; the CPU only samples them at instruction
/// boundaries.
#[derive(Debug, Default)]
pub struct CpuSignals {
    irq: AtomicBool,
    channel: AtomicU8,
    nmi: AtomicBool,
    stop: AtomicBool,
}

impl CpuSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert the maskable interrupt line on behalf of `channel`.
    pub fn assert_irq(&self, channel: u8) {
        self.channel.store(channel, Ordering::Release);
        self.irq.store(true, Ordering::Release);
    }

    pub fn irq_asserted(&self) -> bool {
        self.irq.load(Ordering::Acquire)
    }

    /// Channel recorded by the most recent `assert_irq`.
    pub fn irq_channel(&self) -> u8 {
        self.channel.load(Ordering::Acquire)
    }

    pub fn clear_irq(&self) {
        self.irq.store(false, Ordering::Release);
    }

    pub fn raise_nmi(&self) {
        self.nmi.store(true, Ordering::Release);
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi.load(Ordering::Acquire)
    }

    pub fn clear_nmi(&self) {
        self.nmi.store(false, Ordering::Release);
    }

    /// Ask the run loop to return at the next instruction boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

impl Device for CpuSignals {
    fn key(&self) -> DeviceKey {
        DeviceKey::CpuSignals
    }

    /// Interrupt lines drop at reset; a pending stop request survives it.
    fn attach(&self, _devices: &DeviceRegistry) {
        self.clear_irq();
        self.clear_nmi();
    }
}
