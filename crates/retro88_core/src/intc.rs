use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::bus::{Device, DeviceKey, DeviceRegistry};
use crate::cpu::CpuSignals;

/// Channels without a mask bit.
const ALWAYS_ENABLED: u8 = 0xF8;

pub const CHANNEL_COUNT: u8 = 8;

/// Eight-channel interrupt controller in front of the CPU's maskable line.
///
/// Requests arrive from tick-source threads while the CPU thread
/// acknowledges them, so all state is kept in atomics. Each channel moves
/// Idle → Pending (request accepted) → Idle (acknowledged by interrupt
/// entry) and is pending at most once at a time.
#[derive(Debug)]
pub struct InterruptController {
    /// Pending bit per channel.
    irff: AtomicU8,
    /// Enable bit per channel.
    mask: AtomicU8,
    level: AtomicU8,
    priority_only: AtomicBool,
    last_channel: AtomicU8,
    signals: OnceLock<Arc<CpuSignals>>,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    pub fn new() -> Self {
        Self {
            irff: AtomicU8::new(0),
            mask: AtomicU8::new(ALWAYS_ENABLED),
            level: AtomicU8::new(7),
            priority_only: AtomicBool::new(true),
            last_channel: AtomicU8::new(0),
            signals: OnceLock::new(),
        }
    }

    fn reset(&self) {
        self.irff.store(0, Ordering::Release);
        self.mask.store(ALWAYS_ENABLED, Ordering::Release);
        self.level.store(7, Ordering::Release);
        self.priority_only.store(true, Ordering::Release);
        self.last_channel.store(0, Ordering::Release);
    }

    /// Entry point for tick sources and peripherals.
    ///
    /// Masked channels, channels blocked by a lower pending channel
    /// (priority-only mode) and channels above the compare level
    /// (level-compare mode) are ignored. An accepted request asserts the CPU
    /// line once; repeating it while pending changes nothing.
    pub fn request_interrupt(&self, channel: u8) {
        debug_assert!(channel < CHANNEL_COUNT, "interrupt channel {channel} out of range");
        if channel >= CHANNEL_COUNT {
            return;
        }
        let bit = 1u8 << channel;

        if self.mask.load(Ordering::Acquire) & bit == 0 {
            log::trace!("interrupt channel {} masked", channel);
            return;
        }
        let pending = self.irff.load(Ordering::Acquire);
        if self.priority_only.load(Ordering::Acquire) {
            if pending & (bit - 1) != 0 {
                log::trace!(
                    "interrupt channel {} held off by pending 0x{:02X}",
                    channel,
                    pending
                );
                return;
            }
        } else if channel > self.level.load(Ordering::Acquire) {
            log::trace!("interrupt channel {} above compare level", channel);
            return;
        }

        let before = self.irff.fetch_or(bit, Ordering::AcqRel);
        if before & bit == 0 {
            self.signal(channel);
        }
    }

    fn signal(&self, channel: u8) {
        self.last_channel.store(channel, Ordering::Release);
        match self.signals.get() {
            Some(signals) => signals.assert_irq(channel),
            None => log::trace!("interrupt channel {} pending with no CPU attached", channel),
        }
    }

    /// Clear the pending bit of `channel`, the one the CPU just serviced.
    ///
    /// The CPU line is then lowered, and raised again for the lowest channel
    /// still pending. The pending set is re-read after lowering the line, so
    /// a request that lands mid-acknowledge keeps its line asserted.
    pub fn acknowledge_interrupt(&self, channel: u8) {
        if channel >= CHANNEL_COUNT {
            return;
        }
        self.irff.fetch_and(!(1u8 << channel), Ordering::AcqRel);
        if let Some(signals) = self.signals.get() {
            signals.clear_irq();
        }
        let remaining = self.irff.load(Ordering::Acquire);
        if remaining != 0 {
            self.signal(remaining.trailing_zeros() as u8);
        }
    }

    /// IM2 vector-table offset of `channel`.
    pub fn offset_of(channel: u8) -> u16 {
        channel as u16 * 2
    }

    /// Offset into the IM2 vector table for the signalled channel.
    pub fn offset_vector(&self) -> u16 {
        Self::offset_of(self.current_channel())
    }

    pub fn current_channel(&self) -> u8 {
        self.last_channel.load(Ordering::Acquire)
    }

    /// Mask register write. Bit 0 enables channel 2, bit 1 channel 1 and
    /// bit 2 channel 0.
    pub fn write_mask(&self, value: u8) {
        let mut mask = ALWAYS_ENABLED;
        if value & 0x01 != 0 {
            mask |= 1 << 2;
        }
        if value & 0x02 != 0 {
            mask |= 1 << 1;
        }
        if value & 0x04 != 0 {
            mask |= 1 << 0;
        }
        self.mask.store(mask, Ordering::Release);
    }

    /// Bit 3 selects priority-only mode; bits 0–2 are the compare level.
    pub fn set_priority_register(&self, value: u8) {
        self.priority_only.store(value & 0x08 != 0, Ordering::Release);
        self.level.store(value & 0x07, Ordering::Release);
    }

    pub fn pending(&self) -> u8 {
        self.irff.load(Ordering::Acquire)
    }

    pub fn enabled_channels(&self) -> u8 {
        self.mask.load(Ordering::Acquire)
    }

    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Acquire)
    }

    pub fn is_priority_only(&self) -> bool {
        self.priority_only.load(Ordering::Acquire)
    }
}

impl Device for InterruptController {
    fn key(&self) -> DeviceKey {
        DeviceKey::InterruptController
    }

    fn attach(&self, devices: &DeviceRegistry) {
        self.reset();
        match devices.lookup::<CpuSignals>(DeviceKey::CpuSignals) {
            Some(signals) => {
                if self.signals.set(signals).is_err() {
                    log::trace!("interrupt controller already wired to the CPU");
                }
            }
            None => log::warn!("interrupt controller attached without CPU signal lines"),
        }
    }
}
