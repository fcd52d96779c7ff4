mod alu;
mod block;
mod cb;
mod ed;
mod exec;
mod helpers;
mod index;
mod interrupts;
mod regs;
mod signals;
mod step;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use alu::{parity, PARITY};
pub use regs::{Flags, InterruptMode, Reg16, Reg8, Registers};
pub use signals::CpuSignals;

use crate::bus::{Bus, DeviceKey, DeviceRegistry};
use crate::intc::InterruptController;

/// Read-only observer invoked before every opcode fetch.
pub type TraceHook = Box<dyn FnMut(&Registers) + Send>;

/// Z80 execution engine.
///
/// The CPU owns its registers and its signal lines; memory and I/O always go
/// through the [`Bus`] handed to `step`/`run`, so the same core drives both
/// the concrete machine and bare test buses.
pub struct Cpu {
    pub regs: Registers,
    halted: bool,
    /// Set by `EI`: the following instruction completes before a maskable
    /// interrupt is taken.
    ei_delay: bool,
    cost: u64,
    signals: Arc<CpuSignals>,
    intc: Option<Arc<InterruptController>>,
    trace: Option<TraceHook>,
    unimplemented: u64,
    halt_poll: Duration,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("regs", &self.regs)
            .field("halted", &self.halted)
            .field("cost", &self.cost)
            .field("unimplemented", &self.unimplemented)
            .finish_non_exhaustive()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::with_signals(Arc::new(CpuSignals::new()))
    }

    /// Build a CPU around an existing set of signal lines (shared with the
    /// interrupt controller and any front end).
    pub fn with_signals(signals: Arc<CpuSignals>) -> Self {
        Self {
            regs: Registers::power_on(),
            halted: false,
            ei_delay: false,
            cost: 0,
            signals,
            intc: None,
            trace: None,
            unimplemented: 0,
            halt_poll: Duration::from_millis(1),
        }
    }

    /// Return to power-on state. Memory, signal lines and the interrupt
    /// controller handle are left alone.
    pub fn reset(&mut self) {
        self.regs = Registers::power_on();
        self.halted = false;
        self.ei_delay = false;
        self.cost = 0;
        self.unimplemented = 0;
    }

    /// Pick up collaborators from the bus device registry.
    pub fn attach(&mut self, devices: &DeviceRegistry) {
        self.intc = devices.lookup::<InterruptController>(DeviceKey::InterruptController);
        if self.intc.is_none() {
            log::debug!("no interrupt controller registered; using raw channel numbers");
        }
    }

    /// Convenience for `attach(bus.devices())`.
    pub fn attach_to<B: Bus>(&mut self, bus: &B) {
        self.attach(bus.devices());
    }

    pub fn signals(&self) -> Arc<CpuSignals> {
        Arc::clone(&self.signals)
    }

    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn reg8(&self, reg: Reg8) -> u8 {
        self.regs.get8(reg)
    }

    pub fn set_reg8(&mut self, reg: Reg8, value: u8) {
        self.regs.set8(reg, value);
    }

    pub fn reg16(&self, reg: Reg16) -> u16 {
        self.regs.get16(reg)
    }

    pub fn set_reg16(&mut self, reg: Reg16, value: u16) {
        self.regs.set16(reg, value);
    }

    /// Accumulated T-states since reset.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of undefined opcodes executed as no-ops since reset.
    pub fn unimplemented_count(&self) -> u64 {
        self.unimplemented
    }

    pub fn set_halt_poll(&mut self, interval: Duration) {
        self.halt_poll = interval;
    }

    pub fn set_trace_hook(&mut self, hook: TraceHook) {
        self.trace = Some(hook);
    }

    pub fn clear_trace_hook(&mut self) {
        self.trace = None;
    }

    #[inline]
    fn flags(&self) -> Flags {
        self.regs.f
    }

    #[inline]
    fn set_flags(&mut self, flags: Flags) {
        self.regs.f = flags;
    }

    #[inline]
    fn carry(&self) -> bool {
        self.regs.f.contains(Flags::C)
    }

    fn note_unimplemented(&mut self, prefix: &str, opcode: u8, at: u16) {
        self.unimplemented += 1;
        log::warn!(
            "unimplemented opcode {}{:02X} at PC=0x{:04X}, treated as NOP",
            prefix,
            opcode,
            at
        );
    }
}
