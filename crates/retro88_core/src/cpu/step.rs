use std::thread;

use super::{Bus, Cpu};
use crate::bus::BusError;

impl Cpu {
    /// Execute one instruction (or one idle HALT cycle), then service any
    /// pending interrupt. Returns the T-states consumed.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let mut cycles = if self.halted {
            self.regs.bump_r();
            4
        } else {
            if let Some(hook) = self.trace.as_mut() {
                hook(&self.regs);
            }
            let opcode = self.fetch_opcode(bus);
            self.exec_opcode(bus, opcode)
        };

        let allow_maskable = !std::mem::take(&mut self.ei_delay);
        if let Some(entry) = self.service_interrupts(bus, allow_maskable) {
            cycles += entry;
        }

        self.cost += cycles as u64;
        cycles
    }

    /// Single-step up to `count` instructions for a debugger.
    ///
    /// Stops early when a stop has been requested. Returns the T-states
    /// spent, or the first bus fault raised.
    pub fn step_n<B: Bus>(&mut self, bus: &mut B, count: usize) -> Result<u64, BusError> {
        let mut total = 0u64;
        for _ in 0..count {
            if self.signals.stop_requested() {
                break;
            }
            total += self.step(bus) as u64;
            if let Some(err) = bus.take_fault() {
                return Err(err);
            }
        }
        Ok(total)
    }

    /// Run until a stop is requested through [`CpuSignals`] or the bus
    /// raises a fault.
    ///
    /// While halted with nothing acceptable pending, the loop sleeps for the
    /// configured poll interval between checks.
    ///
    /// [`CpuSignals`]: super::CpuSignals
    pub fn run<B: Bus>(&mut self, bus: &mut B) -> Result<(), BusError> {
        log::debug!("CPU run loop entered at PC=0x{:04X}", self.regs.pc);
        loop {
            if self.signals.stop_requested() {
                log::debug!(
                    "CPU stop requested at PC=0x{:04X} after {} T-states",
                    self.regs.pc,
                    self.cost
                );
                return Ok(());
            }

            self.step(bus);

            if let Some(err) = bus.take_fault() {
                log::error!("CPU halted on bus fault at PC=0x{:04X}: {}", self.regs.pc, err);
                return Err(err);
            }

            if self.halted && !self.interrupt_ready() {
                thread::sleep(self.halt_poll);
            }
        }
    }
}
