use super::{Bus, Cpu, InterruptMode};
use crate::intc::InterruptController;

const NMI_VECTOR: u16 = 0x0066;
const IM1_VECTOR: u16 = 0x0038;

impl Cpu {
    /// Take a pending interrupt at an instruction boundary.
    ///
    /// NMI is taken regardless of IFF1. A maskable request needs IFF1 and
    /// `allow_maskable` (false right after `EI`). Returns the T-states of
    /// the entry sequence if one ran.
    pub(super) fn service_interrupts<B: Bus>(
        &mut self,
        bus: &mut B,
        allow_maskable: bool,
    ) -> Option<u32> {
        if self.signals.nmi_pending() {
            self.signals.clear_nmi();
            self.leave_halt();
            self.regs.iff2 = self.regs.iff1;
            self.regs.iff1 = false;
            self.regs.bump_r();
            let pc = self.regs.pc;
            self.call(bus, NMI_VECTOR);
            log::debug!(
                "NMI taken: pc=0x{:04X} sp=0x{:04X}",
                pc,
                self.regs.sp
            );
            return Some(11);
        }

        if !allow_maskable || !self.regs.iff1 || !self.signals.irq_asserted() {
            return None;
        }

        // Acknowledge exactly the channel sampled here; a tick source may
        // signal another one before the controller is told.
        let (channel, offset) = match &self.intc {
            Some(intc) => {
                let channel = intc.current_channel();
                intc.acknowledge_interrupt(channel);
                (channel, InterruptController::offset_of(channel))
            }
            None => {
                let channel = self.signals.irq_channel();
                self.signals.clear_irq();
                (channel, InterruptController::offset_of(channel))
            }
        };

        self.leave_halt();
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.bump_r();
        let pc = self.regs.pc;

        let cycles = match self.regs.im {
            InterruptMode::Im0 => {
                // The controller's offset is executed as if it had been
                // fetched from the data bus.
                log::debug!(
                    "IM0 interrupt: channel={} opcode=0x{:02X} pc=0x{:04X}",
                    channel,
                    offset as u8,
                    pc
                );
                2 + self.exec_opcode(bus, offset as u8)
            }
            InterruptMode::Im1 => {
                self.call(bus, IM1_VECTOR);
                log::debug!(
                    "IM1 interrupt: channel={} vector=0x{:04X} pc=0x{:04X} sp=0x{:04X}",
                    channel,
                    IM1_VECTOR,
                    pc,
                    self.regs.sp
                );
                13
            }
            InterruptMode::Im2 => {
                let table = ((self.regs.i as u16) << 8) | offset;
                let target = bus.peek_word(table);
                self.call(bus, target);
                log::debug!(
                    "IM2 interrupt: channel={} table=0x{:04X} target=0x{:04X} pc=0x{:04X} sp=0x{:04X}",
                    channel,
                    table,
                    target,
                    pc,
                    self.regs.sp
                );
                19
            }
        };
        Some(cycles)
    }

    /// Step off a HALT opcode so the pushed return address is the next
    /// instruction.
    #[inline]
    fn leave_halt(&mut self) {
        if self.halted {
            self.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    /// Whether an interrupt would be accepted at the next boundary.
    pub(super) fn interrupt_ready(&self) -> bool {
        self.signals.nmi_pending() || (self.regs.iff1 && self.signals.irq_asserted())
    }
}
