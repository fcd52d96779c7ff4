use crate::cpu::{Bus, Cpu};

impl Cpu {
    /// HALT: PC is left on the HALT opcode; interrupt entry steps past it.
    pub(super) fn exec_halt(&mut self) -> u32 {
        self.halted = true;
        self.regs.pc = self.regs.pc.wrapping_sub(1);
        log::trace!("HALT at PC=0x{:04X}", self.regs.pc);
        4
    }

    pub(super) fn exec_di(&mut self) -> u32 {
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        4
    }

    pub(super) fn exec_ei(&mut self) -> u32 {
        self.regs.iff1 = true;
        self.regs.iff2 = true;
        self.ei_delay = true;
        4
    }

    pub(super) fn exec_in_a_n<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let port = self.fetch8(bus);
        self.regs.a = bus.in_port(port);
        11
    }

    pub(super) fn exec_out_n_a<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let port = self.fetch8(bus);
        bus.out_port(port, self.regs.a);
        11
    }
}
