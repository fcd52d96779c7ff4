use crate::cpu::{Bus, Cpu};

impl Cpu {
    pub(super) fn exec_jp<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.regs.pc = self.fetch16(bus);
        10
    }

    /// JP cc, nn costs the same whether or not the jump is taken.
    pub(super) fn exec_jp_cc<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let target = self.fetch16(bus);
        if self.condition(opcode >> 3) {
            self.regs.pc = target;
        }
        10
    }

    pub(super) fn exec_jp_hl(&mut self) -> u32 {
        self.regs.pc = self.regs.hl();
        4
    }

    pub(super) fn exec_jr_cc<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        debug_assert!(matches!(opcode, 0x20 | 0x28 | 0x30 | 0x38));
        let taken = self.condition((opcode >> 3) & 0x03);
        self.jr(bus, taken)
    }

    pub(super) fn exec_djnz<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.regs.b = self.regs.b.wrapping_sub(1);
        let taken = self.regs.b != 0;
        // Taken: 13, not taken: 8 (one more than JR).
        self.jr(bus, taken) + 1
    }

    pub(super) fn exec_call<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let target = self.fetch16(bus);
        self.call(bus, target);
        17
    }

    pub(super) fn exec_call_cc<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let target = self.fetch16(bus);
        if self.condition(opcode >> 3) {
            self.call(bus, target);
            17
        } else {
            10
        }
    }

    pub(super) fn exec_ret<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.regs.pc = self.pop16(bus);
        10
    }

    pub(super) fn exec_ret_cc<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        if self.condition(opcode >> 3) {
            self.regs.pc = self.pop16(bus);
            11
        } else {
            5
        }
    }

    pub(super) fn exec_rst<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        self.call(bus, (opcode & 0x38) as u16);
        11
    }
}
