use crate::cpu::{alu, Bus, Cpu};

impl Cpu {
    pub(super) fn exec_inc8<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let index = (opcode >> 3) & 0x07;
        let value = self.read_reg8(bus, index);
        let (result, flags) = alu::inc8(value, self.flags());
        self.write_reg8(bus, index, result);
        self.set_flags(flags);
        if index == 6 { 11 } else { 4 }
    }

    pub(super) fn exec_dec8<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let index = (opcode >> 3) & 0x07;
        let value = self.read_reg8(bus, index);
        let (result, flags) = alu::dec8(value, self.flags());
        self.write_reg8(bus, index, result);
        self.set_flags(flags);
        if index == 6 { 11 } else { 4 }
    }

    // 16-bit INC/DEC leave the flags alone.
    pub(super) fn exec_inc16(&mut self, opcode: u8) -> u32 {
        let index = opcode >> 4;
        let value = self.read_rr(index).wrapping_add(1);
        self.write_rr(index, value);
        6
    }

    pub(super) fn exec_dec16(&mut self, opcode: u8) -> u32 {
        let index = opcode >> 4;
        let value = self.read_rr(index).wrapping_sub(1);
        self.write_rr(index, value);
        6
    }
}
