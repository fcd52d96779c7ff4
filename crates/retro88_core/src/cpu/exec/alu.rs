use crate::cpu::{alu, Bus, Cpu};

impl Cpu {
    pub(super) fn exec_alu_reg<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        debug_assert!((0x80..=0xBF).contains(&opcode));
        let src = opcode & 0x07;
        let value = self.read_reg8(bus, src);
        self.alu_op((opcode >> 3) & 0x07, value);
        if src == 6 { 7 } else { 4 }
    }

    pub(super) fn exec_alu_imm<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        debug_assert!(opcode & 0xC7 == 0xC6);
        let value = self.fetch8(bus);
        self.alu_op((opcode >> 3) & 0x07, value);
        7
    }

    pub(super) fn exec_rotate_a(&mut self, opcode: u8) -> u32 {
        debug_assert!(matches!(opcode, 0x07 | 0x0F | 0x17 | 0x1F));
        let (result, flags) = alu::rotate_a(opcode >> 3, self.regs.a, self.flags());
        self.regs.a = result;
        self.set_flags(flags);
        4
    }

    pub(super) fn exec_acc_misc(&mut self, opcode: u8) -> u32 {
        let a = self.regs.a;
        let flags = self.flags();
        match opcode {
            0x27 => {
                let (result, flags) = alu::daa(a, flags);
                self.regs.a = result;
                self.set_flags(flags);
            }
            0x2F => {
                let (result, flags) = alu::cpl(a, flags);
                self.regs.a = result;
                self.set_flags(flags);
            }
            0x37 => self.set_flags(alu::scf(a, flags)),
            0x3F => self.set_flags(alu::ccf(a, flags)),
            _ => unreachable!("not an accumulator op: 0x{opcode:02X}"),
        }
        4
    }

    pub(super) fn exec_add_hl_rr(&mut self, opcode: u8) -> u32 {
        debug_assert!(matches!(opcode, 0x09 | 0x19 | 0x29 | 0x39));
        let value = self.read_rr(opcode >> 4);
        let (result, flags) = alu::add16(self.regs.hl(), value, self.flags());
        self.regs.set_hl(result);
        self.set_flags(flags);
        11
    }
}
