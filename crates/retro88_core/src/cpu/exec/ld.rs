use crate::cpu::{Bus, Cpu};

impl Cpu {
    pub(super) fn exec_ld_rr_nn<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        debug_assert!(matches!(opcode, 0x01 | 0x11 | 0x21 | 0x31));
        let value = self.fetch16(bus);
        self.write_rr(opcode >> 4, value);
        10
    }

    pub(super) fn exec_ld_indirect_a<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let addr = if opcode == 0x02 { self.regs.bc() } else { self.regs.de() };
        bus.poke_byte(addr, self.regs.a);
        7
    }

    pub(super) fn exec_ld_a_indirect<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let addr = if opcode == 0x0A { self.regs.bc() } else { self.regs.de() };
        self.regs.a = bus.peek_byte(addr);
        7
    }

    pub(super) fn exec_ld_direct<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let addr = self.fetch16(bus);
        match opcode {
            0x22 => {
                bus.poke_pair(addr, self.regs.h, self.regs.l);
                16
            }
            0x2A => {
                let value = bus.peek_word(addr);
                self.regs.set_hl(value);
                16
            }
            0x32 => {
                bus.poke_byte(addr, self.regs.a);
                13
            }
            0x3A => {
                self.regs.a = bus.peek_byte(addr);
                13
            }
            _ => unreachable!("not a direct load: 0x{opcode:02X}"),
        }
    }

    pub(super) fn exec_ld_r_n<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let dst = (opcode >> 3) & 0x07;
        let value = self.fetch8(bus);
        self.write_reg8(bus, dst, value);
        if dst == 6 { 10 } else { 7 }
    }

    pub(super) fn exec_ld_r_r<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        debug_assert!((0x40..=0x7F).contains(&opcode) && opcode != 0x76);
        let dst = (opcode >> 3) & 0x07;
        let src = opcode & 0x07;
        let value = self.read_reg8(bus, src);
        self.write_reg8(bus, dst, value);
        if dst == 6 || src == 6 { 7 } else { 4 }
    }

    pub(super) fn exec_ld_sp_hl(&mut self) -> u32 {
        self.regs.sp = self.regs.hl();
        6
    }

    pub(super) fn exec_exchange<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        match opcode {
            0x08 => {
                self.regs.ex_af();
                4
            }
            0xD9 => {
                self.regs.exx();
                4
            }
            0xEB => {
                let hl = self.regs.hl();
                self.regs.set_hl(self.regs.de());
                self.regs.set_de(hl);
                4
            }
            0xE3 => {
                let top = bus.peek_word(self.regs.sp);
                bus.poke_pair(self.regs.sp, self.regs.h, self.regs.l);
                self.regs.set_hl(top);
                19
            }
            _ => unreachable!("not an exchange: 0x{opcode:02X}"),
        }
    }
}
