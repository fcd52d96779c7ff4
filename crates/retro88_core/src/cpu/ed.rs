use super::{alu, Bus, Cpu, Flags, InterruptMode};

impl Cpu {
    /// ED-prefixed instructions. Opcodes outside the documented set (and
    /// their usual mirrors) execute as 8 T-state no-ops.
    pub(super) fn exec_ed<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let at = self.regs.pc.wrapping_sub(1);
        let op = self.fetch_opcode(bus);
        let y = (op >> 3) & 0x07;

        match op {
            0x40..=0x7F => match op & 0x07 {
                // IN r, (C); field 6 only sets flags.
                0 => {
                    let value = bus.in_port(self.regs.c);
                    self.set_flags(alu::sz53p(value) | (self.flags() & Flags::C));
                    if y != 6 {
                        self.write_reg8(bus, y, value);
                    }
                    12
                }
                // OUT (C), r; field 6 writes zero.
                1 => {
                    let value = if y == 6 { 0 } else { self.read_reg8(bus, y) };
                    bus.out_port(self.regs.c, value);
                    12
                }
                // SBC HL, rr / ADC HL, rr
                2 => {
                    let value = self.read_rr(y >> 1);
                    let hl = self.regs.hl();
                    let (result, flags) = if op & 0x08 == 0 {
                        alu::sbc16(hl, value, self.carry())
                    } else {
                        alu::adc16(hl, value, self.carry())
                    };
                    self.regs.set_hl(result);
                    self.set_flags(flags);
                    15
                }
                // LD (nn), rr / LD rr, (nn)
                3 => {
                    let addr = self.fetch16(bus);
                    if op & 0x08 == 0 {
                        bus.poke_word(addr, self.read_rr(y >> 1));
                    } else {
                        let value = bus.peek_word(addr);
                        self.write_rr(y >> 1, value);
                    }
                    20
                }
                4 => {
                    let (result, flags) = alu::neg(self.regs.a);
                    self.regs.a = result;
                    self.set_flags(flags);
                    8
                }
                // RETN / RETI (and mirrors): both restore IFF1 from IFF2.
                5 => {
                    self.regs.pc = self.pop16(bus);
                    self.regs.iff1 = self.regs.iff2;
                    14
                }
                6 => {
                    self.regs.im = match y & 0x03 {
                        0 | 1 => InterruptMode::Im0,
                        2 => InterruptMode::Im1,
                        _ => InterruptMode::Im2,
                    };
                    8
                }
                _ => self.exec_ed_misc(bus, op, at),
            },

            0xA0..=0xA3 | 0xA8..=0xAB | 0xB0..=0xB3 | 0xB8..=0xBB => self.exec_block(bus, op),

            _ => {
                self.note_unimplemented("ED ", op, at);
                8
            }
        }
    }

    fn exec_ed_misc<B: Bus>(&mut self, bus: &mut B, op: u8, at: u16) -> u32 {
        match op {
            0x47 => {
                self.regs.i = self.regs.a;
                9
            }
            0x4F => {
                self.regs.set_r(self.regs.a);
                9
            }
            0x57 | 0x5F => {
                let value = if op == 0x57 { self.regs.i } else { self.regs.r() };
                self.regs.a = value;
                self.set_flags(alu::ld_a_ir(value, self.regs.iff2, self.flags()));
                9
            }
            0x67 | 0x6F => {
                let addr = self.regs.hl();
                let mem = bus.peek_byte(addr);
                let (a, mem, flags) = if op == 0x67 {
                    alu::rrd(self.regs.a, mem, self.flags())
                } else {
                    alu::rld(self.regs.a, mem, self.flags())
                };
                bus.poke_byte(addr, mem);
                self.regs.a = a;
                self.set_flags(flags);
                18
            }
            _ => {
                self.note_unimplemented("ED ", op, at);
                8
            }
        }
    }
}
