//! DD/FD prefixes: IX/IY stand in for HL, IXH/IXL (IYH/IYL) for H/L and
//! `(IX+d)` for `(HL)`. Opcodes that do not touch HL run unchanged with the
//! prefix's 4 T-states added.

use super::{alu, Bus, Cpu};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum IndexReg {
    Ix,
    Iy,
}

impl Cpu {
    #[inline]
    fn index(&self, which: IndexReg) -> u16 {
        match which {
            IndexReg::Ix => self.regs.ix,
            IndexReg::Iy => self.regs.iy,
        }
    }

    #[inline]
    fn set_index(&mut self, which: IndexReg, value: u16) {
        match which {
            IndexReg::Ix => self.regs.ix = value,
            IndexReg::Iy => self.regs.iy = value,
        }
    }

    /// Register by 3-bit field with H/L replaced by the index halves.
    /// Field 6 (memory) is never passed here.
    fn read_index8(&self, which: IndexReg, field: u8) -> u8 {
        debug_assert!(field != 6);
        match field & 0x07 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => (self.index(which) >> 8) as u8,
            5 => self.index(which) as u8,
            _ => self.regs.a,
        }
    }

    fn write_index8(&mut self, which: IndexReg, field: u8, value: u8) {
        debug_assert!(field != 6);
        let idx = self.index(which);
        match field & 0x07 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.set_index(which, (idx & 0x00FF) | ((value as u16) << 8)),
            5 => self.set_index(which, (idx & 0xFF00) | value as u16),
            _ => self.regs.a = value,
        }
    }

    pub(super) fn exec_index<B: Bus>(&mut self, bus: &mut B, which: IndexReg) -> u32 {
        let opcode = self.fetch_opcode(bus);
        let idx = self.index(which);

        match opcode {
            // ADD IX, rr (rr=2 is IX itself)
            0x09 | 0x19 | 0x29 | 0x39 => {
                let field = opcode >> 4;
                let value = if field == 2 { idx } else { self.read_rr(field) };
                let (result, flags) = alu::add16(idx, value, self.flags());
                self.set_index(which, result);
                self.set_flags(flags);
                15
            }

            // LD IX, nn
            0x21 => {
                let value = self.fetch16(bus);
                self.set_index(which, value);
                14
            }

            // LD (nn), IX / LD IX, (nn)
            0x22 => {
                let addr = self.fetch16(bus);
                bus.poke_word(addr, idx);
                20
            }
            0x2A => {
                let addr = self.fetch16(bus);
                let value = bus.peek_word(addr);
                self.set_index(which, value);
                20
            }

            // INC IX / DEC IX
            0x23 => {
                self.set_index(which, idx.wrapping_add(1));
                10
            }
            0x2B => {
                self.set_index(which, idx.wrapping_sub(1));
                10
            }

            // INC/DEC IXH, IXL
            0x24 | 0x2C | 0x25 | 0x2D => {
                let field = (opcode >> 3) & 0x07;
                let value = self.read_index8(which, field);
                let (result, flags) = if opcode & 0x01 == 0 {
                    alu::inc8(value, self.flags())
                } else {
                    alu::dec8(value, self.flags())
                };
                self.write_index8(which, field, result);
                self.set_flags(flags);
                8
            }

            // LD IXH, n / LD IXL, n
            0x26 | 0x2E => {
                let value = self.fetch8(bus);
                self.write_index8(which, (opcode >> 3) & 0x07, value);
                11
            }

            // INC (IX+d) / DEC (IX+d)
            0x34 | 0x35 => {
                let addr = self.fetch_displaced(bus, idx);
                let value = bus.peek_byte(addr);
                let (result, flags) = if opcode == 0x34 {
                    alu::inc8(value, self.flags())
                } else {
                    alu::dec8(value, self.flags())
                };
                bus.poke_byte(addr, result);
                self.set_flags(flags);
                23
            }

            // LD (IX+d), n
            0x36 => {
                let addr = self.fetch_displaced(bus, idx);
                let value = self.fetch8(bus);
                bus.poke_byte(addr, value);
                19
            }

            // HALT is unaffected by the prefix.
            0x76 => self.exec_opcode(bus, opcode) + 4,

            // LD r, r' with index substitution
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 0x07;
                let src = opcode & 0x07;
                if src == 6 {
                    // LD r, (IX+d) loads the real H/L.
                    let addr = self.fetch_displaced(bus, idx);
                    let value = bus.peek_byte(addr);
                    self.write_reg8(bus, dst, value);
                    19
                } else if dst == 6 {
                    let addr = self.fetch_displaced(bus, idx);
                    let value = self.read_reg8(bus, src);
                    bus.poke_byte(addr, value);
                    19
                } else {
                    let value = self.read_index8(which, src);
                    self.write_index8(which, dst, value);
                    8
                }
            }

            // ALU A, r with index substitution
            0x80..=0xBF => {
                let src = opcode & 0x07;
                let (value, cycles) = if src == 6 {
                    let addr = self.fetch_displaced(bus, idx);
                    (bus.peek_byte(addr), 19)
                } else {
                    (self.read_index8(which, src), 8)
                };
                self.alu_op((opcode >> 3) & 0x07, value);
                cycles
            }

            0xCB => self.exec_index_cb(bus, idx),

            // POP IX / PUSH IX
            0xE1 => {
                let value = self.pop16(bus);
                self.set_index(which, value);
                14
            }
            0xE5 => {
                self.push16(bus, idx);
                15
            }

            // EX (SP), IX
            0xE3 => {
                let top = bus.peek_word(self.regs.sp);
                bus.poke_word(self.regs.sp, idx);
                self.set_index(which, top);
                23
            }

            // JP (IX)
            0xE9 => {
                self.regs.pc = idx;
                8
            }

            // LD SP, IX
            0xF9 => {
                self.regs.sp = idx;
                10
            }

            // Another prefix: this one acts as a 4 T-state no-op and the
            // next byte is decoded afresh on the following step, which
            // refreshes for it again.
            0xDD | 0xFD | 0xED => {
                self.regs.pc = self.regs.pc.wrapping_sub(1);
                self.regs.unbump_r();
                4
            }

            _ => self.exec_opcode(bus, opcode) + 4,
        }
    }

    /// DDCB/FDCB: `d` precedes the operation byte. Non-BIT forms also copy
    /// the result into the register named by the low three bits, unless
    /// that field is 6.
    fn exec_index_cb<B: Bus>(&mut self, bus: &mut B, idx: u16) -> u32 {
        let addr = self.fetch_displaced(bus, idx);
        let op = self.fetch8(bus);
        let x = op >> 6;
        let y = (op >> 3) & 0x07;
        let z = op & 0x07;
        let value = bus.peek_byte(addr);

        if x == 1 {
            self.set_flags(alu::bit(y, value, (addr >> 8) as u8, self.flags()));
            return 20;
        }

        let result = match x {
            0 => {
                let (result, flags) = alu::rotate_shift(y, value, self.carry());
                self.set_flags(flags);
                result
            }
            2 => alu::reset_bit(y, value),
            _ => alu::set_bit(y, value),
        };
        bus.poke_byte(addr, result);
        if z != 6 {
            self.write_reg8(bus, z, result);
        }
        23
    }
}
