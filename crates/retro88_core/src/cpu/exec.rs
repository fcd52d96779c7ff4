mod alu;
mod control;
mod incdec;
mod ld;
mod stack;
mod system;

use super::index::IndexReg;
use super::{Bus, Cpu};

impl Cpu {
    /// Decode and execute one unprefixed opcode (PC already past it) and
    /// return its T-states. Prefix bytes hand off to the CB, ED and index
    /// decoders.
    pub(super) fn exec_opcode<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        match opcode {
            // NOP
            0x00 => 4,

            // LD rr, nn
            0x01 | 0x11 | 0x21 | 0x31 => self.exec_ld_rr_nn(bus, opcode),

            // LD (BC/DE), A and LD A, (BC/DE)
            0x02 | 0x12 => self.exec_ld_indirect_a(bus, opcode),
            0x0A | 0x1A => self.exec_ld_a_indirect(bus, opcode),

            // LD (nn), HL / LD HL, (nn) / LD (nn), A / LD A, (nn)
            0x22 | 0x2A | 0x32 | 0x3A => self.exec_ld_direct(bus, opcode),

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 => self.exec_inc16(opcode),
            0x0B | 0x1B | 0x2B | 0x3B => self.exec_dec16(opcode),

            // INC r / DEC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => self.exec_inc8(bus, opcode),
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => self.exec_dec8(bus, opcode),

            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => self.exec_ld_r_n(bus, opcode),

            // RLCA, RRCA, RLA, RRA
            0x07 | 0x0F | 0x17 | 0x1F => self.exec_rotate_a(opcode),

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => self.exec_add_hl_rr(opcode),

            // EX AF, AF' / EXX / EX DE, HL / EX (SP), HL
            0x08 | 0xD9 | 0xEB | 0xE3 => self.exec_exchange(bus, opcode),

            // DJNZ e
            0x10 => self.exec_djnz(bus),

            // JR e / JR cc, e
            0x18 => self.jr(bus, true),
            0x20 | 0x28 | 0x30 | 0x38 => self.exec_jr_cc(bus, opcode),

            // DAA, CPL, SCF, CCF
            0x27 | 0x2F | 0x37 | 0x3F => self.exec_acc_misc(opcode),

            // HALT sits inside the LD r, r block.
            0x76 => self.exec_halt(),
            0x40..=0x75 | 0x77..=0x7F => self.exec_ld_r_r(bus, opcode),

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP r
            0x80..=0xBF => self.exec_alu_reg(bus, opcode),

            // RET cc / RET
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => self.exec_ret_cc(bus, opcode),
            0xC9 => self.exec_ret(bus),

            // POP qq / PUSH qq
            0xC1 | 0xD1 | 0xE1 | 0xF1 => self.exec_pop(bus, opcode),
            0xC5 | 0xD5 | 0xE5 | 0xF5 => self.exec_push(bus, opcode),

            // JP cc, nn / JP nn / JP (HL)
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => self.exec_jp_cc(bus, opcode),
            0xC3 => self.exec_jp(bus),
            0xE9 => self.exec_jp_hl(),

            // CALL cc, nn / CALL nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                self.exec_call_cc(bus, opcode)
            }
            0xCD => self.exec_call(bus),

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => self.exec_alu_imm(bus, opcode),

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => self.exec_rst(bus, opcode),

            // OUT (n), A / IN A, (n)
            0xD3 => self.exec_out_n_a(bus),
            0xDB => self.exec_in_a_n(bus),

            // LD SP, HL
            0xF9 => self.exec_ld_sp_hl(),

            // DI / EI
            0xF3 => self.exec_di(),
            0xFB => self.exec_ei(),

            // Prefixes.
            0xCB => self.exec_cb(bus),
            0xED => self.exec_ed(bus),
            0xDD => self.exec_index(bus, IndexReg::Ix),
            0xFD => self.exec_index(bus, IndexReg::Iy),
        }
    }
}
