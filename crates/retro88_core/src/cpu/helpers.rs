use super::{alu, Bus, Cpu, Flags};

impl Cpu {
    /// Fetch an opcode or prefix byte. Unlike operand fetches this advances
    /// the refresh counter.
    #[inline]
    pub(super) fn fetch_opcode<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.regs.bump_r();
        self.fetch8(bus)
    }

    #[inline]
    pub(super) fn fetch8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.peek_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    #[inline]
    pub(super) fn fetch16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus);
        let hi = self.fetch8(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Fetch a signed displacement and apply it to `base`.
    #[inline]
    pub(super) fn fetch_displaced<B: Bus>(&mut self, bus: &mut B, base: u16) -> u16 {
        let d = self.fetch8(bus) as i8;
        base.wrapping_add(d as u16)
    }

    /// Read an 8-bit operand by its 3-bit opcode field:
    /// 0=B, 1=C, 2=D, 3=E, 4=H, 5=L, 6=(HL), 7=A.
    #[inline]
    pub(super) fn read_reg8<B: Bus>(&mut self, bus: &mut B, index: u8) -> u8 {
        match index & 0x07 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => bus.peek_byte(self.regs.hl()),
            _ => self.regs.a,
        }
    }

    /// Write an 8-bit operand; encoding matches `read_reg8`.
    #[inline]
    pub(super) fn write_reg8<B: Bus>(&mut self, bus: &mut B, index: u8, value: u8) {
        match index & 0x07 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            6 => bus.poke_byte(self.regs.hl(), value),
            _ => self.regs.a = value,
        }
    }

    /// Register pair by 2-bit field: 0=BC, 1=DE, 2=HL, 3=SP.
    #[inline]
    pub(super) fn read_rr(&self, index: u8) -> u16 {
        match index & 0x03 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    #[inline]
    pub(super) fn write_rr(&mut self, index: u8, value: u16) {
        match index & 0x03 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.sp = value,
        }
    }

    /// Register pair for PUSH/POP: 0=BC, 1=DE, 2=HL, 3=AF.
    #[inline]
    pub(super) fn read_qq(&self, index: u8) -> u16 {
        match index & 0x03 {
            3 => self.regs.af(),
            other => self.read_rr(other),
        }
    }

    #[inline]
    pub(super) fn write_qq(&mut self, index: u8, value: u16) {
        match index & 0x03 {
            3 => self.regs.set_af(value),
            other => self.write_rr(other, value),
        }
    }

    #[inline]
    pub(super) fn push16<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        bus.poke_word(self.regs.sp, value);
    }

    #[inline]
    pub(super) fn pop16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let value = bus.peek_word(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    /// Branch condition by 3-bit field: NZ, Z, NC, C, PO, PE, P, M.
    #[inline]
    pub(super) fn condition(&self, cc: u8) -> bool {
        let f = self.flags();
        match cc & 0x07 {
            0 => !f.contains(Flags::Z),
            1 => f.contains(Flags::Z),
            2 => !f.contains(Flags::C),
            3 => f.contains(Flags::C),
            4 => !f.contains(Flags::PV),
            5 => f.contains(Flags::PV),
            6 => !f.contains(Flags::S),
            _ => f.contains(Flags::S),
        }
    }

    /// Apply one of the eight accumulator operations selected by the `y`
    /// field: ADD, ADC, SUB, SBC, AND, XOR, OR, CP.
    pub(super) fn alu_op(&mut self, op: u8, value: u8) {
        let a = self.regs.a;
        let carry = self.carry();
        let (result, flags) = match op & 0x07 {
            0 => alu::add8(a, value, false),
            1 => alu::add8(a, value, carry),
            2 => alu::sub8(a, value, false),
            3 => alu::sub8(a, value, carry),
            4 => alu::and8(a, value),
            5 => alu::xor8(a, value),
            6 => alu::or8(a, value),
            _ => (a, alu::cp8(a, value)),
        };
        self.regs.a = result;
        self.set_flags(flags);
    }

    /// Relative jump, taken or not. Returns T-states.
    #[inline]
    pub(super) fn jr<B: Bus>(&mut self, bus: &mut B, taken: bool) -> u32 {
        let d = self.fetch8(bus) as i8;
        if taken {
            self.regs.pc = self.regs.pc.wrapping_add(d as u16);
            12
        } else {
            7
        }
    }

    #[inline]
    pub(super) fn call<B: Bus>(&mut self, bus: &mut B, target: u16) {
        let ret = self.regs.pc;
        self.push16(bus, ret);
        self.regs.pc = target;
    }
}
