use super::{alu, Bus, Cpu, Flags};

impl Cpu {
    /// LDI/LDD/CPI/CPD/INI/IND/OUTI/OUTD and their repeating forms.
    ///
    /// Each call performs exactly one iteration. A repeating form whose
    /// continuation condition holds rewinds PC onto its own prefix so the
    /// next step runs it again, which keeps interrupts serviceable between
    /// iterations.
    pub(super) fn exec_block<B: Bus>(&mut self, bus: &mut B, op: u8) -> u32 {
        let decrement = op & 0x08 != 0;
        let repeat = op & 0x10 != 0;
        let again = match op & 0x03 {
            0 => self.block_ld(bus, decrement),
            1 => self.block_cp(bus, decrement),
            2 => self.block_in(bus, decrement),
            _ => self.block_out(bus, decrement),
        };
        if repeat && again {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }

    #[inline]
    fn step_hl(&mut self, decrement: bool) -> u16 {
        let hl = self.regs.hl();
        let next = if decrement { hl.wrapping_sub(1) } else { hl.wrapping_add(1) };
        self.regs.set_hl(next);
        hl
    }

    /// Returns whether BC is still non-zero.
    fn block_ld<B: Bus>(&mut self, bus: &mut B, decrement: bool) -> bool {
        let src = self.step_hl(decrement);
        let de = self.regs.de();
        let value = bus.peek_byte(src);
        bus.poke_byte(de, value);
        let next_de = if decrement { de.wrapping_sub(1) } else { de.wrapping_add(1) };
        self.regs.set_de(next_de);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let n = value.wrapping_add(self.regs.a);
        let mut flags = self.flags() & (Flags::S | Flags::Z | Flags::C);
        flags.set(Flags::PV, bc != 0);
        flags.set(Flags::Y, n & 0x02 != 0);
        flags.set(Flags::X, n & 0x08 != 0);
        self.set_flags(flags);
        bc != 0
    }

    /// Returns whether BC is non-zero and no match was found.
    fn block_cp<B: Bus>(&mut self, bus: &mut B, decrement: bool) -> bool {
        let addr = self.step_hl(decrement);
        let value = bus.peek_byte(addr);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let (result, sub) = alu::sub8(self.regs.a, value, false);
        let half = sub.contains(Flags::H);
        let n = result.wrapping_sub(half as u8);
        let mut flags = (sub & (Flags::S | Flags::Z | Flags::H | Flags::N)) | (self.flags() & Flags::C);
        flags.set(Flags::PV, bc != 0);
        flags.set(Flags::Y, n & 0x02 != 0);
        flags.set(Flags::X, n & 0x08 != 0);
        self.set_flags(flags);
        bc != 0 && !flags.contains(Flags::Z)
    }

    /// Returns whether B is still non-zero.
    fn block_in<B: Bus>(&mut self, bus: &mut B, decrement: bool) -> bool {
        let value = bus.in_port(self.regs.c);
        let addr = self.step_hl(decrement);
        bus.poke_byte(addr, value);
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.set_io_block_flags();
        self.regs.b != 0
    }

    /// Returns whether B is still non-zero.
    fn block_out<B: Bus>(&mut self, bus: &mut B, decrement: bool) -> bool {
        self.regs.b = self.regs.b.wrapping_sub(1);
        let addr = self.step_hl(decrement);
        let value = bus.peek_byte(addr);
        bus.out_port(self.regs.c, value);
        self.set_io_block_flags();
        self.regs.b != 0
    }

    fn set_io_block_flags(&mut self) {
        let flags = alu::sz53(self.regs.b) | Flags::N | (self.flags() & Flags::C);
        self.set_flags(flags);
    }
}
