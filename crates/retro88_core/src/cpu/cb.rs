use super::{alu, Bus, Cpu};

impl Cpu {
    /// CB-prefixed rotates, shifts and bit operations.
    pub(super) fn exec_cb<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let op = self.fetch_opcode(bus);
        let x = op >> 6;
        let y = (op >> 3) & 0x07;
        let z = op & 0x07;
        let value = self.read_reg8(bus, z);

        match x {
            0 => {
                let (result, flags) = alu::rotate_shift(y, value, self.carry());
                self.write_reg8(bus, z, result);
                self.set_flags(flags);
                if z == 6 { 15 } else { 8 }
            }
            1 => {
                let xy_source = if z == 6 { self.regs.h } else { value };
                self.set_flags(alu::bit(y, value, xy_source, self.flags()));
                if z == 6 { 12 } else { 8 }
            }
            _ => {
                let result = if x == 2 {
                    alu::reset_bit(y, value)
                } else {
                    alu::set_bit(y, value)
                };
                self.write_reg8(bus, z, result);
                if z == 6 { 15 } else { 8 }
            }
        }
    }
}
