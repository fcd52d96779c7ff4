//! Flag computation for every arithmetic, logic, rotate and bit operation.
//!
//! Each helper takes its operands (and the incoming flags where some of them
//! are preserved) and returns the result together with the new F register.
//! Opcode handlers never compute flags themselves.

use super::Flags;

const fn build_parity() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() % 2 == 0;
        i += 1;
    }
    table
}

/// Even-parity lookup, indexed by byte value.
pub const PARITY: [bool; 256] = build_parity();

#[inline]
pub fn parity(value: u8) -> bool {
    PARITY[value as usize]
}

/// S, Z and the two undocumented bits taken from `value`.
#[inline]
pub fn sz53(value: u8) -> Flags {
    let mut flags = Flags::from_bits_retain(value & 0xA8);
    flags.set(Flags::Z, value == 0);
    flags
}

/// `sz53` plus P/V as even parity.
#[inline]
pub fn sz53p(value: u8) -> Flags {
    let mut flags = sz53(value);
    flags.set(Flags::PV, parity(value));
    flags
}

#[inline]
fn xy(value: u8) -> Flags {
    Flags::from_bits_retain(value & 0x28)
}

pub fn add8(a: u8, value: u8, carry: bool) -> (u8, Flags) {
    let wide = a as u16 + value as u16 + carry as u16;
    let result = wide as u8;
    let mut flags = sz53(result);
    flags.set(Flags::H, (a ^ value ^ result) & 0x10 != 0);
    flags.set(Flags::PV, !(a ^ value) & (a ^ result) & 0x80 != 0);
    flags.set(Flags::C, wide > 0xFF);
    (result, flags)
}

pub fn sub8(a: u8, value: u8, carry: bool) -> (u8, Flags) {
    let wide = (a as i16) - (value as i16) - (carry as i16);
    let result = wide as u8;
    let mut flags = sz53(result) | Flags::N;
    flags.set(Flags::H, (a ^ value ^ result) & 0x10 != 0);
    flags.set(Flags::PV, (a ^ value) & (a ^ result) & 0x80 != 0);
    flags.set(Flags::C, wide < 0);
    (result, flags)
}

/// Compare: subtraction flags, except bits 5/3 come from the operand.
pub fn cp8(a: u8, value: u8) -> Flags {
    let (_, flags) = sub8(a, value, false);
    (flags - (Flags::Y | Flags::X)) | xy(value)
}

pub fn and8(a: u8, value: u8) -> (u8, Flags) {
    let result = a & value;
    (result, sz53p(result) | Flags::H)
}

pub fn or8(a: u8, value: u8) -> (u8, Flags) {
    let result = a | value;
    (result, sz53p(result))
}

pub fn xor8(a: u8, value: u8) -> (u8, Flags) {
    let result = a ^ value;
    (result, sz53p(result))
}

pub fn inc8(value: u8, flags: Flags) -> (u8, Flags) {
    let result = value.wrapping_add(1);
    let mut out = sz53(result) | (flags & Flags::C);
    out.set(Flags::H, value & 0x0F == 0x0F);
    out.set(Flags::PV, value == 0x7F);
    (result, out)
}

pub fn dec8(value: u8, flags: Flags) -> (u8, Flags) {
    let result = value.wrapping_sub(1);
    let mut out = sz53(result) | (flags & Flags::C) | Flags::N;
    out.set(Flags::H, value & 0x0F == 0);
    out.set(Flags::PV, value == 0x80);
    (result, out)
}

/// `ADD rr,rr`: S, Z and P/V are preserved.
pub fn add16(a: u16, value: u16, flags: Flags) -> (u16, Flags) {
    let wide = a as u32 + value as u32;
    let result = wide as u16;
    let mut out = (flags & (Flags::S | Flags::Z | Flags::PV)) | xy((result >> 8) as u8);
    out.set(Flags::H, (a ^ value ^ result) & 0x1000 != 0);
    out.set(Flags::C, wide > 0xFFFF);
    (result, out)
}

pub fn adc16(a: u16, value: u16, carry: bool) -> (u16, Flags) {
    let wide = a as u32 + value as u32 + carry as u32;
    let result = wide as u16;
    let mut flags = sz53((result >> 8) as u8);
    flags.set(Flags::Z, result == 0);
    flags.set(Flags::H, (a ^ value ^ result) & 0x1000 != 0);
    flags.set(Flags::PV, !(a ^ value) & (a ^ result) & 0x8000 != 0);
    flags.set(Flags::C, wide > 0xFFFF);
    (result, flags)
}

pub fn sbc16(a: u16, value: u16, carry: bool) -> (u16, Flags) {
    let wide = (a as i32) - (value as i32) - (carry as i32);
    let result = wide as u16;
    let mut flags = sz53((result >> 8) as u8) | Flags::N;
    flags.set(Flags::Z, result == 0);
    flags.set(Flags::H, (a ^ value ^ result) & 0x1000 != 0);
    flags.set(Flags::PV, (a ^ value) & (a ^ result) & 0x8000 != 0);
    flags.set(Flags::C, wide < 0);
    (result, flags)
}

/// CB-prefix rotate/shift selected by `op` (the `y` field of the opcode):
/// RLC, RRC, RL, RR, SLA, SRA, SLL, SRL.
pub fn rotate_shift(op: u8, value: u8, carry: bool) -> (u8, Flags) {
    let (result, carry_out) = match op & 0x07 {
        0 => (value.rotate_left(1), value & 0x80 != 0),
        1 => (value.rotate_right(1), value & 0x01 != 0),
        2 => ((value << 1) | carry as u8, value & 0x80 != 0),
        3 => ((value >> 1) | ((carry as u8) << 7), value & 0x01 != 0),
        4 => (value << 1, value & 0x80 != 0),
        5 => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
        6 => ((value << 1) | 0x01, value & 0x80 != 0),
        _ => (value >> 1, value & 0x01 != 0),
    };
    let mut flags = sz53p(result);
    flags.set(Flags::C, carry_out);
    (result, flags)
}

/// RLCA, RRCA, RLA, RRA (`op` 0..=3). Only H, N, C and bits 5/3 change.
pub fn rotate_a(op: u8, a: u8, flags: Flags) -> (u8, Flags) {
    let (result, shifted) = rotate_shift(op & 0x03, a, flags.contains(Flags::C));
    let out = (flags & (Flags::S | Flags::Z | Flags::PV)) | xy(result) | (shifted & Flags::C);
    (result, out)
}

/// `BIT n`. Bits 5/3 are taken from `xy_source`: the operand for register
/// forms, the high byte of the effective address for memory forms.
pub fn bit(n: u8, value: u8, xy_source: u8, flags: Flags) -> Flags {
    let set = value & (1 << n) != 0;
    let mut out = (flags & Flags::C) | Flags::H | xy(xy_source);
    out.set(Flags::Z, !set);
    out.set(Flags::PV, !set);
    out.set(Flags::S, n == 7 && set);
    out
}

#[inline]
pub fn set_bit(n: u8, value: u8) -> u8 {
    value | (1 << n)
}

#[inline]
pub fn reset_bit(n: u8, value: u8) -> u8 {
    value & !(1 << n)
}

pub fn daa(a: u8, flags: Flags) -> (u8, Flags) {
    let low = a & 0x0F;
    let mut correction = 0u8;
    let mut carry = flags.contains(Flags::C);
    if flags.contains(Flags::H) || low > 9 {
        correction |= 0x06;
    }
    if carry || a > 0x99 {
        correction |= 0x60;
        carry = true;
    }
    let subtract = flags.contains(Flags::N);
    let (result, half) = if subtract {
        (a.wrapping_sub(correction), flags.contains(Flags::H) && low < 6)
    } else {
        (a.wrapping_add(correction), low > 9)
    };
    let mut out = sz53p(result) | (flags & Flags::N);
    out.set(Flags::H, half);
    out.set(Flags::C, carry);
    (result, out)
}

pub fn cpl(a: u8, flags: Flags) -> (u8, Flags) {
    let result = !a;
    let keep = flags & (Flags::S | Flags::Z | Flags::PV | Flags::C);
    (result, keep | Flags::H | Flags::N | xy(result))
}

pub fn scf(a: u8, flags: Flags) -> Flags {
    (flags & (Flags::S | Flags::Z | Flags::PV)) | Flags::C | xy(a)
}

pub fn ccf(a: u8, flags: Flags) -> Flags {
    let carry = flags.contains(Flags::C);
    let mut out = (flags & (Flags::S | Flags::Z | Flags::PV)) | xy(a);
    out.set(Flags::H, carry);
    out.set(Flags::C, !carry);
    out
}

pub fn neg(a: u8) -> (u8, Flags) {
    sub8(0, a, false)
}

/// `RLD`: returns (new A, new (HL), flags).
pub fn rld(a: u8, mem: u8, flags: Flags) -> (u8, u8, Flags) {
    let new_mem = (mem << 4) | (a & 0x0F);
    let new_a = (a & 0xF0) | (mem >> 4);
    (new_a, new_mem, sz53p(new_a) | (flags & Flags::C))
}

/// `RRD`: returns (new A, new (HL), flags).
pub fn rrd(a: u8, mem: u8, flags: Flags) -> (u8, u8, Flags) {
    let new_mem = (a << 4) | (mem >> 4);
    let new_a = (a & 0xF0) | (mem & 0x0F);
    (new_a, new_mem, sz53p(new_a) | (flags & Flags::C))
}

/// `LD A,I` / `LD A,R`: P/V reports IFF2.
pub fn ld_a_ir(value: u8, iff2: bool, flags: Flags) -> Flags {
    let mut out = sz53(value) | (flags & Flags::C);
    out.set(Flags::PV, iff2);
    out
}
