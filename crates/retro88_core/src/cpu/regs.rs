use bitflags::bitflags;

bitflags! {
    /// Flag bits of the F register.
    ///
    /// Every bit of F is named, including the two undocumented copies of
    /// result bits 5 and 3, so converting to and from a raw byte is lossless.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Sign.
        const S = 0x80;
        /// Zero.
        const Z = 0x40;
        /// Copy of result bit 5.
        const Y = 0x20;
        /// Half carry.
        const H = 0x10;
        /// Copy of result bit 3.
        const X = 0x08;
        /// Parity / overflow.
        const PV = 0x04;
        /// Add / subtract.
        const N = 0x02;
        /// Carry.
        const C = 0x01;
    }
}

/// Interrupt acknowledge protocol selected by `IM n`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterruptMode {
    Im0,
    Im1,
    #[default]
    Im2,
}

/// 8-bit registers addressable by name (debugger access).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg8 {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    I,
    R,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
}

/// 16-bit registers addressable by name (debugger access).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg16 {
    Af,
    Bc,
    De,
    Hl,
    Sp,
    Pc,
    Ix,
    Iy,
    AfAlt,
    BcAlt,
    DeAlt,
    HlAlt,
}

/// Complete CPU-visible state of the Z80.
///
/// The shadow set is kept as opaque 16-bit words; it is only ever swapped
/// wholesale by `EX AF,AF'` and `EXX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    /// Refresh counter, low 7 bits only.
    r: u8,
    /// Bit 7 of R, only changed by `LD R,A`.
    r7: u8,
    pub sp: u16,
    pub pc: u16,
    pub ix: u16,
    pub iy: u16,
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub iff1: bool,
    pub iff2: bool,
    pub im: InterruptMode,
}

impl Registers {
    /// Register state after machine reset: everything zero except both
    /// interrupt flip-flops set and interrupt mode 2.
    pub fn power_on() -> Self {
        Self {
            iff1: true,
            iff2: true,
            im: InterruptMode::Im2,
            ..Self::default()
        }
    }

    #[inline]
    pub fn f(&self) -> u8 {
        self.f.bits()
    }

    #[inline]
    pub fn set_f(&mut self, value: u8) {
        self.f = Flags::from_bits_retain(value);
    }

    #[inline]
    pub fn flag(&self, flag: Flags) -> bool {
        self.f.contains(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Flags, value: bool) {
        self.f.set(flag, value);
    }

    #[inline]
    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f()])
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.set_f(f);
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        let [b, c] = value.to_be_bytes();
        self.b = b;
        self.c = c;
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        let [d, e] = value.to_be_bytes();
        self.d = d;
        self.e = e;
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        let [h, l] = value.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    #[inline]
    pub fn r(&self) -> u8 {
        (self.r & 0x7F) | self.r7
    }

    #[inline]
    pub fn set_r(&mut self, value: u8) {
        self.r = value & 0x7F;
        self.r7 = value & 0x80;
    }

    /// Advance the refresh counter by one opcode fetch. Bit 7 is untouched.
    #[inline]
    pub(crate) fn bump_r(&mut self) {
        self.r = self.r.wrapping_add(1) & 0x7F;
    }

    /// Take back one fetch's worth of refresh, for a byte that will be
    /// fetched again.
    #[inline]
    pub(crate) fn unbump_r(&mut self) {
        self.r = self.r.wrapping_sub(1) & 0x7F;
    }

    pub fn ex_af(&mut self) {
        let current = self.af();
        self.set_af(self.af_alt);
        self.af_alt = current;
    }

    pub fn exx(&mut self) {
        let (bc, de, hl) = (self.bc(), self.de(), self.hl());
        self.set_bc(self.bc_alt);
        self.set_de(self.de_alt);
        self.set_hl(self.hl_alt);
        self.bc_alt = bc;
        self.de_alt = de;
        self.hl_alt = hl;
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.a,
            Reg8::F => self.f(),
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
            Reg8::I => self.i,
            Reg8::R => self.r(),
            Reg8::Ixh => (self.ix >> 8) as u8,
            Reg8::Ixl => self.ix as u8,
            Reg8::Iyh => (self.iy >> 8) as u8,
            Reg8::Iyl => self.iy as u8,
        }
    }

    pub fn set8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::A => self.a = value,
            Reg8::F => self.set_f(value),
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => self.h = value,
            Reg8::L => self.l = value,
            Reg8::I => self.i = value,
            Reg8::R => self.set_r(value),
            Reg8::Ixh => self.ix = (self.ix & 0x00FF) | ((value as u16) << 8),
            Reg8::Ixl => self.ix = (self.ix & 0xFF00) | value as u16,
            Reg8::Iyh => self.iy = (self.iy & 0x00FF) | ((value as u16) << 8),
            Reg8::Iyl => self.iy = (self.iy & 0xFF00) | value as u16,
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::Af => self.af(),
            Reg16::Bc => self.bc(),
            Reg16::De => self.de(),
            Reg16::Hl => self.hl(),
            Reg16::Sp => self.sp,
            Reg16::Pc => self.pc,
            Reg16::Ix => self.ix,
            Reg16::Iy => self.iy,
            Reg16::AfAlt => self.af_alt,
            Reg16::BcAlt => self.bc_alt,
            Reg16::DeAlt => self.de_alt,
            Reg16::HlAlt => self.hl_alt,
        }
    }

    pub fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::Af => self.set_af(value),
            Reg16::Bc => self.set_bc(value),
            Reg16::De => self.set_de(value),
            Reg16::Hl => self.set_hl(value),
            Reg16::Sp => self.sp = value,
            Reg16::Pc => self.pc = value,
            Reg16::Ix => self.ix = value,
            Reg16::Iy => self.iy = value,
            Reg16::AfAlt => self.af_alt = value,
            Reg16::BcAlt => self.bc_alt = value,
            Reg16::DeAlt => self.de_alt = value,
            Reg16::HlAlt => self.hl_alt = value,
        }
    }
}
