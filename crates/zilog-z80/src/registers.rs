//! Z80 register file.

/// The complete Z80 register file.
///
/// Every field is stored at its natural width, so no register can ever hold
/// an out-of-range value. Pair accessors split and join bytes in one call.
/// This struct doubles as the snapshot format: persisting it verbatim
/// captures all architectural state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    // Main registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Alternate registers
    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    // Other registers
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,

    /// WZ/MEMPTR - internal address latch.
    /// Only visible through X/Y of BIT n,(HL) and the block I/O flags.
    pub wz: u16,

    // Interrupt state
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,

    pub halted: bool,
}

impl Registers {
    /// Register state after /RESET.
    ///
    /// PC, I, R and the interrupt state are defined by the chip. AF and SP
    /// come up as 0xFFFF on real parts; everything else is cleared.
    #[must_use]
    pub fn power_on() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            sp: 0xFFFF,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    #[must_use]
    pub const fn af_alt(&self) -> u16 {
        (self.a_alt as u16) << 8 | self.f_alt as u16
    }

    #[must_use]
    pub const fn bc_alt(&self) -> u16 {
        (self.b_alt as u16) << 8 | self.c_alt as u16
    }

    #[must_use]
    pub const fn de_alt(&self) -> u16 {
        (self.d_alt as u16) << 8 | self.e_alt as u16
    }

    #[must_use]
    pub const fn hl_alt(&self) -> u16 {
        (self.h_alt as u16) << 8 | self.l_alt as u16
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    #[must_use]
    pub const fn ixh(&self) -> u8 {
        (self.ix >> 8) as u8
    }

    #[must_use]
    pub const fn ixl(&self) -> u8 {
        self.ix as u8
    }

    #[must_use]
    pub const fn iyh(&self) -> u8 {
        (self.iy >> 8) as u8
    }

    #[must_use]
    pub const fn iyl(&self) -> u8 {
        self.iy as u8
    }

    pub fn set_ixh(&mut self, value: u8) {
        self.ix = (self.ix & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_ixl(&mut self, value: u8) {
        self.ix = (self.ix & 0xFF00) | u16::from(value);
    }

    pub fn set_iyh(&mut self, value: u8) {
        self.iy = (self.iy & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_iyl(&mut self, value: u8) {
        self.iy = (self.iy & 0xFF00) | u16::from(value);
    }

    /// True if every bit of `mask` is set in F.
    #[must_use]
    pub const fn flag(&self, mask: u8) -> bool {
        self.f & mask == mask
    }

    /// Set or clear the bits of `mask` in F.
    pub fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.f |= mask;
        } else {
            self.f &= !mask;
        }
    }

    /// EX AF,AF'
    pub fn exchange_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        std::mem::swap(&mut self.f, &mut self.f_alt);
    }

    /// EXX - swap BC, DE and HL with their shadows.
    pub fn exchange_main(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }

    /// Bump the memory refresh counter. Bit 7 is left alone.
    pub fn inc_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{CF, ZF};

    #[test]
    fn power_on_state() {
        let regs = Registers::power_on();
        assert_eq!(regs.pc, 0);
        assert_eq!(regs.sp, 0xFFFF);
        assert_eq!(regs.af(), 0xFFFF);
        assert!(!regs.iff1 && !regs.iff2);
        assert_eq!(regs.im, 0);
        assert!(!regs.halted);
    }

    #[test]
    fn pairs_split_into_bytes() {
        let mut regs = Registers::default();
        regs.set_bc(0x1234);
        assert_eq!((regs.b, regs.c), (0x12, 0x34));
        regs.l = 0xCD;
        regs.h = 0xAB;
        assert_eq!(regs.hl(), 0xABCD);
    }

    #[test]
    fn index_halves_leave_other_half_alone() {
        let mut regs = Registers::default();
        regs.ix = 0x1234;
        regs.set_ixh(0xAB);
        assert_eq!(regs.ix, 0xAB34);
        regs.set_ixl(0xCD);
        assert_eq!(regs.ix, 0xABCD);
        regs.iy = 0xFFFF;
        regs.set_iyl(0);
        assert_eq!((regs.iyh(), regs.iyl()), (0xFF, 0x00));
    }

    #[test]
    fn r_keeps_bit_7() {
        let mut regs = Registers { r: 0xFF, ..Registers::default() };
        regs.inc_r();
        assert_eq!(regs.r, 0x80);
        regs.r = 0x7F;
        regs.inc_r();
        assert_eq!(regs.r, 0x00);
    }

    #[test]
    fn flag_bits() {
        let mut regs = Registers::default();
        regs.set_flag(ZF | CF, true);
        assert!(regs.flag(ZF));
        assert!(regs.flag(ZF | CF));
        regs.set_flag(CF, false);
        assert_eq!(regs.f, ZF);
    }

    #[test]
    fn exx_twice_is_identity() {
        let mut regs = Registers::default();
        regs.set_bc(0x0102);
        regs.set_de(0x0304);
        regs.set_hl(0x0506);
        let before = regs;
        regs.exchange_main();
        assert_eq!(regs.bc(), 0);
        assert_eq!(regs.bc_alt(), 0x0102);
        regs.exchange_main();
        assert_eq!(regs, before);
    }
}
