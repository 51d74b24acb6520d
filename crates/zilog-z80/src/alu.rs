//! ALU operations for the Z80.
//!
//! Every function here is pure: it takes operands (and the incoming carry
//! or flag byte where the instruction depends on it) and returns the result
//! together with a complete flag byte. Callers decide which of the old
//! flags survive.

#![allow(clippy::verbose_bit_mask)] // Clearer to read mask comparisons.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, flag_if, sz53, sz53p};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// The eight accumulator operations selected by bits 5-3 of 0x80-0xBF and
/// the `ALU A,n` immediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Self::Add,
            1 => Self::Adc,
            2 => Self::Sub,
            3 => Self::Sbc,
            4 => Self::And,
            5 => Self::Xor,
            6 => Self::Or,
            _ => Self::Cp,
        }
    }

    /// Apply to the accumulator. For `Cp` the returned value is the
    /// unchanged accumulator.
    #[must_use]
    pub fn apply(self, a: u8, b: u8, carry: bool) -> AluResult {
        match self {
            Self::Add => add8(a, b),
            Self::Adc => adc8(a, b, carry),
            Self::Sub => sub8(a, b),
            Self::Sbc => sbc8(a, b, carry),
            Self::And => and8(a, b),
            Self::Xor => xor8(a, b),
            Self::Or => or8(a, b),
            Self::Cp => AluResult { value: a, flags: cp8(a, b) },
        }
    }
}

/// The CB-prefix rotate and shift group (bits 5-3 of CB 00-3F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
}

impl ShiftOp {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Self::Rlc,
            1 => Self::Rrc,
            2 => Self::Rl,
            3 => Self::Rr,
            4 => Self::Sla,
            5 => Self::Sra,
            6 => Self::Sll,
            _ => Self::Srl,
        }
    }

    #[must_use]
    pub fn apply(self, value: u8, carry: bool) -> AluResult {
        match self {
            Self::Rlc => rlc8(value),
            Self::Rrc => rrc8(value),
            Self::Rl => rl8(value, carry),
            Self::Rr => rr8(value, carry),
            Self::Sla => sla8(value),
            Self::Sra => sra8(value),
            Self::Sll => sll8(value),
            Self::Srl => srl8(value),
        }
    }
}

/// Add with carry-in.
#[must_use]
pub fn adc8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let result16 = u16::from(a) + u16::from(b) + u16::from(c);
    let result = result16 as u8;

    let mut flags = sz53(result);

    // Half-carry flag
    if (a & 0x0F) + (b & 0x0F) + c > 0x0F {
        flags |= HF;
    }

    // Overflow flag (both operands same sign, result different sign)
    let overflow = ((a ^ b) & 0x80 == 0) && ((a ^ result) & 0x80 != 0);
    if overflow {
        flags |= PF;
    }

    if result16 > 0xFF {
        flags |= CF;
    }

    AluResult { value: result, flags }
}

#[must_use]
pub fn add8(a: u8, b: u8) -> AluResult {
    adc8(a, b, false)
}

/// Subtract with borrow-in.
#[must_use]
pub fn sbc8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = NF | sz53(result);

    // Half-carry flag (borrow from bit 4)
    if (a & 0x0F) < (b & 0x0F) + c {
        flags |= HF;
    }

    // Overflow flag (operands different sign, result sign differs from minuend)
    let overflow = ((a ^ b) & 0x80 != 0) && ((a ^ result) & 0x80 != 0);
    if overflow {
        flags |= PF;
    }

    // Carry flag (borrow)
    if u16::from(a) < u16::from(b) + u16::from(c) {
        flags |= CF;
    }

    AluResult { value: result, flags }
}

#[must_use]
pub fn sub8(a: u8, b: u8) -> AluResult {
    sbc8(a, b, false)
}

/// AND operation. H is always set.
#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let result = a & b;
    AluResult { value: result, flags: sz53p(result) | HF }
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let result = a | b;
    AluResult { value: result, flags: sz53p(result) }
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let result = a ^ b;
    AluResult { value: result, flags: sz53p(result) }
}

/// Compare: flags of `a - b`, result discarded.
///
/// X/Y come from the operand, not the result.
#[must_use]
pub fn cp8(a: u8, b: u8) -> u8 {
    let flags = sub8(a, b).flags;
    (flags & !(YF | XF)) | (b & (YF | XF))
}

/// Increment byte. Carry is not affected; the returned flags leave CF clear
/// for the caller to merge.
#[must_use]
pub fn inc8(a: u8) -> AluResult {
    let result = a.wrapping_add(1);

    let mut flags = sz53(result);
    if a & 0x0F == 0x0F {
        flags |= HF;
    }
    if a == 0x7F {
        flags |= PF; // Overflow
    }

    AluResult { value: result, flags }
}

/// Decrement byte. Carry is not affected, as for `inc8`.
#[must_use]
pub fn dec8(a: u8) -> AluResult {
    let result = a.wrapping_sub(1);

    let mut flags = NF | sz53(result);
    if a & 0x0F == 0x00 {
        flags |= HF;
    }
    if a == 0x80 {
        flags |= PF; // Overflow
    }

    AluResult { value: result, flags }
}

fn shifted(value: u8, carry_out: bool) -> AluResult {
    AluResult { value, flags: sz53p(value) | flag_if(carry_out, CF) }
}

/// Rotate left circular (bit 7 -> carry and bit 0).
#[must_use]
pub fn rlc8(a: u8) -> AluResult {
    shifted(a.rotate_left(1), a & 0x80 != 0)
}

/// Rotate right circular (bit 0 -> carry and bit 7).
#[must_use]
pub fn rrc8(a: u8) -> AluResult {
    shifted(a.rotate_right(1), a & 0x01 != 0)
}

/// Rotate left through carry.
#[must_use]
pub fn rl8(a: u8, old_carry: bool) -> AluResult {
    shifted((a << 1) | u8::from(old_carry), a & 0x80 != 0)
}

/// Rotate right through carry.
#[must_use]
pub fn rr8(a: u8, old_carry: bool) -> AluResult {
    shifted((a >> 1) | (u8::from(old_carry) << 7), a & 0x01 != 0)
}

/// Shift left arithmetic (bit 0 = 0).
#[must_use]
pub fn sla8(a: u8) -> AluResult {
    shifted(a << 1, a & 0x80 != 0)
}

/// Shift right arithmetic (bit 7 preserved).
#[must_use]
pub fn sra8(a: u8) -> AluResult {
    shifted((a >> 1) | (a & 0x80), a & 0x01 != 0)
}

/// Shift left logical (undocumented SLL - bit 0 = 1).
#[must_use]
pub fn sll8(a: u8) -> AluResult {
    shifted((a << 1) | 1, a & 0x80 != 0)
}

/// Shift right logical (bit 7 = 0).
#[must_use]
pub fn srl8(a: u8) -> AluResult {
    shifted(a >> 1, a & 0x01 != 0)
}

/// Accumulator rotates (RLCA/RRCA/RLA/RRA) keep S, Z and P/V, clear H and
/// N, and take X/Y from the new accumulator.
fn accumulator_rotate(f: u8, rotated: AluResult) -> AluResult {
    AluResult {
        value: rotated.value,
        flags: (f & (SF | ZF | PF)) | (rotated.value & (YF | XF)) | (rotated.flags & CF),
    }
}

#[must_use]
pub fn rlca(a: u8, f: u8) -> AluResult {
    accumulator_rotate(f, rlc8(a))
}

#[must_use]
pub fn rrca(a: u8, f: u8) -> AluResult {
    accumulator_rotate(f, rrc8(a))
}

#[must_use]
pub fn rla(a: u8, f: u8) -> AluResult {
    accumulator_rotate(f, rl8(a, f & CF != 0))
}

#[must_use]
pub fn rra(a: u8, f: u8) -> AluResult {
    accumulator_rotate(f, rr8(a, f & CF != 0))
}

/// Decimal adjust after a BCD add or subtract.
///
/// The correction depends on the incoming H, C and N flags and on both
/// nibbles of A. N is preserved.
#[must_use]
pub fn daa(a: u8, f: u8) -> AluResult {
    let nf = f & NF != 0;
    let cf = f & CF != 0;
    let hf = f & HF != 0;

    let mut correction: u8 = 0;
    let mut new_cf = cf;

    if hf || (a & 0x0F) > 9 {
        correction |= 0x06;
    }
    if cf || a > 0x99 {
        correction |= 0x60;
        new_cf = true;
    }

    let result = if nf {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };

    let new_hf = if nf {
        hf && (a & 0x0F) < 6
    } else {
        (a & 0x0F) > 9
    };

    AluResult {
        value: result,
        flags: sz53p(result) | flag_if(nf, NF) | flag_if(new_cf, CF) | flag_if(new_hf, HF),
    }
}

/// CPL: invert A, set H and N.
#[must_use]
pub fn cpl(a: u8, f: u8) -> AluResult {
    let result = !a;
    AluResult {
        value: result,
        flags: (f & (SF | ZF | PF | CF)) | HF | NF | (result & (YF | XF)),
    }
}

/// SCF. X/Y come from `(prev_q ^ F) | A`, where `prev_q` is the flag byte
/// the previous instruction wrote (0 if it wrote none).
#[must_use]
pub fn scf(a: u8, f: u8, prev_q: u8) -> u8 {
    (f & (SF | ZF | PF)) | CF | (((prev_q ^ f) | a) & (YF | XF))
}

/// CCF. H takes the old carry; X/Y as for `scf`.
#[must_use]
pub fn ccf(a: u8, f: u8, prev_q: u8) -> u8 {
    let old_cf = f & CF != 0;
    (f & (SF | ZF | PF))
        | (((prev_q ^ f) | a) & (YF | XF))
        | flag_if(old_cf, HF)
        | flag_if(!old_cf, CF)
}

/// Flags for BIT n. `xy_source` supplies X/Y: the operand itself for
/// registers, the high byte of WZ or of IX+d for memory forms.
#[must_use]
pub fn bit(n: u8, value: u8, xy_source: u8, f: u8) -> u8 {
    let is_zero = value & (1 << n) == 0;
    (f & CF)
        | HF
        | flag_if(is_zero, ZF | PF)
        | flag_if(n == 7 && !is_zero, SF)
        | (xy_source & (YF | XF))
}

/// 16-bit add for HL/IX/IY. S, Z and P/V are the caller's to keep.
#[must_use]
pub fn add16(a: u16, b: u16) -> (u16, u8) {
    let result32 = u32::from(a) + u32::from(b);
    let result = result32 as u16;

    let mut flags = 0;

    // Undocumented flags from high byte of result
    flags |= ((result >> 8) as u8) & (YF | XF);

    // Half-carry from bit 11
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF {
        flags |= HF;
    }

    if result32 > 0xFFFF {
        flags |= CF;
    }

    (result, flags)
}

/// 16-bit add with carry for HL.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let result32 = u32::from(a) + u32::from(b) + u32::from(c);
    let result = result32 as u16;

    let mut flags = ((result >> 8) as u8) & (SF | YF | XF);

    if result == 0 {
        flags |= ZF;
    }

    // Half-carry from bit 11
    if (a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF {
        flags |= HF;
    }

    let overflow = ((a ^ b) & 0x8000 == 0) && ((a ^ result) & 0x8000 != 0);
    if overflow {
        flags |= PF;
    }

    if result32 > 0xFFFF {
        flags |= CF;
    }

    (result, flags)
}

/// 16-bit subtract with borrow for HL.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = NF | (((result >> 8) as u8) & (SF | YF | XF));

    if result == 0 {
        flags |= ZF;
    }

    // Half-carry (borrow from bit 12)
    if (a & 0x0FFF) < (b & 0x0FFF) + c {
        flags |= HF;
    }

    let overflow = ((a ^ b) & 0x8000 != 0) && ((a ^ result) & 0x8000 != 0);
    if overflow {
        flags |= PF;
    }

    // Carry (borrow)
    if u32::from(a) < u32::from(b) + u32::from(c) {
        flags |= CF;
    }

    (result, flags)
}
