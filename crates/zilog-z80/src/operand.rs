//! Operand fields decoded from opcode bits.
//!
//! Each field is a closed enum built from the 2- or 3-bit group of the
//! opcode, so an out-of-range register code cannot exist past decode.

use crate::flags::{CF, PF, SF, ZF};

/// 8-bit register field (bits 5-3 or 2-0).
///
/// `Mem` is code 6: the byte at (HL), or at (IX+d)/(IY+d) under a DD/FD
/// prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    Mem,
    A,
}

impl Reg8 {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Self::B,
            1 => Self::C,
            2 => Self::D,
            3 => Self::E,
            4 => Self::H,
            5 => Self::L,
            6 => Self::Mem,
            _ => Self::A,
        }
    }
}

/// 16-bit pair field for loads and arithmetic (bits 5-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    Bc,
    De,
    Hl,
    Sp,
}

impl Reg16 {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Self::Bc,
            1 => Self::De,
            2 => Self::Hl,
            _ => Self::Sp,
        }
    }
}

/// 16-bit pair field for PUSH and POP, where code 3 is AF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPair {
    Bc,
    De,
    Hl,
    Af,
}

impl StackPair {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Self::Bc,
            1 => Self::De,
            2 => Self::Hl,
            _ => Self::Af,
        }
    }
}

/// Branch condition (bits 5-3). JR only encodes the first four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Nz,
    Z,
    Nc,
    C,
    Po,
    Pe,
    P,
    M,
}

impl Condition {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Self::Nz,
            1 => Self::Z,
            2 => Self::Nc,
            3 => Self::C,
            4 => Self::Po,
            5 => Self::Pe,
            6 => Self::P,
            _ => Self::M,
        }
    }

    /// Evaluate against a flag byte.
    #[must_use]
    pub const fn holds(self, f: u8) -> bool {
        match self {
            Self::Nz => f & ZF == 0,
            Self::Z => f & ZF != 0,
            Self::Nc => f & CF == 0,
            Self::C => f & CF != 0,
            Self::Po => f & PF == 0,
            Self::Pe => f & PF != 0,
            Self::P => f & SF == 0,
            Self::M => f & SF != 0,
        }
    }
}

/// Which register plays the part of HL for the current instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Index {
    #[default]
    Hl,
    Ix,
    Iy,
}

impl Index {
    /// The index selected by a DD or FD prefix byte.
    pub const fn from_prefix(prefix: u8) -> Self {
        if prefix == 0xFD { Self::Iy } else { Self::Ix }
    }

    pub const fn is_indexed(self) -> bool {
        !matches!(self, Self::Hl)
    }
}
