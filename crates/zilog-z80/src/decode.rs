//! Opcode descriptor tables.
//!
//! The three 256-entry tables are built at compile time from the opcode bit
//! fields (`x = op >> 6`, `y = op >> 3 & 7`, `z = op & 7`, `p = y >> 1`,
//! `q = y & 1`). DD and FD have no table of their own: they reuse `BASE`
//! with an [`Index`](crate::operand::Index) that redirects HL.

use crate::alu::{AluOp, ShiftOp};
use crate::operand::{Condition, Reg8, Reg16, StackPair};

/// An unprefixed (or DD/FD-prefixed) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    ExAf,
    Djnz,
    Jr,
    JrCond(Condition),
    /// LD rr,nn
    LoadPairImm(Reg16),
    AddHl(Reg16),
    /// LD (BC),A / LD (DE),A
    StoreAIndirect(Reg16),
    /// LD A,(BC) / LD A,(DE)
    LoadAIndirect(Reg16),
    /// LD (nn),HL
    StoreHlAbs,
    /// LD HL,(nn)
    LoadHlAbs,
    /// LD (nn),A
    StoreAAbs,
    /// LD A,(nn)
    LoadAAbs,
    IncPair(Reg16),
    DecPair(Reg16),
    Inc(Reg8),
    Dec(Reg8),
    /// LD r,n
    LoadImm(Reg8),
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Halt,
    /// LD dst,src
    Load(Reg8, Reg8),
    Alu(AluOp, Reg8),
    AluImm(AluOp),
    RetCond(Condition),
    Pop(StackPair),
    Ret,
    Exx,
    JpHl,
    LoadSpHl,
    JpCond(Condition),
    Jp,
    OutImmA,
    InAImm,
    ExSpHl,
    ExDeHl,
    Di,
    Ei,
    CallCond(Condition),
    Push(StackPair),
    Call,
    Rst(u8),
    PrefixCb,
    PrefixDd,
    PrefixEd,
    PrefixFd,
}

/// Block instruction family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Ld,
    Cp,
    In,
    Out,
}

/// One of the sixteen block instructions (ED A0-A3, A8-AB, B0-B3, B8-BB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOp {
    pub kind: BlockKind,
    pub decrement: bool,
    pub repeat: bool,
}

/// An ED-prefixed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdOp {
    /// IN r,(C). `Reg8::Mem` is IN F,(C): flags only.
    InC(Reg8),
    /// OUT (C),r. `Reg8::Mem` is OUT (C),0.
    OutC(Reg8),
    SbcHl(Reg16),
    AdcHl(Reg16),
    /// LD (nn),rr
    StorePairAbs(Reg16),
    /// LD rr,(nn)
    LoadPairAbs(Reg16),
    Neg,
    Retn,
    Reti,
    Im(u8),
    LoadIA,
    LoadRA,
    LoadAI,
    LoadAR,
    Rrd,
    Rld,
    Block(BlockOp),
    /// Unassigned ED opcode: an 8 T-state no-op.
    Undefined,
}

/// A CB-prefixed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbOp {
    Shift(ShiftOp, Reg8),
    Bit(u8, Reg8),
    Res(u8, Reg8),
    Set(u8, Reg8),
}

impl CbOp {
    /// The register field (bits 2-0).
    pub const fn reg(self) -> Reg8 {
        match self {
            Self::Shift(_, r) | Self::Bit(_, r) | Self::Res(_, r) | Self::Set(_, r) => r,
        }
    }
}

pub static BASE: [Op; 256] = build_base();
pub static ED: [EdOp; 256] = build_ed();
pub static CB: [CbOp; 256] = build_cb();

const fn build_base() -> [Op; 256] {
    let mut table = [Op::Nop; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_base(i as u8);
        i += 1;
    }
    table
}

const fn build_ed() -> [EdOp; 256] {
    let mut table = [EdOp::Undefined; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_ed(i as u8);
        i += 1;
    }
    table
}

const fn build_cb() -> [CbOp; 256] {
    let mut table = [CbOp::Bit(0, Reg8::B); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_cb(i as u8);
        i += 1;
    }
    table
}

const fn decode_base(op: u8) -> Op {
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;
    let q = y & 1;

    match x {
        0 => match z {
            0 => match y {
                0 => Op::Nop,
                1 => Op::ExAf,
                2 => Op::Djnz,
                3 => Op::Jr,
                _ => Op::JrCond(Condition::from_bits(y - 4)),
            },
            1 => {
                if q == 0 {
                    Op::LoadPairImm(Reg16::from_bits(p))
                } else {
                    Op::AddHl(Reg16::from_bits(p))
                }
            }
            2 => match y {
                0 | 2 => Op::StoreAIndirect(Reg16::from_bits(p)),
                1 | 3 => Op::LoadAIndirect(Reg16::from_bits(p)),
                4 => Op::StoreHlAbs,
                5 => Op::LoadHlAbs,
                6 => Op::StoreAAbs,
                _ => Op::LoadAAbs,
            },
            3 => {
                if q == 0 {
                    Op::IncPair(Reg16::from_bits(p))
                } else {
                    Op::DecPair(Reg16::from_bits(p))
                }
            }
            4 => Op::Inc(Reg8::from_bits(y)),
            5 => Op::Dec(Reg8::from_bits(y)),
            6 => Op::LoadImm(Reg8::from_bits(y)),
            _ => match y {
                0 => Op::Rlca,
                1 => Op::Rrca,
                2 => Op::Rla,
                3 => Op::Rra,
                4 => Op::Daa,
                5 => Op::Cpl,
                6 => Op::Scf,
                _ => Op::Ccf,
            },
        },
        1 => {
            if y == 6 && z == 6 {
                Op::Halt
            } else {
                Op::Load(Reg8::from_bits(y), Reg8::from_bits(z))
            }
        }
        2 => Op::Alu(AluOp::from_bits(y), Reg8::from_bits(z)),
        _ => match z {
            0 => Op::RetCond(Condition::from_bits(y)),
            1 => {
                if q == 0 {
                    Op::Pop(StackPair::from_bits(p))
                } else {
                    match p {
                        0 => Op::Ret,
                        1 => Op::Exx,
                        2 => Op::JpHl,
                        _ => Op::LoadSpHl,
                    }
                }
            }
            2 => Op::JpCond(Condition::from_bits(y)),
            3 => match y {
                0 => Op::Jp,
                1 => Op::PrefixCb,
                2 => Op::OutImmA,
                3 => Op::InAImm,
                4 => Op::ExSpHl,
                5 => Op::ExDeHl,
                6 => Op::Di,
                _ => Op::Ei,
            },
            4 => Op::CallCond(Condition::from_bits(y)),
            5 => {
                if q == 0 {
                    Op::Push(StackPair::from_bits(p))
                } else {
                    match p {
                        0 => Op::Call,
                        1 => Op::PrefixDd,
                        2 => Op::PrefixEd,
                        _ => Op::PrefixFd,
                    }
                }
            }
            6 => Op::AluImm(AluOp::from_bits(y)),
            _ => Op::Rst(y * 8),
        },
    }
}

const fn decode_ed(op: u8) -> EdOp {
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;
    let q = y & 1;

    if x == 1 {
        return match z {
            0 => EdOp::InC(Reg8::from_bits(y)),
            1 => EdOp::OutC(Reg8::from_bits(y)),
            2 => {
                if q == 0 {
                    EdOp::SbcHl(Reg16::from_bits(p))
                } else {
                    EdOp::AdcHl(Reg16::from_bits(p))
                }
            }
            3 => {
                if q == 0 {
                    EdOp::StorePairAbs(Reg16::from_bits(p))
                } else {
                    EdOp::LoadPairAbs(Reg16::from_bits(p))
                }
            }
            4 => EdOp::Neg,
            5 => {
                if y == 1 {
                    EdOp::Reti
                } else {
                    EdOp::Retn
                }
            }
            // ED 4E/6E (IM 0/1) behave as IM 0.
            6 => EdOp::Im(match y & 3 {
                2 => 1,
                3 => 2,
                _ => 0,
            }),
            _ => match y {
                0 => EdOp::LoadIA,
                1 => EdOp::LoadRA,
                2 => EdOp::LoadAI,
                3 => EdOp::LoadAR,
                4 => EdOp::Rrd,
                5 => EdOp::Rld,
                _ => EdOp::Undefined,
            },
        };
    }

    if x == 2 && z <= 3 && y >= 4 {
        let kind = match z {
            0 => BlockKind::Ld,
            1 => BlockKind::Cp,
            2 => BlockKind::In,
            _ => BlockKind::Out,
        };
        return EdOp::Block(BlockOp {
            kind,
            decrement: y & 1 != 0,
            repeat: y >= 6,
        });
    }

    EdOp::Undefined
}

const fn decode_cb(op: u8) -> CbOp {
    let y = (op >> 3) & 7;
    let reg = Reg8::from_bits(op);
    match op >> 6 {
        0 => CbOp::Shift(ShiftOp::from_bits(y), reg),
        1 => CbOp::Bit(y, reg),
        2 => CbOp::Res(y, reg),
        _ => CbOp::Set(y, reg),
    }
}
