//! Instruction-stepped Z80 CPU emulator.
//!
//! Each call to `step()` executes one instruction, or accepts one interrupt,
//! and returns the T-states it took. Undocumented behaviour is modelled:
//! the X/Y flag bits, WZ (MEMPTR), IXH/IXL/IYH/IYL, SLL, the DDCB register
//! copy and the block instruction repeat flags.

mod alu;
mod config;
mod cpu;
mod decode;
mod error;
mod flags;
mod operand;
mod registers;

pub use config::{Variant, Z80Config};
pub use cpu::Z80;
pub use error::StateError;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::Registers;

#[cfg(feature = "test-utils")]
pub use cpu::InternalState;
