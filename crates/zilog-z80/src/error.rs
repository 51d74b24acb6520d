//! Z80 errors
//!
//! Instruction execution cannot fail. The only fallible operation is loading
//! a register snapshot.

use thiserror::Error;

/// Snapshot restore error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("interrupt mode {0} is not 0, 1 or 2")]
    InvalidInterruptMode(u8),
}
