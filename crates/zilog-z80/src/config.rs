//! Z80 variant configuration.

/// Silicon variant.
///
/// The NMOS and CMOS parts run the same instruction set but differ in two
/// undocumented details, selected here at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    /// Original NMOS Z80 (Z8400). `OUT (C),0` drives 0x00, and an interrupt
    /// accepted straight after LD A,I or LD A,R clears P/V.
    #[default]
    Nmos,
    /// CMOS Z84C00. `OUT (C),0` drives 0xFF and LD A,I/R report IFF2
    /// reliably.
    Cmos,
}

/// Configuration for creating a Z80 instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Z80Config {
    pub variant: Variant,
}

impl Z80Config {
    #[must_use]
    pub const fn new(variant: Variant) -> Self {
        Self { variant }
    }

    /// Byte written by the undocumented `OUT (C),0` (ED 71).
    #[must_use]
    pub const fn out_c_zero_value(&self) -> u8 {
        match self.variant {
            Variant::Nmos => 0x00,
            Variant::Cmos => 0xFF,
        }
    }

    /// True if accepting an interrupt right after LD A,I/R clears P/V.
    #[must_use]
    pub const fn has_iff2_read_race(&self) -> bool {
        matches!(self.variant, Variant::Nmos)
    }
}
