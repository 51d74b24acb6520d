//! Elapsed-time counter in CPU clock cycles.

/// A count of T-states.
///
/// `step()` reports each instruction's cost as a `u32`; embedders fold
/// those into a `Ticks` to relate CPU time to video or audio timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::ops::AddAssign<u32> for Ticks {
    fn add_assign(&mut self, t_states: u32) {
        self.0 += u64::from(t_states);
    }
}
