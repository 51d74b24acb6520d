//! Interrupt request lines.

/// Interrupt request lines as seen by the CPU.
///
/// These are query points, not callbacks: the CPU samples them at the top of
/// each `step()` and never in the middle of an instruction.
pub trait InterruptLine {
    /// Level-sensitive maskable interrupt request (/INT asserted).
    ///
    /// The CPU only acts on this when interrupts are enabled. The line stays
    /// asserted until the device drops it.
    fn int_requested(&mut self) -> bool;

    /// Edge-triggered non-maskable interrupt.
    ///
    /// Returns true once per falling edge of /NMI. Implementors latch the
    /// edge and clear the latch when it is reported.
    fn nmi_requested(&mut self) -> bool;

    /// Byte placed on the data bus during an interrupt acknowledge cycle.
    ///
    /// Used as the low byte of the vector address in IM 2 and as the
    /// injected instruction in IM 0. An idle bus floats high.
    fn int_data(&mut self) -> u8 {
        0xFF
    }

    /// Called when the CPU executes RETI.
    ///
    /// Daisy-chained peripherals watch for this to release their
    /// interrupt-under-service state.
    fn reti(&mut self) {}
}
