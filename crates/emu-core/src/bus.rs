//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// The CPU reaches memory and peripherals only through this trait. Address
/// decoding, banking and contention are the implementor's business; every
/// call returns immediately.
pub trait Bus {
    /// Read a byte from the given memory address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given memory address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a little-endian word. The high byte comes from `address + 1`,
    /// wrapping at the top of memory.
    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read(address);
        let hi = self.read(address.wrapping_add(1));
        u16::from(lo) | (u16::from(hi) << 8)
    }

    /// Write a little-endian word, low byte first.
    fn write_word(&mut self, address: u16, value: u16) {
        self.write(address, value as u8);
        self.write(address.wrapping_add(1), (value >> 8) as u8);
    }

    /// Read a byte from an I/O port.
    ///
    /// The Z80 drives the full 16-bit address bus during port cycles, so
    /// `port` carries B:C for `(C)` forms and A:n for `(n)` forms. Devices
    /// that only decode the low byte should mask it themselves.
    fn io_read(&mut self, port: u16) -> u8;

    /// Write a byte to an I/O port.
    fn io_write(&mut self, port: u16, value: u8);
}
