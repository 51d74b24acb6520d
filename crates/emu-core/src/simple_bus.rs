//! Flat 64K bus for tests and bare-CPU harnesses.

use std::collections::HashMap;

use crate::{Bus, InterruptLine};

/// 64 KiB of RAM, a programmable port space and a pair of interrupt lines.
///
/// Port reads return the value set with [`SimpleBus::set_port`], or 0xFF for
/// ports nobody drives. Port writes are recorded in order.
pub struct SimpleBus {
    ram: Box<[u8; 0x1_0000]>,
    ports: HashMap<u16, u8>,
    port_writes: Vec<(u16, u8)>,
    int_line: bool,
    nmi_latch: bool,
    int_data: u8,
    reti_count: u32,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x1_0000]),
            ports: HashMap::new(),
            port_writes: Vec::new(),
            int_line: false,
            nmi_latch: false,
            int_data: 0xFF,
            reti_count: 0,
        }
    }

    /// Copy `data` into RAM starting at `address`, wrapping at 0xFFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read RAM without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    /// Value returned by future reads of `port` (full 16-bit address).
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.ports.insert(port, value);
    }

    /// All port writes so far, oldest first.
    #[must_use]
    pub fn port_writes(&self) -> &[(u16, u8)] {
        &self.port_writes
    }

    /// Drive the /INT line. It stays at this level until changed.
    pub fn set_int(&mut self, asserted: bool) {
        self.int_line = asserted;
    }

    /// Latch a falling edge on /NMI.
    pub fn trigger_nmi(&mut self) {
        self.nmi_latch = true;
    }

    /// Byte the interrupting device puts on the data bus.
    pub fn set_int_data(&mut self, value: u8) {
        self.int_data = value;
    }

    /// Number of RETI instructions the CPU has signalled.
    #[must_use]
    pub fn reti_count(&self) -> u32 {
        self.reti_count
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.ports.get(&port).copied().unwrap_or(0xFF)
    }

    fn io_write(&mut self, port: u16, value: u8) {
        self.port_writes.push((port, value));
    }
}

impl InterruptLine for SimpleBus {
    fn int_requested(&mut self) -> bool {
        self.int_line
    }

    fn nmi_requested(&mut self) -> bool {
        std::mem::take(&mut self.nmi_latch)
    }

    fn int_data(&mut self) -> u8 {
        self.int_data
    }

    fn reti(&mut self) {
        self.reti_count += 1;
    }
}
