//! NMI and maskable interrupt acceptance.

use emu_core::{Bus, InterruptLine};
use log::trace;

use crate::flags::PF;

use super::Z80;

impl Z80 {
    /// Sample the interrupt lines at an instruction boundary. Returns the
    /// T-states spent if an interrupt was accepted.
    pub(super) fn poll_interrupts<B: Bus + InterruptLine>(
        &mut self,
        bus: &mut B,
        int_blocked: bool,
        after_ld_a_ir: bool,
    ) -> Option<u32> {
        if bus.nmi_requested() {
            return Some(self.accept_nmi(bus));
        }
        if self.regs.iff1 && !int_blocked && bus.int_requested() {
            return Some(self.accept_int(bus, after_ld_a_ir));
        }
        None
    }

    /// NMI: IFF2 keeps the pre-NMI enable state for RETN.
    fn accept_nmi<B: Bus>(&mut self, bus: &mut B) -> u32 {
        trace!("NMI accepted at {:04X}", self.regs.pc);
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.inc_r();
        self.push(bus, self.regs.pc);
        self.regs.pc = 0x0066;
        self.regs.wz = self.regs.pc;
        11
    }

    fn accept_int<B: Bus + InterruptLine>(&mut self, bus: &mut B, after_ld_a_ir: bool) -> u32 {
        // NMOS parts sample IFF2 for LD A,I/R late enough to see it cleared.
        if after_ld_a_ir && self.config.has_iff2_read_race() {
            self.regs.f &= !PF;
        }

        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.inc_r();

        let data = bus.int_data();
        trace!("INT accepted at {:04X}, IM {}, data {data:02X}", self.regs.pc, self.regs.im);
        self.push(bus, self.regs.pc);

        let (target, t_states) = match self.regs.im {
            // Only RST opcodes are meaningful on the data bus; anything else
            // behaves as RST 38.
            0 if data & 0xC7 == 0xC7 => (u16::from(data & 0x38), 13),
            2 => {
                let vector = (u16::from(self.regs.i) << 8) | u16::from(data);
                (bus.read_word(vector), 19)
            }
            _ => (0x0038, 13),
        };

        self.regs.pc = target;
        self.regs.wz = target;
        t_states
    }
}
