//! Block transfer, search and I/O instructions.
//!
//! Each call moves or compares one element. A repeating form that is not
//! finished rewinds PC onto its ED prefix so the next `step()` fetches it
//! again; interrupts can be taken in between.

#![allow(clippy::cast_possible_truncation)]

use emu_core::Bus;

use crate::decode::{BlockKind, BlockOp};
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, flag_if, parity, sz53};

use super::Z80;

/// Outcome of one block iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockStep {
    /// Repeating form with work left: PC was rewound.
    Continue,
    /// Last element, or a non-repeating form.
    Done,
}

impl Z80 {
    pub(super) fn execute_block<B: Bus>(&mut self, bus: &mut B, op: BlockOp) -> u32 {
        let step = match op.kind {
            BlockKind::Ld => self.block_ld(bus, op),
            BlockKind::Cp => self.block_cp(bus, op),
            BlockKind::In => self.block_in(bus, op),
            BlockKind::Out => self.block_out(bus, op),
        };
        match step {
            BlockStep::Continue => 21,
            BlockStep::Done => 16,
        }
    }

    /// Step HL (or DE) one element in the block direction.
    const fn advance(value: u16, decrement: bool) -> u16 {
        if decrement {
            value.wrapping_sub(1)
        } else {
            value.wrapping_add(1)
        }
    }

    /// Point PC back at the ED prefix. Returns the new PC high byte, which
    /// supplies X/Y for the repeat phase.
    fn rewind(&mut self) -> u8 {
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.wz = self.regs.pc.wrapping_add(1);
        (self.regs.pc >> 8) as u8
    }

    /// LDI/LDD/LDIR/LDDR
    fn block_ld<B: Bus>(&mut self, bus: &mut B, op: BlockOp) -> BlockStep {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = bus.read(hl);
        bus.write(de, value);
        self.regs.set_hl(Self::advance(hl, op.decrement));
        self.regs.set_de(Self::advance(de, op.decrement));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let n = value.wrapping_add(self.regs.a);
        let f = (self.regs.f & (SF | ZF | CF)) | flag_if(bc != 0, PF);

        if op.repeat && bc != 0 {
            let pch = self.rewind();
            self.set_f(f | (pch & (XF | YF)));
            BlockStep::Continue
        } else {
            self.set_f(f | (n & XF) | flag_if(n & 0x02 != 0, YF));
            BlockStep::Done
        }
    }

    /// CPI/CPD/CPIR/CPDR
    fn block_cp<B: Bus>(&mut self, bus: &mut B, op: BlockOp) -> BlockStep {
        let hl = self.regs.hl();
        let value = bus.read(hl);
        self.regs.set_hl(Self::advance(hl, op.decrement));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        self.regs.wz = Self::advance(self.regs.wz, op.decrement);

        let a = self.regs.a;
        let result = a.wrapping_sub(value);
        let hf = (a & 0x0F) < (value & 0x0F);
        let n = result.wrapping_sub(u8::from(hf));
        let f = (self.regs.f & CF)
            | NF
            | (sz53(result) & (SF | ZF))
            | flag_if(hf, HF)
            | flag_if(bc != 0, PF);

        if op.repeat && bc != 0 && result != 0 {
            let pch = self.rewind();
            self.set_f(f | (pch & (XF | YF)));
            BlockStep::Continue
        } else {
            self.set_f(f | (n & XF) | flag_if(n & 0x02 != 0, YF));
            BlockStep::Done
        }
    }

    /// INI/IND/INIR/INDR
    fn block_in<B: Bus>(&mut self, bus: &mut B, op: BlockOp) -> BlockStep {
        let port = self.regs.bc();
        let value = bus.io_read(port);
        self.regs.wz = Self::advance(port, op.decrement);
        let hl = self.regs.hl();
        bus.write(hl, value);
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.regs.set_hl(Self::advance(hl, op.decrement));

        let c = if op.decrement {
            self.regs.c.wrapping_sub(1)
        } else {
            self.regs.c.wrapping_add(1)
        };
        self.finish_block_io(op, value, u16::from(value) + u16::from(c))
    }

    /// OUTI/OUTD/OTIR/OTDR. B is decremented before it goes on the bus.
    fn block_out<B: Bus>(&mut self, bus: &mut B, op: BlockOp) -> BlockStep {
        let hl = self.regs.hl();
        let value = bus.read(hl);
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port = self.regs.bc();
        bus.io_write(port, value);
        self.regs.wz = Self::advance(port, op.decrement);
        self.regs.set_hl(Self::advance(hl, op.decrement));

        let k = u16::from(value) + u16::from(self.regs.l);
        self.finish_block_io(op, value, k)
    }

    /// Shared I/O block flags. `k` is the transferred byte plus the
    /// adjusted C (input) or the updated L (output).
    fn finish_block_io(&mut self, op: BlockOp, value: u8, k: u16) -> BlockStep {
        let b = self.regs.b;
        let hcf = k > 0xFF;
        let nf = value & 0x80 != 0;
        let p = (k as u8 & 7) ^ b;

        if !(op.repeat && b != 0) {
            self.set_f(
                sz53(b) | flag_if(nf, NF) | flag_if(hcf, HF | CF) | flag_if(parity(p), PF),
            );
            return BlockStep::Done;
        }

        // Repeat: HF/PF recomputed, XF/YF from PCH.
        let pch = self.rewind();
        let (hf, pf) = if hcf {
            if nf {
                (
                    flag_if(b & 0x0F == 0, HF),
                    flag_if(parity(p ^ (b.wrapping_sub(1) & 7)), PF),
                )
            } else {
                (
                    flag_if(b & 0x0F == 0x0F, HF),
                    flag_if(parity(p ^ (b.wrapping_add(1) & 7)), PF),
                )
            }
        } else {
            (0, flag_if(parity(p ^ (b & 7)), PF))
        };
        self.set_f((b & SF) | (pch & (XF | YF)) | flag_if(nf, NF) | flag_if(hcf, CF) | hf | pf);
        BlockStep::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::{Cpu, SimpleBus};

    fn cpu_at(program: &[u8]) -> (Z80, SimpleBus) {
        let mut bus = SimpleBus::new();
        bus.load(0x0000, program);
        (Z80::new(), bus)
    }

    #[test]
    fn ldd_moves_downwards() {
        let (mut cpu, mut bus) = cpu_at(&[0xED, 0xA8]);
        bus.load(0x5001, &[0x42]);
        cpu.regs.set_hl(0x5001);
        cpu.regs.set_de(0x6001);
        cpu.regs.set_bc(2);
        cpu.regs.a = 0;
        assert_eq!(cpu.step(&mut bus), 16);
        assert_eq!(bus.peek(0x6001), 0x42);
        assert_eq!((cpu.hl(), cpu.de(), cpu.bc()), (0x5000, 0x6000, 1));
        assert!(cpu.regs.flag(PF));
        // 0x42 + A: bit 1 -> Y, bit 3 -> X.
        assert_eq!(cpu.f() & (YF | XF), YF);
    }

    #[test]
    fn cpir_stops_on_match() {
        let (mut cpu, mut bus) = cpu_at(&[0xED, 0xB1]);
        bus.load(0x4000, &[0x01, 0x02, 0x03]);
        cpu.regs.set_hl(0x4000);
        cpu.regs.set_bc(10);
        cpu.regs.a = 0x02;
        assert_eq!(cpu.step(&mut bus), 21);
        assert_eq!(cpu.regs.pc, 0x0000);
        assert_eq!(cpu.step(&mut bus), 16);
        assert_eq!(cpu.regs.pc, 0x0002);
        assert_eq!(cpu.hl(), 0x4002);
        assert_eq!(cpu.bc(), 8);
        assert!(cpu.regs.flag(ZF));
        assert!(cpu.regs.flag(PF));
    }

    #[test]
    fn otir_sends_bytes_to_b_c_port() {
        let (mut cpu, mut bus) = cpu_at(&[0xED, 0xB3]);
        bus.load(0x3000, &[0xAA, 0xBB]);
        cpu.regs.set_hl(0x3000);
        cpu.regs.b = 2;
        cpu.regs.c = 0xFE;
        assert_eq!(cpu.step(&mut bus), 21);
        assert_eq!(cpu.step(&mut bus), 16);
        assert_eq!(bus.port_writes(), &[(0x01FE, 0xAA), (0x00FE, 0xBB)]);
        assert_eq!(cpu.regs.b, 0);
        assert!(cpu.regs.flag(ZF));
        assert!(cpu.regs.flag(NF));
    }

    #[test]
    fn ini_stores_port_byte() {
        let (mut cpu, mut bus) = cpu_at(&[0xED, 0xA2]);
        bus.set_port(0x0510, 0x7F);
        cpu.regs.set_bc(0x0510);
        cpu.regs.set_hl(0x8000);
        assert_eq!(cpu.step(&mut bus), 16);
        assert_eq!(bus.peek(0x8000), 0x7F);
        assert_eq!(cpu.regs.b, 0x04);
        assert_eq!(cpu.wz(), 0x0511);
        // k = 0x7F + 0x11 = 0x90: no carry.
        assert!(!cpu.regs.flag(CF));
        assert!(!cpu.regs.flag(NF));
    }
}
