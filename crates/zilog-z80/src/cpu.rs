//! Z80 CPU core with per-instruction execution.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::struct_excessive_bools)] // CPU state requires multiple boolean flags.

use emu_core::{Bus, Cpu, InterruptLine, Observable, Ticks, Value};
use log::debug;

use crate::config::Z80Config;
use crate::error::StateError;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::operand::{Index, Reg8, Reg16, StackPair};
use crate::registers::Registers;

mod block;
mod execute;
mod interrupt;

/// Z80 CPU.
///
/// The CPU does not own the bus. Instead, the bus is passed to `step()` for
/// each instruction, so memory, ports and interrupt sources stay with the
/// embedding machine.
///
/// The register file can only be replaced as a whole, through
/// [`Z80::restore`], which validates it:
///
/// ```compile_fail
/// let mut cpu = zilog_z80::Z80::new();
/// cpu.regs.im = 5;
/// ```
pub struct Z80 {
    /// Architectural register file. Read it through the accessors or
    /// `Cpu::registers()`; load it through `restore()`.
    pub(crate) regs: Registers,

    config: Z80Config,

    // === Execution state ===
    /// Set by EI: the next instruction runs before INT can be accepted.
    ei_delay: bool,
    /// Flag byte written by the current instruction (0 if none).
    q: u8,
    /// `q` of the previous instruction. Feeds X/Y of SCF and CCF.
    prev_q: u8,
    /// Previous instruction was LD A,I or LD A,R.
    last_was_ld_a_ir: bool,
    /// The last call ended on a DD/FD that another prefix overrides.
    /// INT is not sampled until the chain ends.
    prefix_pending: bool,

    // === Timing ===
    /// Total T-states elapsed.
    total_ticks: Ticks,
}

impl Z80 {
    /// Create an NMOS Z80 in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Z80Config::default())
    }

    #[must_use]
    pub fn with_config(config: Z80Config) -> Self {
        Self {
            regs: Registers::power_on(),
            config,
            ei_delay: false,
            q: 0,
            prev_q: 0,
            last_was_ld_a_ir: false,
            prefix_pending: false,
            total_ticks: Ticks::ZERO,
        }
    }

    #[must_use]
    pub const fn config(&self) -> Z80Config {
        self.config
    }

    /// Total T-states elapsed since creation or the last reset.
    #[must_use]
    pub const fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }

    /// Copy of the register file, suitable for persisting.
    #[must_use]
    pub fn snapshot(&self) -> Registers {
        self.regs
    }

    /// Load a register file captured by [`Z80::snapshot`].
    ///
    /// Pending EI and flag history are cleared, as after any instruction
    /// boundary that wrote no flags.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidInterruptMode`] if `regs.im` is not 0, 1
    /// or 2. The CPU is left unchanged in that case.
    pub fn restore(&mut self, regs: Registers) -> Result<(), StateError> {
        if regs.im > 2 {
            return Err(StateError::InvalidInterruptMode(regs.im));
        }
        self.regs = regs;
        self.ei_delay = false;
        self.q = 0;
        self.prev_q = 0;
        self.last_was_ld_a_ir = false;
        self.prefix_pending = false;
        debug!("Z80 state restored, PC={:04X}", regs.pc);
        Ok(())
    }

    #[must_use]
    pub fn a(&self) -> u8 {
        self.regs.a
    }

    #[must_use]
    pub fn f(&self) -> u8 {
        self.regs.f
    }

    #[must_use]
    pub fn bc(&self) -> u16 {
        self.regs.bc()
    }

    #[must_use]
    pub fn de(&self) -> u16 {
        self.regs.de()
    }

    #[must_use]
    pub fn hl(&self) -> u16 {
        self.regs.hl()
    }

    #[must_use]
    pub fn ix(&self) -> u16 {
        self.regs.ix
    }

    #[must_use]
    pub fn iy(&self) -> u16 {
        self.regs.iy
    }

    #[must_use]
    pub fn sp(&self) -> u16 {
        self.regs.sp
    }

    #[must_use]
    pub fn i(&self) -> u8 {
        self.regs.i
    }

    #[must_use]
    pub fn r(&self) -> u8 {
        self.regs.r
    }

    /// Internal WZ (MEMPTR) latch.
    #[must_use]
    pub fn wz(&self) -> u16 {
        self.regs.wz
    }

    #[must_use]
    pub fn iff1(&self) -> bool {
        self.regs.iff1
    }

    #[must_use]
    pub fn iff2(&self) -> bool {
        self.regs.iff2
    }

    #[must_use]
    pub fn im(&self) -> u8 {
        self.regs.im
    }
}

/// Execution state held outside the register file.
#[cfg(feature = "test-utils")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InternalState {
    /// EI was the last instruction; INT is held off for one more.
    pub ei_delay: bool,
    /// The last instruction was LD A,I or LD A,R.
    pub last_was_ld_a_ir: bool,
    /// Flags written by the last instruction, 0 if it wrote none.
    pub q: u8,
}

#[cfg(feature = "test-utils")]
impl Z80 {
    #[must_use]
    pub fn internal_state(&self) -> InternalState {
        InternalState {
            ei_delay: self.ei_delay,
            last_was_ld_a_ir: self.last_was_ld_a_ir,
            q: self.q,
        }
    }

    /// Direct register access for test harnesses. Skips the checks in
    /// [`Z80::restore`].
    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn set_internal_state(&mut self, state: InternalState) {
        self.ei_delay = state.ei_delay;
        self.last_was_ld_a_ir = state.last_was_ld_a_ir;
        self.q = state.q;
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    /// Write F and record it as this instruction's flag output.
    fn set_f(&mut self, value: u8) {
        self.regs.f = value;
        self.q = value;
    }

    /// M1 cycle: read the opcode at PC and bump R.
    fn fetch_opcode<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let op = self.fetch_byte(bus);
        self.regs.inc_r();
        op
    }

    fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let value = bus.read_word(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(2);
        value
    }

    /// Push high byte first, as the hardware does.
    fn push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, (value >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, value as u8);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let value = bus.read_word(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    /// Pop PC. WZ follows.
    fn ret<B: Bus>(&mut self, bus: &mut B) {
        self.regs.pc = self.pop(bus);
        self.regs.wz = self.regs.pc;
    }

    /// The register standing in for HL.
    fn index_reg(&self, index: Index) -> u16 {
        match index {
            Index::Hl => self.regs.hl(),
            Index::Ix => self.regs.ix,
            Index::Iy => self.regs.iy,
        }
    }

    fn set_index_reg(&mut self, index: Index, value: u16) {
        match index {
            Index::Hl => self.regs.set_hl(value),
            Index::Ix => self.regs.ix = value,
            Index::Iy => self.regs.iy = value,
        }
    }

    /// Get an 8-bit register. H and L follow `index` (IXH/IXL/IYH/IYL).
    fn reg8(&self, r: Reg8, index: Index) -> u8 {
        match (r, index) {
            (Reg8::B, _) => self.regs.b,
            (Reg8::C, _) => self.regs.c,
            (Reg8::D, _) => self.regs.d,
            (Reg8::E, _) => self.regs.e,
            (Reg8::H, Index::Hl) => self.regs.h,
            (Reg8::L, Index::Hl) => self.regs.l,
            (Reg8::H, Index::Ix) => self.regs.ixh(),
            (Reg8::L, Index::Ix) => self.regs.ixl(),
            (Reg8::H, Index::Iy) => self.regs.iyh(),
            (Reg8::L, Index::Iy) => self.regs.iyl(),
            (Reg8::Mem, _) => 0, // (HL) - resolved through Operand::Mem
            (Reg8::A, _) => self.regs.a,
        }
    }

    fn set_reg8(&mut self, r: Reg8, index: Index, value: u8) {
        match (r, index) {
            (Reg8::B, _) => self.regs.b = value,
            (Reg8::C, _) => self.regs.c = value,
            (Reg8::D, _) => self.regs.d = value,
            (Reg8::E, _) => self.regs.e = value,
            (Reg8::H, Index::Hl) => self.regs.h = value,
            (Reg8::L, Index::Hl) => self.regs.l = value,
            (Reg8::H, Index::Ix) => self.regs.set_ixh(value),
            (Reg8::L, Index::Ix) => self.regs.set_ixl(value),
            (Reg8::H, Index::Iy) => self.regs.set_iyh(value),
            (Reg8::L, Index::Iy) => self.regs.set_iyl(value),
            (Reg8::Mem, _) => {} // (HL) - resolved through Operand::Mem
            (Reg8::A, _) => self.regs.a = value,
        }
    }

    /// Get register pair for loads and arithmetic.
    fn pair(&self, rp: Reg16, index: Index) -> u16 {
        match rp {
            Reg16::Bc => self.regs.bc(),
            Reg16::De => self.regs.de(),
            Reg16::Hl => self.index_reg(index),
            Reg16::Sp => self.regs.sp,
        }
    }

    fn set_pair(&mut self, rp: Reg16, index: Index, value: u16) {
        match rp {
            Reg16::Bc => self.regs.set_bc(value),
            Reg16::De => self.regs.set_de(value),
            Reg16::Hl => self.set_index_reg(index, value),
            Reg16::Sp => self.regs.sp = value,
        }
    }

    /// Get register pair for PUSH/POP (AF instead of SP).
    fn stack_pair(&self, rp: StackPair, index: Index) -> u16 {
        match rp {
            StackPair::Bc => self.regs.bc(),
            StackPair::De => self.regs.de(),
            StackPair::Hl => self.index_reg(index),
            StackPair::Af => self.regs.af(),
        }
    }

    fn set_stack_pair(&mut self, rp: StackPair, index: Index, value: u16) {
        match rp {
            StackPair::Bc => self.regs.set_bc(value),
            StackPair::De => self.regs.set_de(value),
            StackPair::Hl => self.set_index_reg(index, value),
            StackPair::Af => self.regs.set_af(value),
        }
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: Bus + InterruptLine>(&mut self, bus: &mut B) -> u32 {
        self.prev_q = self.q;
        self.q = 0;
        // INT waits out the EI shadow and any unfinished prefix chain. NMI
        // does not.
        let ei_shadow = std::mem::take(&mut self.ei_delay);
        let mid_prefix = std::mem::take(&mut self.prefix_pending);
        let after_ld_a_ir = std::mem::take(&mut self.last_was_ld_a_ir);

        let int_blocked = ei_shadow || mid_prefix;
        let t_states = if let Some(t) = self.poll_interrupts(bus, int_blocked, after_ld_a_ir) {
            t
        } else if self.regs.halted {
            // Internal NOP until an interrupt arrives.
            self.regs.inc_r();
            4
        } else {
            self.execute(bus)
        };

        self.total_ticks += t_states;
        t_states
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.regs.halted
    }

    fn reset(&mut self) {
        self.regs = Registers::power_on();
        self.ei_delay = false;
        self.q = 0;
        self.prev_q = 0;
        self.last_was_ld_a_ir = false;
        self.prefix_pending = false;
        self.total_ticks = Ticks::ZERO;
        debug!("Z80 reset ({:?})", self.config.variant);
    }
}

/// All query paths supported by the Z80.
const Z80_QUERY_PATHS: &[&str] = &[
    // Main registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "af", "bc", "de", "hl",
    // Alternate registers
    "a'", "f'", "b'", "c'", "d'", "e'", "h'", "l'",
    "af'", "bc'", "de'", "hl'",
    // Index registers
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    // Other registers
    "sp", "pc", "i", "r", "wz",
    // Flags (individual)
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    // Interrupt state
    "iff1", "iff2", "im", "ei_delay",
    // CPU state
    "halted", "ticks",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            // Main registers
            "a" => Some(self.regs.a.into()),
            "f" => Some(self.regs.f.into()),
            "b" => Some(self.regs.b.into()),
            "c" => Some(self.regs.c.into()),
            "d" => Some(self.regs.d.into()),
            "e" => Some(self.regs.e.into()),
            "h" => Some(self.regs.h.into()),
            "l" => Some(self.regs.l.into()),

            // Register pairs
            "af" => Some(self.regs.af().into()),
            "bc" => Some(self.regs.bc().into()),
            "de" => Some(self.regs.de().into()),
            "hl" => Some(self.regs.hl().into()),

            // Alternate registers
            "a'" => Some(self.regs.a_alt.into()),
            "f'" => Some(self.regs.f_alt.into()),
            "b'" => Some(self.regs.b_alt.into()),
            "c'" => Some(self.regs.c_alt.into()),
            "d'" => Some(self.regs.d_alt.into()),
            "e'" => Some(self.regs.e_alt.into()),
            "h'" => Some(self.regs.h_alt.into()),
            "l'" => Some(self.regs.l_alt.into()),

            // Alternate pairs
            "af'" => Some(self.regs.af_alt().into()),
            "bc'" => Some(self.regs.bc_alt().into()),
            "de'" => Some(self.regs.de_alt().into()),
            "hl'" => Some(self.regs.hl_alt().into()),

            // Index registers
            "ix" => Some(self.regs.ix.into()),
            "iy" => Some(self.regs.iy.into()),
            "ixh" => Some(self.regs.ixh().into()),
            "ixl" => Some(self.regs.ixl().into()),
            "iyh" => Some(self.regs.iyh().into()),
            "iyl" => Some(self.regs.iyl().into()),

            // Other registers
            "sp" => Some(self.regs.sp.into()),
            "pc" => Some(self.regs.pc.into()),
            "i" => Some(self.regs.i.into()),
            "r" => Some(self.regs.r.into()),
            "wz" => Some(self.regs.wz.into()),

            // Individual flags
            "flags.s" => Some(self.regs.flag(SF).into()),
            "flags.z" => Some(self.regs.flag(ZF).into()),
            "flags.y" => Some(self.regs.flag(YF).into()),
            "flags.h" => Some(self.regs.flag(HF).into()),
            "flags.x" => Some(self.regs.flag(XF).into()),
            "flags.p" => Some(self.regs.flag(PF).into()),
            "flags.n" => Some(self.regs.flag(NF).into()),
            "flags.c" => Some(self.regs.flag(CF).into()),

            // Interrupt state
            "iff1" => Some(self.regs.iff1.into()),
            "iff2" => Some(self.regs.iff2.into()),
            "im" => Some(self.regs.im.into()),
            "ei_delay" => Some(self.ei_delay.into()),

            // CPU state
            "halted" => Some(self.regs.halted.into()),
            "ticks" => Some(self.total_ticks.get().into()),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;

    #[test]
    fn every_query_path_resolves() {
        let cpu = Z80::new();
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "path {path} has no value");
        }
        assert_eq!(cpu.query("nope"), None);
    }

    #[test]
    fn query_reads_shadow_pairs_and_flags() {
        let mut cpu = Z80::new();
        cpu.regs.h_alt = 0x12;
        cpu.regs.l_alt = 0x34;
        cpu.regs.f = ZF;
        assert_eq!(cpu.query("hl'"), Some(Value::U16(0x1234)));
        assert_eq!(cpu.query("flags.z"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("flags.c"), Some(Value::Bool(false)));
    }

    #[test]
    fn restore_rejects_bad_interrupt_mode() {
        let mut cpu = Z80::new();
        let mut regs = cpu.snapshot();
        regs.im = 3;
        regs.pc = 0x1234;
        assert_eq!(cpu.restore(regs), Err(StateError::InvalidInterruptMode(3)));
        assert_eq!(cpu.regs.pc, 0);

        regs.im = 2;
        assert_eq!(cpu.restore(regs), Ok(()));
        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cpu.im(), 2);
    }

    #[test]
    fn reset_clears_ticks_and_state() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        bus.load(0, &[0xFB, 0x00]); // EI; NOP
        cpu.step(&mut bus);
        assert!(cpu.iff1());
        assert_eq!(cpu.total_ticks(), Ticks::new(4));

        cpu.reset();
        assert_eq!(cpu.total_ticks(), Ticks::ZERO);
        assert!(!cpu.iff1());
        assert_eq!(cpu.query("ei_delay"), Some(Value::Bool(false)));
        assert_eq!(cpu.regs, Registers::power_on());
    }
}
