//! Instruction execution for the Z80.

#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]

use emu_core::{Bus, InterruptLine};
use log::trace;

use crate::alu::{self, AluOp};
use crate::decode::{BASE, CB, CbOp, ED, EdOp, Op};
use crate::flags::{CF, PF, SF, ZF, flag_if, sz53, sz53p};
use crate::operand::{Index, Reg8};

use super::Z80;

/// A resolved 8-bit operand: a register, or memory once any displacement
/// has been fetched.
#[derive(Debug, Clone, Copy)]
enum Operand {
    Reg(Reg8, Index),
    Mem(u16),
}

impl Operand {
    const fn is_mem(self) -> bool {
        matches!(self, Self::Mem(_))
    }
}

/// Extra T-states for a memory operand reached through IX+d/IY+d.
const fn indexed_penalty(index: Index) -> u32 {
    if index.is_indexed() { 8 } else { 0 }
}

impl Z80 {
    /// Fetch and execute one instruction, including any prefixes.
    ///
    /// A run of DD/FD bytes is split across calls, one prefix each, so a
    /// call always does bounded work.
    pub(super) fn execute<B: Bus + InterruptLine>(&mut self, bus: &mut B) -> u32 {
        let mut index = Index::Hl;
        let mut prefix_t = 0;

        loop {
            let opcode = self.fetch_opcode(bus);
            match BASE[usize::from(opcode)] {
                Op::PrefixDd | Op::PrefixFd => {
                    // A following DD/FD replaces this one. End the call here
                    // and let the next step pick up the chain.
                    if matches!(bus.read(self.regs.pc), 0xDD | 0xFD) {
                        self.prefix_pending = true;
                        return 4;
                    }
                    index = Index::from_prefix(opcode);
                    prefix_t += 4;
                }
                Op::PrefixCb => {
                    return prefix_t
                        + if index.is_indexed() {
                            self.execute_indexed_cb(bus, index)
                        } else {
                            self.execute_cb(bus)
                        };
                }
                // ED discards any pending index prefix.
                Op::PrefixEd => return prefix_t + self.execute_ed(bus),
                op => return prefix_t + self.execute_base(bus, op, index),
            }
        }
    }

    /// Address of the (HL) operand. Under an index prefix this fetches the
    /// displacement and sets WZ to IX+d.
    fn mem_address<B: Bus>(&mut self, bus: &mut B, index: Index) -> u16 {
        if index.is_indexed() {
            let d = self.fetch_byte(bus) as i8;
            let addr = self.index_reg(index).wrapping_add_signed(i16::from(d));
            self.regs.wz = addr;
            addr
        } else {
            self.regs.hl()
        }
    }

    fn operand<B: Bus>(&mut self, bus: &mut B, r: Reg8, index: Index) -> Operand {
        match r {
            Reg8::Mem => Operand::Mem(self.mem_address(bus, index)),
            _ => Operand::Reg(r, index),
        }
    }

    fn read_operand<B: Bus>(&self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::Reg(r, index) => self.reg8(r, index),
            Operand::Mem(addr) => bus.read(addr),
        }
    }

    fn write_operand<B: Bus>(&mut self, bus: &mut B, operand: Operand, value: u8) {
        match operand {
            Operand::Reg(r, index) => self.set_reg8(r, index, value),
            Operand::Mem(addr) => bus.write(addr, value),
        }
    }

    fn jump_relative(&mut self, d: i8) {
        self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(d));
        self.regs.wz = self.regs.pc;
    }

    /// ALU operation on A.
    fn alu_a(&mut self, op: AluOp, value: u8) {
        let result = op.apply(self.regs.a, value, self.regs.flag(CF));
        if op != AluOp::Cp {
            self.regs.a = result.value;
        }
        self.set_f(result.flags);
    }

    // =========================================================================
    // Unprefixed instructions (and their DD/FD forms)
    // =========================================================================

    fn execute_base<B: Bus>(&mut self, bus: &mut B, op: Op, index: Index) -> u32 {
        match op {
            Op::Nop => 4,

            Op::ExAf => {
                self.regs.exchange_af();
                4
            }

            Op::Djnz => {
                let d = self.fetch_byte(bus) as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.jump_relative(d);
                    13
                } else {
                    8
                }
            }

            Op::Jr => {
                let d = self.fetch_byte(bus) as i8;
                self.jump_relative(d);
                12
            }

            Op::JrCond(cc) => {
                let d = self.fetch_byte(bus) as i8;
                if cc.holds(self.regs.f) {
                    self.jump_relative(d);
                    12
                } else {
                    7
                }
            }

            Op::LoadPairImm(rp) => {
                let value = self.fetch_word(bus);
                self.set_pair(rp, index, value);
                10
            }

            Op::AddHl(rp) => {
                let hl = self.index_reg(index);
                let rr = self.pair(rp, index);
                self.regs.wz = hl.wrapping_add(1);
                let (result, flags) = alu::add16(hl, rr);
                self.set_index_reg(index, result);
                self.set_f((self.regs.f & (SF | ZF | PF)) | flags);
                11
            }

            Op::StoreAIndirect(rp) => {
                let addr = self.pair(rp, Index::Hl);
                bus.write(addr, self.regs.a);
                self.regs.wz = (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
                7
            }

            Op::LoadAIndirect(rp) => {
                let addr = self.pair(rp, Index::Hl);
                self.regs.a = bus.read(addr);
                self.regs.wz = addr.wrapping_add(1);
                7
            }

            Op::StoreHlAbs => {
                let addr = self.fetch_word(bus);
                bus.write_word(addr, self.index_reg(index));
                self.regs.wz = addr.wrapping_add(1);
                16
            }

            Op::LoadHlAbs => {
                let addr = self.fetch_word(bus);
                let value = bus.read_word(addr);
                self.set_index_reg(index, value);
                self.regs.wz = addr.wrapping_add(1);
                16
            }

            Op::StoreAAbs => {
                let addr = self.fetch_word(bus);
                bus.write(addr, self.regs.a);
                self.regs.wz = (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
                13
            }

            Op::LoadAAbs => {
                let addr = self.fetch_word(bus);
                self.regs.a = bus.read(addr);
                self.regs.wz = addr.wrapping_add(1);
                13
            }

            Op::IncPair(rp) => {
                let value = self.pair(rp, index).wrapping_add(1);
                self.set_pair(rp, index, value);
                6
            }

            Op::DecPair(rp) => {
                let value = self.pair(rp, index).wrapping_sub(1);
                self.set_pair(rp, index, value);
                6
            }

            Op::Inc(r) | Op::Dec(r) => {
                let target = self.operand(bus, r, index);
                let value = self.read_operand(bus, target);
                let result = if matches!(op, Op::Inc(_)) {
                    alu::inc8(value)
                } else {
                    alu::dec8(value)
                };
                self.write_operand(bus, target, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
                if target.is_mem() {
                    11 + indexed_penalty(index)
                } else {
                    4
                }
            }

            Op::LoadImm(r) => {
                // Displacement comes before the immediate.
                let target = self.operand(bus, r, index);
                let value = self.fetch_byte(bus);
                self.write_operand(bus, target, value);
                match target {
                    Operand::Mem(_) if index.is_indexed() => 15,
                    Operand::Mem(_) => 10,
                    Operand::Reg(..) => 7,
                }
            }

            Op::Rlca | Op::Rrca | Op::Rla | Op::Rra => {
                let (a, f) = (self.regs.a, self.regs.f);
                let result = match op {
                    Op::Rlca => alu::rlca(a, f),
                    Op::Rrca => alu::rrca(a, f),
                    Op::Rla => alu::rla(a, f),
                    _ => alu::rra(a, f),
                };
                self.regs.a = result.value;
                self.set_f(result.flags);
                4
            }

            Op::Daa => {
                let result = alu::daa(self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.set_f(result.flags);
                4
            }

            Op::Cpl => {
                let result = alu::cpl(self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.set_f(result.flags);
                4
            }

            Op::Scf => {
                self.set_f(alu::scf(self.regs.a, self.regs.f, self.prev_q));
                4
            }

            Op::Ccf => {
                self.set_f(alu::ccf(self.regs.a, self.regs.f, self.prev_q));
                4
            }

            // PC is already past the HALT opcode.
            Op::Halt => {
                self.regs.halted = true;
                4
            }

            // LD r,(IX+d) and LD (IX+d),r use plain H and L.
            Op::Load(dst, src) => {
                if src == Reg8::Mem {
                    let addr = self.mem_address(bus, index);
                    let value = bus.read(addr);
                    self.set_reg8(dst, Index::Hl, value);
                    7 + indexed_penalty(index)
                } else if dst == Reg8::Mem {
                    let addr = self.mem_address(bus, index);
                    bus.write(addr, self.reg8(src, Index::Hl));
                    7 + indexed_penalty(index)
                } else {
                    let value = self.reg8(src, index);
                    self.set_reg8(dst, index, value);
                    4
                }
            }

            Op::Alu(alu_op, r) => {
                let source = self.operand(bus, r, index);
                let value = self.read_operand(bus, source);
                self.alu_a(alu_op, value);
                if source.is_mem() {
                    7 + indexed_penalty(index)
                } else {
                    4
                }
            }

            Op::AluImm(alu_op) => {
                let value = self.fetch_byte(bus);
                self.alu_a(alu_op, value);
                7
            }

            Op::RetCond(cc) => {
                if cc.holds(self.regs.f) {
                    self.ret(bus);
                    11
                } else {
                    5
                }
            }

            Op::Pop(rp) => {
                let value = self.pop(bus);
                self.set_stack_pair(rp, index, value);
                10
            }

            Op::Ret => {
                self.ret(bus);
                10
            }

            Op::Exx => {
                self.regs.exchange_main();
                4
            }

            Op::JpHl => {
                self.regs.pc = self.index_reg(index);
                4
            }

            Op::LoadSpHl => {
                self.regs.sp = self.index_reg(index);
                6
            }

            Op::JpCond(cc) => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                if cc.holds(self.regs.f) {
                    self.regs.pc = addr;
                }
                10
            }

            Op::Jp => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                self.regs.pc = addr;
                10
            }

            Op::OutImmA => {
                let n = self.fetch_byte(bus);
                let a = self.regs.a;
                bus.io_write((u16::from(a) << 8) | u16::from(n), a);
                self.regs.wz = (u16::from(a) << 8) | u16::from(n.wrapping_add(1));
                11
            }

            Op::InAImm => {
                let n = self.fetch_byte(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.a = bus.io_read(port);
                self.regs.wz = port.wrapping_add(1);
                11
            }

            Op::ExSpHl => {
                let sp = self.regs.sp;
                let value = bus.read_word(sp);
                bus.write_word(sp, self.index_reg(index));
                self.set_index_reg(index, value);
                self.regs.wz = value;
                19
            }

            // Never affected by DD/FD.
            Op::ExDeHl => {
                let de = self.regs.de();
                self.regs.set_de(self.regs.hl());
                self.regs.set_hl(de);
                4
            }

            Op::Di => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
                4
            }

            Op::Ei => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                self.ei_delay = true;
                4
            }

            Op::CallCond(cc) => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                if cc.holds(self.regs.f) {
                    self.push(bus, self.regs.pc);
                    self.regs.pc = addr;
                    17
                } else {
                    10
                }
            }

            Op::Push(rp) => {
                let value = self.stack_pair(rp, index);
                self.push(bus, value);
                11
            }

            Op::Call => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                self.push(bus, self.regs.pc);
                self.regs.pc = addr;
                17
            }

            Op::Rst(vector) => {
                self.push(bus, self.regs.pc);
                self.regs.pc = u16::from(vector);
                self.regs.wz = self.regs.pc;
                11
            }

            // Consumed by the prefix loop in `execute`.
            Op::PrefixCb | Op::PrefixDd | Op::PrefixEd | Op::PrefixFd => 4,
        }
    }

    // =========================================================================
    // CB prefix
    // =========================================================================

    /// Rotate/shift (with flags), RES or SET. BIT leaves the value alone.
    fn cb_modify(&mut self, op: CbOp, value: u8) -> u8 {
        match op {
            CbOp::Shift(shift, _) => {
                let result = shift.apply(value, self.regs.flag(CF));
                self.set_f(result.flags);
                result.value
            }
            CbOp::Res(n, _) => value & !(1 << n),
            CbOp::Set(n, _) => value | (1 << n),
            CbOp::Bit(..) => value,
        }
    }

    fn execute_cb<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let opcode = self.fetch_opcode(bus);
        let op = CB[usize::from(opcode)];

        match (op, op.reg()) {
            // BIT n,(HL): X/Y leak from WZ.
            (CbOp::Bit(n, _), Reg8::Mem) => {
                let value = bus.read(self.regs.hl());
                let wz_hi = (self.regs.wz >> 8) as u8;
                self.set_f(alu::bit(n, value, wz_hi, self.regs.f));
                12
            }
            (CbOp::Bit(n, _), r) => {
                let value = self.reg8(r, Index::Hl);
                self.set_f(alu::bit(n, value, value, self.regs.f));
                8
            }
            (_, Reg8::Mem) => {
                let addr = self.regs.hl();
                let value = bus.read(addr);
                let result = self.cb_modify(op, value);
                bus.write(addr, result);
                15
            }
            (_, r) => {
                let value = self.reg8(r, Index::Hl);
                let result = self.cb_modify(op, value);
                self.set_reg8(r, Index::Hl, result);
                8
            }
        }
    }

    /// DDCB d op / FDCB d op. The opcode byte is read after the
    /// displacement and is not an M1 fetch.
    fn execute_indexed_cb<B: Bus>(&mut self, bus: &mut B, index: Index) -> u32 {
        let addr = self.mem_address(bus, index);
        let opcode = self.fetch_byte(bus);
        let op = CB[usize::from(opcode)];
        let value = bus.read(addr);

        if let CbOp::Bit(n, _) = op {
            self.set_f(alu::bit(n, value, (addr >> 8) as u8, self.regs.f));
            return 16;
        }

        let result = self.cb_modify(op, value);
        bus.write(addr, result);
        // Undocumented: the result is also copied into the register field.
        let r = op.reg();
        if r != Reg8::Mem {
            self.set_reg8(r, Index::Hl, result);
        }
        19
    }

    // =========================================================================
    // ED prefix
    // =========================================================================

    fn execute_ed<B: Bus + InterruptLine>(&mut self, bus: &mut B) -> u32 {
        let opcode = self.fetch_opcode(bus);
        let op = ED[usize::from(opcode)];

        match op {
            EdOp::InC(r) => {
                let port = self.regs.bc();
                let value = bus.io_read(port);
                self.regs.wz = port.wrapping_add(1);
                if r != Reg8::Mem {
                    self.set_reg8(r, Index::Hl, value);
                }
                self.set_f((self.regs.f & CF) | sz53p(value));
                12
            }

            EdOp::OutC(r) => {
                let port = self.regs.bc();
                let value = if r == Reg8::Mem {
                    self.config.out_c_zero_value()
                } else {
                    self.reg8(r, Index::Hl)
                };
                bus.io_write(port, value);
                self.regs.wz = port.wrapping_add(1);
                12
            }

            EdOp::SbcHl(rp) | EdOp::AdcHl(rp) => {
                let hl = self.regs.hl();
                let rr = self.pair(rp, Index::Hl);
                let carry = self.regs.flag(CF);
                self.regs.wz = hl.wrapping_add(1);
                let (result, flags) = if matches!(op, EdOp::SbcHl(_)) {
                    alu::sbc16(hl, rr, carry)
                } else {
                    alu::adc16(hl, rr, carry)
                };
                self.regs.set_hl(result);
                self.set_f(flags);
                15
            }

            EdOp::StorePairAbs(rp) => {
                let addr = self.fetch_word(bus);
                bus.write_word(addr, self.pair(rp, Index::Hl));
                self.regs.wz = addr.wrapping_add(1);
                20
            }

            EdOp::LoadPairAbs(rp) => {
                let addr = self.fetch_word(bus);
                let value = bus.read_word(addr);
                self.set_pair(rp, Index::Hl, value);
                self.regs.wz = addr.wrapping_add(1);
                20
            }

            EdOp::Neg => {
                let result = alu::sub8(0, self.regs.a);
                self.regs.a = result.value;
                self.set_f(result.flags);
                8
            }

            EdOp::Retn => {
                self.regs.iff1 = self.regs.iff2;
                self.ret(bus);
                14
            }

            EdOp::Reti => {
                self.regs.iff1 = self.regs.iff2;
                self.ret(bus);
                bus.reti();
                14
            }

            EdOp::Im(mode) => {
                self.regs.im = mode;
                8
            }

            EdOp::LoadIA => {
                self.regs.i = self.regs.a;
                9
            }

            EdOp::LoadRA => {
                self.regs.r = self.regs.a;
                9
            }

            EdOp::LoadAI | EdOp::LoadAR => {
                self.regs.a = if op == EdOp::LoadAI {
                    self.regs.i
                } else {
                    self.regs.r
                };
                self.set_f(
                    (self.regs.f & CF) | sz53(self.regs.a) | flag_if(self.regs.iff2, PF),
                );
                self.last_was_ld_a_ir = true;
                9
            }

            EdOp::Rrd => {
                let addr = self.regs.hl();
                let mem = bus.read(addr);
                let a = self.regs.a;
                bus.write(addr, (a << 4) | (mem >> 4));
                self.regs.a = (a & 0xF0) | (mem & 0x0F);
                self.regs.wz = addr.wrapping_add(1);
                self.set_f((self.regs.f & CF) | sz53p(self.regs.a));
                18
            }

            EdOp::Rld => {
                let addr = self.regs.hl();
                let mem = bus.read(addr);
                let a = self.regs.a;
                bus.write(addr, (mem << 4) | (a & 0x0F));
                self.regs.a = (a & 0xF0) | (mem >> 4);
                self.regs.wz = addr.wrapping_add(1);
                self.set_f((self.regs.f & CF) | sz53p(self.regs.a));
                18
            }

            EdOp::Block(block) => self.execute_block(bus, block),

            EdOp::Undefined => {
                trace!("Undefined opcode ED {opcode:02X} at {:04X}", self.regs.pc.wrapping_sub(2));
                8
            }
        }
    }
}
