//! Exhaustive checks of the 8-bit ALU opcodes.
//!
//! Every input combination is run through the CPU and compared against a
//! reference written independently of the emulator's own flag logic: wide
//! signed/unsigned arithmetic for add/subtract, the published DAA tables,
//! and `rotate_left`/`i8` shifts for the rotate group.

use emu_core::{Cpu, SimpleBus};
use zilog_z80::{CF, HF, NF, PF, Registers, SF, XF, YF, Z80, ZF};

/// Failures reported per test before the rest are dropped.
const MAX_REPORTED: usize = 20;

#[derive(Clone, Copy, Debug)]
enum Op {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

const OPS: [Op; 8] = [Op::Add, Op::Adc, Op::Sub, Op::Sbc, Op::And, Op::Xor, Op::Or, Op::Cp];

fn parity_table() -> [bool; 256] {
    let mut table = [false; 256];
    for (value, even) in table.iter_mut().enumerate() {
        *even = value.count_ones() % 2 == 0;
    }
    table
}

/// Expected (A, F) after `op a, b` with carry-in `carry`.
fn reference(op: Op, a: u8, b: u8, carry: bool, parity: &[bool; 256]) -> (u8, u8) {
    let c = i32::from(carry);
    let (ai, bi) = (i32::from(a), i32::from(b));
    let (sa, sb) = (i32::from(a as i8), i32::from(b as i8));

    let (result, mut f) = match op {
        Op::Add | Op::Adc => {
            let c = if matches!(op, Op::Adc) { c } else { 0 };
            let wide = ai + bi + c;
            let signed = sa + sb + c;
            let result = wide as u8;
            let mut f = 0;
            if wide > 0xFF {
                f |= CF;
            }
            if !(-128..=127).contains(&signed) {
                f |= PF;
            }
            if (a ^ b ^ result) & 0x10 != 0 {
                f |= HF;
            }
            (result, f)
        }
        Op::Sub | Op::Sbc | Op::Cp => {
            let c = if matches!(op, Op::Sbc) { c } else { 0 };
            let wide = ai - bi - c;
            let signed = sa - sb - c;
            let result = wide as u8;
            let mut f = NF;
            if wide < 0 {
                f |= CF;
            }
            if !(-128..=127).contains(&signed) {
                f |= PF;
            }
            if (a ^ b ^ result) & 0x10 != 0 {
                f |= HF;
            }
            (result, f)
        }
        Op::And | Op::Xor | Op::Or => {
            let result = match op {
                Op::And => a & b,
                Op::Xor => a ^ b,
                _ => a | b,
            };
            let mut f = if matches!(op, Op::And) { HF } else { 0 };
            if parity[usize::from(result)] {
                f |= PF;
            }
            (result, f)
        }
    };

    if result & 0x80 != 0 {
        f |= SF;
    }
    if result == 0 {
        f |= ZF;
    }

    // CP leaves A alone and takes X/Y from the operand.
    if matches!(op, Op::Cp) {
        (a, f | (b & (YF | XF)))
    } else {
        (result, f | (result & (YF | XF)))
    }
}

/// Run the one instruction at 0x0000 from the given A, B and F.
fn execute(cpu: &mut Z80, bus: &mut SimpleBus, a: u8, b: u8, f: u8) -> (u32, Registers) {
    let regs = cpu.regs_mut();
    regs.pc = 0;
    regs.a = a;
    regs.b = b;
    regs.f = f;
    let t_states = cpu.step(bus);
    (t_states, cpu.registers())
}

fn record(
    failures: &mut Vec<String>,
    label: impl FnOnce() -> String,
    actual: (u8, u8),
    expected: (u8, u8),
) {
    if actual != expected && failures.len() < MAX_REPORTED {
        failures.push(format!(
            "{}: got {:02X}/F={:02X}, want {:02X}/F={:02X}",
            label(),
            actual.0,
            actual.1,
            expected.0,
            expected.1
        ));
    }
}

/// S, Z, Y and X of an 8-bit result.
fn sz53(result: u8) -> u8 {
    let mut f = result & (SF | YF | XF);
    if result == 0 {
        f |= ZF;
    }
    f
}

#[test]
fn alu_register_ops_match_reference() {
    let parity = parity_table();
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    let mut failures = Vec::new();

    for (index, &op) in OPS.iter().enumerate() {
        // op A, B
        let opcode = 0x80 | ((index as u8) << 3);
        bus.load(0x0000, &[opcode]);

        for a in 0..=0xFFu8 {
            for b in 0..=0xFFu8 {
                for carry in [false, true] {
                    let f = if carry { CF } else { 0 };
                    let (t_states, regs) = execute(&mut cpu, &mut bus, a, b, f);
                    assert_eq!(t_states, 4);
                    record(
                        &mut failures,
                        || format!("{op:?} A={a:02X} B={b:02X} C={}", u8::from(carry)),
                        (regs.a, regs.f),
                        reference(op, a, b, carry, &parity),
                    );
                }
            }
        }
    }

    assert!(failures.is_empty(), "ALU mismatches:\n{}", failures.join("\n"));
}

#[test]
fn alu_immediate_forms_agree_with_register_forms() {
    let parity = parity_table();

    for (index, &op) in OPS.iter().enumerate() {
        // op A, n
        let opcode = 0xC6 | ((index as u8) << 3);
        for &(a, n) in &[(0x00, 0x00), (0x7F, 0x01), (0x80, 0xFF), (0x3C, 0xC3), (0x10, 0x0F)] {
            let mut bus = SimpleBus::new();
            bus.load(0x0000, &[opcode, n]);
            let mut cpu = Z80::new();
            cpu.regs_mut().a = a;
            cpu.regs_mut().f = CF;

            assert_eq!(cpu.step(&mut bus), 7);
            assert_eq!(
                (cpu.registers().a, cpu.registers().f),
                reference(op, a, n, true, &parity),
                "{op:?} A={a:02X} n={n:02X}"
            );
        }
    }
}

/// Incoming F values: carry clear/set, with the other bits clear/set.
const F_INPUTS: [u8; 4] = [0x00, CF, !CF, 0xFF];

#[test]
fn inc_dec_match_reference() {
    let parity = parity_table();
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    let mut failures = Vec::new();

    // INC B and DEC B behave as ADD/SUB 1 with the carry left alone.
    for (opcode, op) in [(0x04, Op::Add), (0x05, Op::Sub)] {
        bus.load(0x0000, &[opcode]);
        for b in 0..=0xFFu8 {
            for f_in in F_INPUTS {
                let (t_states, regs) = execute(&mut cpu, &mut bus, 0, b, f_in);
                assert_eq!(t_states, 4);
                let (result, f) = reference(op, b, 1, false, &parity);
                record(
                    &mut failures,
                    || format!("{opcode:02X} B={b:02X} F={f_in:02X}"),
                    (regs.b, regs.f),
                    (result, (f & !CF) | (f_in & CF)),
                );
            }
        }
    }

    assert!(failures.is_empty(), "INC/DEC mismatches:\n{}", failures.join("\n"));
}

#[test]
fn neg_matches_reference() {
    let parity = parity_table();
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0xED, 0x44]);
    let mut failures = Vec::new();

    for a in 0..=0xFFu8 {
        for f_in in F_INPUTS {
            let (t_states, regs) = execute(&mut cpu, &mut bus, a, 0, f_in);
            assert_eq!(t_states, 8);
            record(
                &mut failures,
                || format!("NEG A={a:02X} F={f_in:02X}"),
                (regs.a, regs.f),
                reference(Op::Sub, 0, a, false, &parity),
            );
        }
    }

    assert!(failures.is_empty(), "NEG mismatches:\n{}", failures.join("\n"));
}

/// DAA from the correction tables in "The Undocumented Z80 Documented".
fn daa_reference(a: u8, f: u8, parity: &[bool; 256]) -> (u8, u8) {
    let (hi, lo) = (a >> 4, a & 0x0F);
    let (c, h, n) = (f & CF != 0, f & HF != 0, f & NF != 0);
    let lo_digit = lo <= 9;

    let diff = match (c, hi, h, lo_digit) {
        (false, 0..=9, false, true) => 0x00,
        (false, 0..=9, true, true) | (false, 0..=8, _, false) => 0x06,
        (false, 0xA..=0xF, false, true) | (true, _, false, true) => 0x60,
        (true, _, true, true)
        | (true, _, _, false)
        | (false, 9..=0xF, _, false)
        | (false, 0xA..=0xF, true, true) => 0x66,
        _ => unreachable!("high nibble {hi:X}"),
    };

    let carry_out = match (c, hi, lo_digit) {
        (false, 0..=9, true) | (false, 0..=8, false) => false,
        _ => true,
    };

    let half_out = match (n, h) {
        (false, _) => !lo_digit,
        (true, false) => false,
        (true, true) => lo <= 5,
    };

    let result = if n { a.wrapping_sub(diff) } else { a.wrapping_add(diff) };
    let mut flags = sz53(result) | (f & NF);
    if parity[usize::from(result)] {
        flags |= PF;
    }
    if half_out {
        flags |= HF;
    }
    if carry_out {
        flags |= CF;
    }
    (result, flags)
}

#[test]
fn daa_matches_reference() {
    let parity = parity_table();
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0x27]);
    let mut failures = Vec::new();

    for a in 0..=0xFFu8 {
        for hnc in 0..8u8 {
            let base = (if hnc & 1 != 0 { HF } else { 0 })
                | (if hnc & 2 != 0 { NF } else { 0 })
                | (if hnc & 4 != 0 { CF } else { 0 });
            for f_in in [base, base | SF | ZF | YF | XF | PF] {
                let (t_states, regs) = execute(&mut cpu, &mut bus, a, 0, f_in);
                assert_eq!(t_states, 4);
                record(
                    &mut failures,
                    || format!("DAA A={a:02X} F={f_in:02X}"),
                    (regs.a, regs.f),
                    daa_reference(a, f_in, &parity),
                );
            }
        }
    }

    assert!(failures.is_empty(), "DAA mismatches:\n{}", failures.join("\n"));
}

const SHIFT_NAMES: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];

/// Result and carry-out of CB shift group `op` (the y field).
fn shift_reference(op: u8, value: u8, carry_in: bool) -> (u8, bool) {
    let cin = u8::from(carry_in);
    let top = value & 0x80 != 0;
    let bottom = value & 0x01 != 0;
    match op {
        0 => (value.rotate_left(1), top),
        1 => (value.rotate_right(1), bottom),
        2 => ((value << 1) | cin, top),
        3 => ((value >> 1) | (cin << 7), bottom),
        4 => (value << 1, top),
        5 => (((value as i8) >> 1) as u8, bottom),
        6 => ((value << 1) | 1, top),
        _ => (value >> 1, bottom),
    }
}

#[test]
fn cb_shifts_match_reference() {
    let parity = parity_table();
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    let mut failures = Vec::new();

    for op in 0..8u8 {
        // op B
        bus.load(0x0000, &[0xCB, op << 3]);
        for b in 0..=0xFFu8 {
            for f_in in F_INPUTS {
                let (t_states, regs) = execute(&mut cpu, &mut bus, 0, b, f_in);
                assert_eq!(t_states, 8);

                let (result, carry) = shift_reference(op, b, f_in & CF != 0);
                let mut f = sz53(result);
                if parity[usize::from(result)] {
                    f |= PF;
                }
                if carry {
                    f |= CF;
                }
                record(
                    &mut failures,
                    || format!("{} B={b:02X} F={f_in:02X}", SHIFT_NAMES[usize::from(op)]),
                    (regs.b, regs.f),
                    (result, f),
                );
            }
        }
    }

    assert!(failures.is_empty(), "CB shift mismatches:\n{}", failures.join("\n"));
}

#[test]
fn accumulator_rotates_match_reference() {
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    let mut failures = Vec::new();

    // RLCA, RRCA, RLA, RRA share results with RLC, RRC, RL, RR but keep
    // S, Z and P/V.
    for op in 0..4u8 {
        let opcode = 0x07 | (op << 3);
        bus.load(0x0000, &[opcode]);
        for a in 0..=0xFFu8 {
            for f_in in 0..=0xFFu8 {
                let (t_states, regs) = execute(&mut cpu, &mut bus, a, 0, f_in);
                assert_eq!(t_states, 4);

                let (result, carry) = shift_reference(op, a, f_in & CF != 0);
                let mut f = (f_in & (SF | ZF | PF)) | (result & (YF | XF));
                if carry {
                    f |= CF;
                }
                record(
                    &mut failures,
                    || format!("{opcode:02X} A={a:02X} F={f_in:02X}"),
                    (regs.a, regs.f),
                    (result, f),
                );
            }
        }
    }

    assert!(failures.is_empty(), "rotate mismatches:\n{}", failures.join("\n"));
}
