use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::bus::{Bus, FlatBus};
use crate::intc::InterruptController;

fn cpu_with(program: &[u8]) -> (Cpu, FlatBus) {
    let mut bus = FlatBus::new();
    bus.load(0x0000, program);
    let mut cpu = Cpu::new();
    cpu.regs.sp = 0xF000;
    (cpu, bus)
}

/// CPU plus interrupt controller wired through the bus registry.
fn wired(program: &[u8]) -> (Cpu, FlatBus, Arc<InterruptController>) {
    let (mut cpu, mut bus) = cpu_with(program);
    let intc = Arc::new(InterruptController::new());
    bus.register_device(cpu.signals());
    bus.register_device(Arc::clone(&intc));
    bus.reset_all();
    cpu.attach_to(&bus);
    (cpu, bus, intc)
}

#[test]
fn reset_state_enables_interrupts_in_mode_two() {
    let cpu = Cpu::new();
    assert_eq!(cpu.regs.pc, 0);
    assert!(cpu.regs.iff1 && cpu.regs.iff2);
    assert_eq!(cpu.regs.im, InterruptMode::Im2);
    assert_eq!(cpu.cost(), 0);
}

#[test]
fn nop_advances_pc() {
    let (mut cpu, mut bus) = cpu_with(&[0x00, 0x00]);
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.regs.pc, 1);
    cpu.step(&mut bus);
    assert_eq!(cpu.cost(), 8);
}

#[test]
fn pc_wraps_at_top_of_memory() {
    let (mut cpu, mut bus) = cpu_with(&[]);
    cpu.regs.pc = 0xFFFF;
    bus.poke_byte(0xFFFF, 0x00);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x0000);
}

#[test]
fn add_a_a_with_0x80() {
    let (mut cpu, mut bus) = cpu_with(&[0x3E, 0x80, 0x87]);
    assert_eq!(cpu.step(&mut bus), 7);
    assert_eq!(cpu.step(&mut bus), 4);
    let f = cpu.regs.f;
    assert_eq!(cpu.regs.a, 0x00);
    assert!(f.contains(Flags::C));
    assert!(!f.contains(Flags::H));
    assert!(f.contains(Flags::PV));
    assert!(f.contains(Flags::Z));
    assert!(!f.contains(Flags::S));
    assert!(!f.contains(Flags::N));
}

#[test]
fn logical_ops_report_parity_from_table() {
    // OR A, AND A, XOR 0 all leave A unchanged and report its parity.
    for program in [[0xB7u8, 0x00], [0xA7, 0x00], [0xEE, 0x00]] {
        let (mut cpu, mut bus) = cpu_with(&program);
        for value in 0..=u8::MAX {
            cpu.regs.pc = 0;
            cpu.regs.a = value;
            cpu.step(&mut bus);
            assert_eq!(cpu.regs.a, value);
            assert_eq!(cpu.regs.f.contains(Flags::PV), PARITY[value as usize]);
        }
    }
}

#[test]
fn daa_corrects_bcd_sum() {
    // LD A,15 / ADD A,27 / DAA
    let (mut cpu, mut bus) = cpu_with(&[0x3E, 0x15, 0xC6, 0x27, 0x27]);
    cpu.step_n(&mut bus, 3).unwrap();
    assert_eq!(cpu.regs.a, 0x42);
    assert!(!cpu.regs.f.contains(Flags::C));
}

#[test]
fn ld_register_and_memory_forms() {
    // LD HL,4000 / LD (HL),5A / LD B,(HL) / LD C,B / LD (8000),A / LD A,(8000)
    let (mut cpu, mut bus) = cpu_with(&[
        0x21, 0x00, 0x40, 0x36, 0x5A, 0x46, 0x48, 0x3E, 0x11, 0x32, 0x00, 0x80, 0x3E, 0x00,
        0x3A, 0x00, 0x80,
    ]);
    let costs: Vec<u32> = (0..8).map(|_| cpu.step(&mut bus)).collect();
    assert_eq!(costs, vec![10, 10, 7, 4, 7, 13, 7, 13]);
    assert_eq!(bus.peek_byte(0x4000), 0x5A);
    assert_eq!(cpu.regs.b, 0x5A);
    assert_eq!(cpu.regs.c, 0x5A);
    assert_eq!(cpu.regs.a, 0x11);
}

#[test]
fn ld_hl_direct_round_trips_through_memory() {
    // LD HL,BEEF / LD (9000),HL / LD HL,0 / LD HL,(9000)
    let (mut cpu, mut bus) = cpu_with(&[
        0x21, 0xEF, 0xBE, 0x22, 0x00, 0x90, 0x21, 0x00, 0x00, 0x2A, 0x00, 0x90,
    ]);
    cpu.step_n(&mut bus, 4).unwrap();
    assert_eq!(bus.peek_byte(0x9000), 0xEF);
    assert_eq!(bus.peek_byte(0x9001), 0xBE);
    assert_eq!(cpu.regs.hl(), 0xBEEF);
}

/// Base-opcode T-states with every flag clear, so NZ/NC/PO/P conditions
/// hold and Z/C/PE/M do not. DJNZ runs with B=0 and is taken. Prefix bytes
/// are 0.
#[rustfmt::skip]
const BASE_COSTS: [u32; 256] = [
    4, 10,  7,  6,  4,  4,  7,  4,  4, 11,  7,  6,  4,  4,  7,  4,
   13, 10,  7,  6,  4,  4,  7,  4, 12, 11,  7,  6,  4,  4,  7,  4,
   12, 10, 16,  6,  4,  4,  7,  4,  7, 11, 16,  6,  4,  4,  7,  4,
   12, 10, 13,  6, 11, 11, 10,  4,  7, 11, 13,  6,  4,  4,  7,  4,
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
    7,  7,  7,  7,  7,  7,  4,  7,  4,  4,  4,  4,  4,  4,  7,  4,
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
   11, 10, 10, 10, 17, 11,  7, 11,  5, 10, 10,  0, 10, 17,  7, 11,
   11, 10, 10, 11, 17, 11,  7, 11,  5,  4, 10, 11, 10,  0,  7, 11,
   11, 10, 10, 19, 17, 11,  7, 11,  5,  4, 10,  4, 10,  0,  7, 11,
   11, 10, 10,  4, 17, 11,  7, 11,  5,  6, 10,  4, 10,  0,  7, 11,
];

/// Conditional opcodes whose cost changes once every flag is set.
const FLAGS_SET_COSTS: [(u8, u32); 20] = [
    (0x20, 7), (0x28, 12), (0x30, 7), (0x38, 12),
    (0xC0, 5), (0xC8, 11), (0xD0, 5), (0xD8, 11),
    (0xE0, 5), (0xE8, 11), (0xF0, 5), (0xF8, 11),
    (0xC4, 10), (0xCC, 17), (0xD4, 10), (0xDC, 17),
    (0xE4, 10), (0xEC, 17), (0xF4, 10), (0xFC, 17),
];

fn single_opcode_cost(program: &[u8], flags: Flags) -> u32 {
    let (mut cpu, mut bus) = cpu_with(program);
    cpu.regs.f = flags;
    cpu.regs.set_hl(0x4000);
    cpu.step(&mut bus)
}

#[test]
fn base_opcode_costs_match_table() {
    for opcode in 0..=u8::MAX {
        let expected = BASE_COSTS[opcode as usize];
        if expected == 0 {
            continue;
        }
        let cost = single_opcode_cost(&[opcode, 0x00, 0x00], Flags::empty());
        assert_eq!(cost, expected, "opcode {opcode:02X} with flags clear");

        let expected = FLAGS_SET_COSTS
            .iter()
            .find(|&&(op, _)| op == opcode)
            .map_or(expected, |&(_, cost)| cost);
        let cost = single_opcode_cost(&[opcode, 0x00, 0x00], Flags::all());
        assert_eq!(cost, expected, "opcode {opcode:02X} with flags set");
    }
}

#[test]
fn cb_opcode_costs_match_table() {
    for op in 0..=u8::MAX {
        let memory = op & 0x07 == 6;
        let expected = match (op >> 6, memory) {
            (1, true) => 12,
            (_, true) => 15,
            (_, false) => 8,
        };
        let cost = single_opcode_cost(&[0xCB, op], Flags::empty());
        assert_eq!(cost, expected, "opcode CB {op:02X}");

        let expected = if op >> 6 == 1 { 20 } else { 23 };
        let cost = single_opcode_cost(&[0xDD, 0xCB, 0x00, op], Flags::empty());
        assert_eq!(cost, expected, "opcode DD CB 00 {op:02X}");
    }
}

#[test]
fn jr_cc_costs_depend_on_condition() {
    let (mut cpu, mut bus) = cpu_with(&[0x20, 0x02]);
    cpu.regs.f = Flags::empty();
    assert_eq!(cpu.step(&mut bus), 12);
    assert_eq!(cpu.regs.pc, 0x0004);

    cpu.regs.pc = 0;
    cpu.regs.f = Flags::Z;
    assert_eq!(cpu.step(&mut bus), 7);
    assert_eq!(cpu.regs.pc, 0x0002);
}

#[test]
fn djnz_costs_13_taken_8_not_taken() {
    let (mut cpu, mut bus) = cpu_with(&[0x10, 0xFE]);
    cpu.regs.b = 2;
    assert_eq!(cpu.step(&mut bus), 13);
    assert_eq!(cpu.regs.pc, 0x0000);
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.pc, 0x0002);
    assert_eq!(cpu.regs.b, 0);
}

#[test]
fn call_and_ret_conditional_costs() {
    // CALL NZ,0010 at 0; RET Z at 0x10
    let mut program = vec![0u8; 0x20];
    program[..3].copy_from_slice(&[0xC4, 0x10, 0x00]);
    program[0x10] = 0xC8;
    let (mut cpu, mut bus) = cpu_with(&program);

    cpu.regs.f = Flags::Z;
    assert_eq!(cpu.step(&mut bus), 10);
    assert_eq!(cpu.regs.pc, 0x0003);

    cpu.regs.pc = 0;
    cpu.regs.f = Flags::empty();
    assert_eq!(cpu.step(&mut bus), 17);
    assert_eq!(cpu.regs.pc, 0x0010);
    assert_eq!(cpu.regs.sp, 0xEFFE);
    assert_eq!(bus.peek_word(0xEFFE), 0x0003);

    assert_eq!(cpu.step(&mut bus), 5);
    assert_eq!(cpu.regs.pc, 0x0011);

    cpu.regs.pc = 0x0010;
    cpu.regs.f = Flags::Z;
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.regs.pc, 0x0003);
    assert_eq!(cpu.regs.sp, 0xF000);
}

#[test]
fn jp_cc_costs_10_either_way() {
    let (mut cpu, mut bus) = cpu_with(&[0xCA, 0x00, 0x20]);
    cpu.regs.f = Flags::empty();
    assert_eq!(cpu.step(&mut bus), 10);
    assert_eq!(cpu.regs.pc, 0x0003);
    cpu.regs.pc = 0;
    cpu.regs.f = Flags::Z;
    assert_eq!(cpu.step(&mut bus), 10);
    assert_eq!(cpu.regs.pc, 0x2000);
}

#[test]
fn parity_conditions_follow_pv() {
    // JP PE,1234
    let (mut cpu, mut bus) = cpu_with(&[0xEA, 0x34, 0x12]);
    cpu.regs.f = Flags::PV;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x1234);
}

#[test]
fn rst_pushes_return_address() {
    let (mut cpu, mut bus) = cpu_with(&[0x00, 0xEF]);
    cpu.step(&mut bus);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.regs.pc, 0x0028);
    assert_eq!(bus.peek_word(cpu.regs.sp), 0x0002);
}

#[test]
fn push_pop_and_exchanges() {
    // LD BC,1234 / PUSH BC / POP AF / EX AF,AF' / EXX / EX DE,HL
    let (mut cpu, mut bus) = cpu_with(&[0x01, 0x34, 0x12, 0xC5, 0xF1, 0x08, 0xD9, 0xEB]);
    cpu.regs.set_hl(0xAAAA);
    assert_eq!(cpu.step(&mut bus), 10);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.step(&mut bus), 10);
    assert_eq!(cpu.regs.af(), 0x1234);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.af_alt, 0x1234);
    assert_eq!(cpu.regs.af(), 0x0000);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.hl_alt, 0xAAAA);
    assert_eq!(cpu.regs.bc_alt, 0x1234);

    cpu.regs.set_de(0x1111);
    cpu.regs.set_hl(0x2222);
    cpu.step(&mut bus);
    assert_eq!((cpu.regs.de(), cpu.regs.hl()), (0x2222, 0x1111));
}

#[test]
fn ex_sp_hl_swaps_with_stack_top() {
    let (mut cpu, mut bus) = cpu_with(&[0xE3]);
    bus.poke_word(0xF000, 0xCAFE);
    cpu.regs.set_hl(0x1234);
    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(cpu.regs.hl(), 0xCAFE);
    assert_eq!(bus.peek_word(0xF000), 0x1234);
}

#[test]
fn inc_dec_memory_and_pairs() {
    // LD HL,5000 / INC (HL) / DEC (HL) / DEC (HL) / INC HL / DEC BC
    let (mut cpu, mut bus) = cpu_with(&[0x21, 0x00, 0x50, 0x34, 0x35, 0x35, 0x23, 0x0B]);
    cpu.step(&mut bus);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(bus.peek_byte(0x5000), 1);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(bus.peek_byte(0x5000), 0xFF);
    assert!(cpu.regs.f.contains(Flags::N | Flags::S | Flags::H));
    assert_eq!(cpu.step(&mut bus), 6);
    assert_eq!(cpu.regs.hl(), 0x5001);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.bc(), 0xFFFF);
}

#[test]
fn port_io_uses_bus_ports() {
    // IN A,(10) / OUT (20),A
    let (mut cpu, mut bus) = cpu_with(&[0xDB, 0x10, 0xD3, 0x20]);
    bus.set_port(0x10, 0x7E);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.regs.a, 0x7E);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(bus.port(0x20), 0x7E);
}

#[test]
fn cb_rotates_bits_and_memory_costs() {
    // RLC B / BIT 7,B / SET 0,(HL) / RES 7,A / SLL C / BIT 0,(HL)
    let (mut cpu, mut bus) = cpu_with(&[
        0xCB, 0x00, 0xCB, 0x78, 0xCB, 0xC6, 0xCB, 0xBF, 0xCB, 0x31, 0xCB, 0x46,
    ]);
    cpu.regs.b = 0x81;
    cpu.regs.a = 0xFF;
    cpu.regs.c = 0x00;
    cpu.regs.set_hl(0x6000);

    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.b, 0x03);
    assert!(cpu.regs.f.contains(Flags::C));

    cpu.step(&mut bus);
    assert!(cpu.regs.f.contains(Flags::Z));

    assert_eq!(cpu.step(&mut bus), 15);
    assert_eq!(bus.peek_byte(0x6000), 0x01);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.a, 0x7F);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.c, 0x01);

    assert_eq!(cpu.step(&mut bus), 12);
    assert!(!cpu.regs.f.contains(Flags::Z));
}

#[test]
fn index_register_forms() {
    let (mut cpu, mut bus) = cpu_with(&[
        0xDD, 0x21, 0x00, 0x70, // LD IX,7000
        0xDD, 0x36, 0x05, 0x41, // LD (IX+5),41
        0xDD, 0x34, 0x05, // INC (IX+5)
        0xDD, 0x7E, 0x05, // LD A,(IX+5)
        0xDD, 0x26, 0x12, // LD IXH,12
        0xDD, 0x7C, // LD A,IXH
        0xDD, 0x86, 0xFF, // ADD A,(IX-1)
        0xFD, 0x21, 0x34, 0x12, // LD IY,1234
        0xFD, 0xE5, // PUSH IY
        0xDD, 0xE1, // POP IX
    ]);
    bus.poke_byte(0x11FF, 0x01);

    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.regs.ix, 0x7000);
    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(bus.peek_byte(0x7005), 0x41);
    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(bus.peek_byte(0x7005), 0x42);
    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(cpu.regs.a, 0x42);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.regs.ix, 0x1200);
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.a, 0x12);
    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(cpu.regs.a, 0x13);
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.step(&mut bus), 15);
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.regs.ix, 0x1234);
}

#[test]
fn index_memory_forms_use_real_h_and_l() {
    // LD H,(IX+0) keeps IXH intact.
    let (mut cpu, mut bus) = cpu_with(&[0xDD, 0x66, 0x00]);
    cpu.regs.ix = 0x3000;
    bus.poke_byte(0x3000, 0x9A);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.h, 0x9A);
    assert_eq!(cpu.regs.ix, 0x3000);
}

#[test]
fn index_prefix_on_plain_opcode_adds_four_states() {
    let (mut cpu, mut bus) = cpu_with(&[0xDD, 0x00, 0xFD, 0x47]);
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.pc, 2);
    cpu.regs.a = 0x5C;
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.b, 0x5C);
}

#[test]
fn repeated_prefix_acts_as_four_state_nop() {
    let (mut cpu, mut bus) = cpu_with(&[0xDD, 0xFD, 0x21, 0x34, 0x12]);
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.regs.pc, 1);
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.regs.iy, 0x1234);
    assert_eq!(cpu.regs.ix, 0x0000);
    // Three opcode bytes were fetched: DD, FD, 21.
    assert_eq!(cpu.regs.r(), 3);
}

#[test]
fn prefix_chain_refresh_keeps_bit_7() {
    let (mut cpu, mut bus) = cpu_with(&[0xFD, 0xDD, 0xED, 0x44]);
    cpu.regs.set_r(0x80);
    cpu.step_n(&mut bus, 3).unwrap();
    assert_eq!(cpu.regs.r(), 0x84);
    assert_eq!(cpu.regs.pc, 4);
}

#[test]
fn indexed_bit_ops_copy_into_register() {
    // SET 3,(IX+2),B / BIT 7,(IX+2) / RL (IX+2)
    let (mut cpu, mut bus) = cpu_with(&[
        0xDD, 0xCB, 0x02, 0xD8, 0xDD, 0xCB, 0x02, 0x7E, 0xDD, 0xCB, 0x02, 0x16,
    ]);
    cpu.regs.ix = 0x4000;
    bus.poke_byte(0x4002, 0x80);

    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(bus.peek_byte(0x4002), 0x88);
    assert_eq!(cpu.regs.b, 0x88);

    assert_eq!(cpu.step(&mut bus), 20);
    assert!(!cpu.regs.f.contains(Flags::Z));
    assert!(cpu.regs.f.contains(Flags::S));

    cpu.regs.f = Flags::empty();
    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(bus.peek_byte(0x4002), 0x10);
    assert!(cpu.regs.f.contains(Flags::C));
}

#[test]
fn ed_arithmetic_and_transfers() {
    let (mut cpu, mut bus) = cpu_with(&[
        0xED, 0x44, // NEG
        0xED, 0x5A, // ADC HL,DE
        0xED, 0x42, // SBC HL,BC
        0xED, 0x53, 0x00, 0x90, // LD (9000),DE
        0xED, 0x4B, 0x00, 0x90, // LD BC,(9000)
        0xED, 0x56, // IM 1
    ]);
    cpu.regs.a = 0x01;
    cpu.regs.set_hl(0x1000);
    cpu.regs.set_de(0x0234);
    cpu.regs.set_bc(0x0100);

    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.a, 0xFF);
    assert!(cpu.regs.f.contains(Flags::C | Flags::N));

    assert_eq!(cpu.step(&mut bus), 15);
    assert_eq!(cpu.regs.hl(), 0x1235);

    assert_eq!(cpu.step(&mut bus), 15);
    assert_eq!(cpu.regs.hl(), 0x1135);

    assert_eq!(cpu.step(&mut bus), 20);
    assert_eq!(bus.peek_word(0x9000), 0x0234);
    assert_eq!(cpu.step(&mut bus), 20);
    assert_eq!(cpu.regs.bc(), 0x0234);

    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.im, InterruptMode::Im1);
}

#[test]
fn ld_a_i_reports_iff2_in_parity_flag() {
    // LD I,A / LD A,I
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0x47, 0xED, 0x57, 0xED, 0x57]);
    cpu.regs.a = 0x80;
    assert_eq!(cpu.step(&mut bus), 9);
    cpu.regs.a = 0;
    cpu.regs.iff2 = true;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.f.contains(Flags::PV | Flags::S));
    cpu.regs.iff2 = false;
    cpu.step(&mut bus);
    assert!(!cpu.regs.f.contains(Flags::PV));
}

#[test]
fn ed_port_forms_use_c() {
    // IN B,(C) / OUT (C),A / OUT (C),0
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0x40, 0xED, 0x79, 0xED, 0x71]);
    cpu.regs.c = 0x44;
    cpu.regs.a = 0x99;
    bus.set_port(0x44, 0x00);
    assert_eq!(cpu.step(&mut bus), 12);
    assert_eq!(cpu.regs.b, 0x00);
    assert!(cpu.regs.f.contains(Flags::Z | Flags::PV));
    cpu.step(&mut bus);
    assert_eq!(bus.port(0x44), 0x99);
    cpu.step(&mut bus);
    assert_eq!(bus.port(0x44), 0x00);
}

#[test]
fn rld_rotates_digits_through_memory() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0x6F]);
    cpu.regs.a = 0x12;
    cpu.regs.set_hl(0x5000);
    bus.poke_byte(0x5000, 0x34);
    assert_eq!(cpu.step(&mut bus), 18);
    assert_eq!(cpu.regs.a, 0x13);
    assert_eq!(bus.peek_byte(0x5000), 0x42);
}

#[test]
fn undefined_ed_opcode_is_a_counted_nop() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0x00, 0x00]);
    let before = cpu.regs;
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.pc, 2);
    assert_eq!(cpu.unimplemented_count(), 1);
    assert_eq!(cpu.regs.a, before.a);
    assert_eq!(cpu.regs.f, before.f);
    // Execution carries on.
    assert_eq!(cpu.step(&mut bus), 4);
}

#[test]
fn cpir_stops_on_match() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0xB1]);
    bus.load(0x4000, &[0x10, 0x42, 0x99]);
    cpu.regs.a = 0x42;
    cpu.regs.set_hl(0x4000);
    cpu.regs.set_bc(3);

    assert_eq!(cpu.step(&mut bus), 21);
    assert_eq!(cpu.regs.pc, 0x0000);
    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(cpu.regs.pc, 0x0002);

    assert_eq!(cpu.regs.hl(), 0x4002);
    assert_eq!(cpu.regs.bc(), 1);
    assert!(cpu.regs.f.contains(Flags::Z));
    assert!(cpu.regs.f.contains(Flags::PV));
}

#[test]
fn ldir_copies_until_bc_is_zero() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0xB0]);
    bus.load(0x4000, &[1, 2, 3]);
    cpu.regs.set_hl(0x4000);
    cpu.regs.set_de(0x5000);
    cpu.regs.set_bc(3);

    let costs: Vec<u32> = (0..3).map(|_| cpu.step(&mut bus)).collect();
    assert_eq!(costs, vec![21, 21, 16]);
    assert_eq!(cpu.regs.pc, 2);
    assert_eq!(&bus.ram()[0x5000..0x5003], &[1, 2, 3]);
    assert_eq!(cpu.regs.bc(), 0);
    assert_eq!(cpu.regs.hl(), 0x4003);
    assert_eq!(cpu.regs.de(), 0x5003);
    assert!(!cpu.regs.f.contains(Flags::PV));
}

#[test]
fn lddr_walks_downwards() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0xB8]);
    bus.load(0x4000, &[7, 8]);
    cpu.regs.set_hl(0x4001);
    cpu.regs.set_de(0x5001);
    cpu.regs.set_bc(2);
    cpu.step_n(&mut bus, 2).unwrap();
    assert_eq!(&bus.ram()[0x5000..0x5002], &[7, 8]);
    assert_eq!(cpu.regs.hl(), 0x3FFF);
}

#[test]
fn otir_repeats_until_b_is_zero() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0xB3]);
    bus.load(0x4000, &[0xA1, 0xA2]);
    cpu.regs.set_hl(0x4000);
    cpu.regs.b = 2;
    cpu.regs.c = 0x30;
    assert_eq!(cpu.step(&mut bus), 21);
    assert_eq!(bus.port(0x30), 0xA1);
    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(bus.port(0x30), 0xA2);
    assert_eq!(cpu.regs.b, 0);
    assert!(cpu.regs.f.contains(Flags::Z));
}

#[test]
fn inir_stores_port_reads() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0xB2]);
    bus.set_port(0x31, 0x5A);
    cpu.regs.set_hl(0x6000);
    cpu.regs.b = 3;
    cpu.regs.c = 0x31;
    cpu.step_n(&mut bus, 3).unwrap();
    assert_eq!(&bus.ram()[0x6000..0x6003], &[0x5A; 3]);
    assert_eq!(cpu.regs.pc, 2);
}

#[test]
fn refresh_counter_counts_opcode_fetches() {
    // NOP / LD IX,nn / RLC B / LD R,A
    let (mut cpu, mut bus) = cpu_with(&[0x00, 0xDD, 0x21, 0x00, 0x00, 0xCB, 0x00, 0xED, 0x4F]);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r(), 1);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r(), 3);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r(), 5);
    cpu.regs.a = 0xFF;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r(), 0xFF);
}

#[test]
fn halt_waits_on_its_own_opcode() {
    let (mut cpu, mut bus) = cpu_with(&[0x76, 0x00]);
    assert_eq!(cpu.step(&mut bus), 4);
    assert!(cpu.is_halted());
    for _ in 0..5 {
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.regs.pc, 0x0000);
    }
    assert_eq!(cpu.cost(), 24);
}

#[test]
fn mode2_interrupt_reads_vector_table() {
    let (mut cpu, mut bus, intc) = wired(&[0x00, 0x00]);
    cpu.regs.i = 0x90;
    bus.poke_word(0x9004, 0x1234);
    intc.write_mask(0x01);
    intc.request_interrupt(2);
    assert!(cpu.signals().irq_asserted());

    assert_eq!(cpu.step(&mut bus), 4 + 19);
    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.sp, 0xEFFE);
    assert_eq!(bus.peek_word(cpu.regs.sp), 0x0001);
    assert!(!cpu.regs.iff1 && !cpu.regs.iff2);
    assert!(!cpu.signals().irq_asserted());
    assert_eq!(intc.pending(), 0);
}

#[test]
fn mode1_interrupt_jumps_to_0x38() {
    let (mut cpu, mut bus, intc) = wired(&[0x00]);
    cpu.regs.im = InterruptMode::Im1;
    intc.request_interrupt(5);
    assert_eq!(cpu.step(&mut bus), 4 + 13);
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(bus.peek_word(cpu.regs.sp), 0x0001);
}

#[test]
fn mode0_executes_offset_as_opcode() {
    // Channel 2 offset 4 is INC B.
    let (mut cpu, mut bus, intc) = wired(&[0x00]);
    cpu.regs.im = InterruptMode::Im0;
    intc.write_mask(0x01);
    intc.request_interrupt(2);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.b, 1);
    assert!(!cpu.regs.iff1);
}

#[test]
fn disabled_interrupts_stay_pending() {
    let (mut cpu, mut bus, intc) = wired(&[0xF3, 0x00, 0xFB, 0x00, 0x00]);
    cpu.regs.im = InterruptMode::Im1;
    cpu.step(&mut bus);
    intc.request_interrupt(3);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 2);
    // EI: the next instruction still runs first.
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 3);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(bus.peek_word(cpu.regs.sp), 0x0004);
}

#[test]
fn interrupt_without_controller_uses_raw_channel() {
    let (mut cpu, mut bus) = cpu_with(&[0x00]);
    cpu.regs.i = 0x80;
    bus.poke_word(0x8006, 0x4321);
    cpu.signals().assert_irq(3);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x4321);
}

#[test]
fn interrupt_resumes_after_halt() {
    let (mut cpu, mut bus, intc) = wired(&[0x76, 0x00]);
    cpu.regs.im = InterruptMode::Im1;
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0);

    intc.request_interrupt(4);
    cpu.step(&mut bus);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(bus.peek_word(cpu.regs.sp), 0x0001);
}

#[test]
fn nmi_ignores_iff1_and_saves_it_in_iff2() {
    let (mut cpu, mut bus) = cpu_with(&[0xF3, 0x00]);
    cpu.step(&mut bus);
    cpu.signals().raise_nmi();
    assert_eq!(cpu.step(&mut bus), 4 + 11);
    assert_eq!(cpu.regs.pc, 0x0066);
    assert!(!cpu.regs.iff1);
    assert!(!cpu.regs.iff2);
    assert!(!cpu.signals().nmi_pending());
    assert_eq!(bus.peek_word(cpu.regs.sp), 0x0002);
}

#[test]
fn retn_restores_iff1_from_iff2() {
    let (mut cpu, mut bus) = cpu_with(&[0xED, 0x45]);
    bus.poke_word(0xF000, 0x2000);
    cpu.regs.iff1 = false;
    cpu.regs.iff2 = true;
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.regs.pc, 0x2000);
    assert!(cpu.regs.iff1);
}

#[test]
fn trace_hook_sees_state_before_fetch() {
    let (mut cpu, mut bus) = cpu_with(&[0x00, 0x00, 0x76]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    cpu.set_trace_hook(Box::new(move |regs: &Registers| {
        sink.lock().unwrap().push(regs.pc);
    }));
    cpu.step_n(&mut bus, 5).unwrap();
    // Halted cycles are not traced.
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn step_n_honours_stop_request() {
    let (mut cpu, mut bus) = cpu_with(&[0x00; 16]);
    cpu.signals().request_stop();
    assert_eq!(cpu.step_n(&mut bus, 10), Ok(0));
    assert_eq!(cpu.regs.pc, 0);
    cpu.signals().clear_stop();
    assert_eq!(cpu.step_n(&mut bus, 3), Ok(12));
}

#[test]
fn debugger_register_access_by_name() {
    let mut cpu = Cpu::new();
    cpu.set_reg16(Reg16::Hl, 0xABCD);
    assert_eq!(cpu.reg8(Reg8::H), 0xAB);
    cpu.set_reg8(Reg8::F, 0xFF);
    assert_eq!(cpu.reg16(Reg16::Af) & 0xFF, 0xFF);
    cpu.regs_mut().pc = 0x1000;
    assert_eq!(cpu.regs().pc, 0x1000);
}

#[test]
fn stop_from_another_thread_ends_halt_wait() {
    let (mut cpu, mut bus) = cpu_with(&[0xF3, 0x76]);
    cpu.set_halt_poll(Duration::from_millis(1));
    let signals = cpu.signals();
    let worker = thread::spawn(move || {
        let result = cpu.run(&mut bus);
        (cpu, result)
    });

    thread::sleep(Duration::from_millis(10));
    let asked = Instant::now();
    signals.request_stop();
    let (cpu, result) = worker.join().unwrap();
    assert!(asked.elapsed() < Duration::from_millis(500));
    assert_eq!(result, Ok(()));
    assert!(cpu.is_halted());
    assert_eq!(cpu.regs.pc, 0x0001);
}
