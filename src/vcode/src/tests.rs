#![cfg(test)]

use super::codegen::{compile, SLOT_SIZE};
use super::config::Config;
use super::error::Error;
use super::interp::Interpreter;
use super::ir::*;

use assembler::traits::*;
use assembler::{Assembler, Bytecode, Cond, Machine, OpCode};

use fnv::FnvHashMap;

use std::sync::Arc;
use std::thread;

// Test helpers.

/// One expected byte of compiled code.
#[derive(Clone, Copy, Debug)]
enum Check {
    Byte(u8),
    // Don't care.
    Any,
    // A register placeholder: the same placeholder must always match the
    // same register byte.
    Reg(u8),
}

use self::Check::*;

fn op(code: OpCode) -> Check {
    Byte(code.encoding())
}

fn check_bytecodes(code: &Bytecode, expect: &[Check]) {
    let bytes = code.bytes();
    let mut placeholders = FnvHashMap::default();

    assert!(expect.len() <= bytes.len(),
            "expected more than {} bytes\n\n{}",
            bytes.len(),
            code);

    for (ix, (check, &b)) in expect.iter().zip(bytes).enumerate() {
        match *check {
            Byte(value) => {
                assert_eq!(value, b, "bytecode mismatch at offset {}\n\n{}", ix, code);
            }
            Any => {}
            Reg(num) => {
                let first = *placeholders.entry(num).or_insert(b);
                assert_eq!(first, b, "placeholder _{} mismatch at offset {}\n\n{}", num, ix, code);
            }
        }
    }

    assert_eq!(expect.len(), bytes.len(), "did not match all bytecodes\n\n{}", code);
}

fn compile_interp(unit: &Unit) -> Bytecode {
    compile(Machine::interp(), unit).unwrap()
}

fn run_with(interp: &mut Interpreter, unit: &Unit, code: &Bytecode, args: &[i32]) -> i32 {
    assert_eq!(unit.params().len(), args.len());
    for (param, arg) in unit.params().iter().zip(args) {
        interp.set_reg(param.0, *arg);
    }
    interp.run(code).unwrap()
}

fn run(unit: &Unit, args: &[i32]) -> i32 {
    let code = compile_interp(unit);
    let mut interp = Interpreter::new(Machine::interp());
    run_with(&mut interp, unit, &code, args)
}

fn mnemonics(code: &Bytecode) -> Vec<&'static str> {
    code.instructions().map(|i| i.unwrap().opcode().mnemonic()).collect()
}

fn unit_add_const(value: i32) -> Unit {
    let mut b = UnitBuilder::new("add_const");
    let x = b.param();
    let sum = b.addi(x, value);
    b.ret(sum);
    b.finish()
}

// `count` values: the parameter, then constants, the last of which is
// spilled to a variable.
fn unit_with_values(count: usize) -> Unit {
    let mut b = UnitBuilder::new("wide");
    let x = b.param();
    let v = b.var("v");
    let mut last = x;
    for n in 1..count {
        last = b.const_((n % 100) as i32);
    }
    b.store(v, last);
    b.ret(x);
    b.finish()
}

fn unit_cmp(kind: CmpKind) -> Unit {
    let mut b = UnitBuilder::new("cmp");
    let x = b.param();
    let y = b.param();
    let res = b.cmp(kind, x, y);
    b.ret(res);
    b.finish()
}

// Code generation.

#[test]
fn test_compile_add1() {
    let code = compile_interp(&sample_add1());
    check_bytecodes(&code,
                    &[op(OpCode::Mov), Reg(1), Byte(0),
                      op(OpCode::Addb), Reg(1), Byte(0x01),
                      op(OpCode::Mov), Byte(0), Reg(1),
                      op(OpCode::Ret)]);
    assert_eq!(0, code.frame_size());
}

#[test]
fn test_narrow_immediate_selected() {
    let code = compile_interp(&unit_add_const(1));
    let ops = mnemonics(&code);
    assert!(ops.contains(&"ADDB"));
    assert!(!ops.contains(&"ADDW"));
}

#[test]
fn test_wide_immediate_selected() {
    let code = compile_interp(&unit_add_const(1000));
    check_bytecodes(&code,
                    &[op(OpCode::Mov), Reg(1), Byte(0),
                      op(OpCode::Addw), Reg(1), Byte(0xe8), Byte(0x03), Byte(0), Byte(0),
                      op(OpCode::Mov), Byte(0), Reg(1),
                      op(OpCode::Ret)]);
    assert_eq!(1005, run(&unit_add_const(1000), &[5]));
    assert_eq!(-123, run(&unit_add_const(-128), &[5]));
}

#[test]
fn test_constants() {
    let mut b = UnitBuilder::new("consts");
    let small = b.const_(-7);
    b.const_(70000);
    b.ret(small);
    let code = compile_interp(&b.finish());
    check_bytecodes(&code,
                    &[op(OpCode::Movb), Byte(0), Any,
                      op(OpCode::Movw), Byte(1), Any, Any, Any, Any,
                      op(OpCode::Ret)]);
    // The returned value is already in the result register.
    assert_eq!(-7, Interpreter::new(Machine::interp()).run(&code).unwrap());
}

#[test]
fn test_cond_always_jumps_to_false_block() {
    let code = compile_interp(&sample_max());
    assert_eq!(vec!["CMP", "CSET", "CBNZ", "JMP", "RET", "MOV", "RET"],
               mnemonics(&code));

    let instrs: Vec<_> = code.instructions().map(|i| i.unwrap()).collect();
    // CBNZ goes to the true block, JMP to the false one right after it.
    assert_eq!(Some(instrs[4].offset()), instrs[2].branch_target());
    assert_eq!(Some(instrs[5].offset()), instrs[3].branch_target());
}

#[test]
fn test_annotations_emit_nothing() {
    let mut b = UnitBuilder::new("annotated");
    let x = b.param();
    let lo = b.param();
    let hi = b.param();
    b.comment("nothing to see");
    b.debug_info(42);
    b.range_check(x, lo, hi);
    b.ret(x);
    let code = compile_interp(&b.finish());
    check_bytecodes(&code, &[op(OpCode::Ret)]);
}

#[test]
fn test_unsupported_ops_are_rejected() {
    for kind in &[OpKind::Add, OpKind::Sub, OpKind::Div, OpKind::Call] {
        let mut b = UnitBuilder::new("unsupported");
        let x = b.param();
        let y = b.param();
        let res = match *kind {
            OpKind::Add => b.add(x, y),
            OpKind::Sub => b.sub(x, y),
            OpKind::Div => b.div(x, y),
            _ => b.call(&[x, y]),
        };
        b.ret(res);
        let err = compile(Machine::interp(), &b.finish()).unwrap_err();
        assert_eq!(Error::Unsupported(*kind), err);
    }

    let err = Error::Unsupported(OpKind::Sub);
    assert_eq!("cannot compile vcode op sub to bytecode", err.to_string());
}

#[test]
fn test_frame_size() {
    let mut b = UnitBuilder::new("locals");
    let x = b.param();
    for name in &["a", "b", "c", "d", "e"] {
        let var = b.var(name);
        b.store(var, x);
    }
    b.ret(x);
    let code = compile_interp(&b.finish());
    assert_eq!(5 * SLOT_SIZE, code.frame_size());

    assert_eq!(2 * SLOT_SIZE, compile_interp(&sample_fact()).frame_size());
}

#[test]
fn test_variables_get_distinct_slots() {
    let mut b = UnitBuilder::new("swap");
    let x = b.param();
    let y = b.param();
    let vx = b.var("x");
    let vy = b.var("y");
    b.store(vx, x);
    b.store(vy, y);
    let lx = b.load(vx);
    let ly = b.load(vy);
    let diff = b.cmp(CmpKind::Lt, ly, lx);
    b.ret(diff);
    let unit = b.finish();

    assert_eq!(1, run(&unit, &[5, 3]));
    assert_eq!(0, run(&unit, &[3, 5]));
}

#[test]
#[should_panic]
fn test_bad_value_handle_panics() {
    let mut b = UnitBuilder::new("bad");
    b.ret(ValueId(3));
    let _ = compile(Machine::interp(), &b.finish());
}

#[test]
fn test_values_up_to_sp_compile() {
    let sp = Machine::interp().sp_reg().index();
    let unit = unit_with_values(sp);
    assert_eq!(sp, unit.num_values());
    let code = compile_interp(&unit);
    assert!(!code.to_string().contains("MOVB SP"));
    assert_eq!(7, run(&unit, &[7]));
}

#[test]
#[should_panic(expected = "would live in SP")]
fn test_value_in_sp_panics() {
    let unit = unit_with_values(Machine::interp().num_regs());
    let _ = compile(Machine::interp(), &unit);
}

#[test]
fn test_disassembly_consumes_exact_length() {
    for unit in &[sample_add1(), sample_fact(), sample_max(), unit_add_const(1 << 20)] {
        let code = compile_interp(unit);
        let mut instrs = code.instructions();
        assert!(instrs.by_ref().all(|i| i.is_ok()));
        assert_eq!(code.length(), instrs.position());
        assert_eq!(instrs.count(), 0);
        assert!(assembler::disasm::disassemble(&code).is_ok());
    }
}

// Execution.

#[test]
fn test_run_add1() {
    let unit = sample_add1();
    let code = compile_interp(&unit);
    let mut interp = Interpreter::new(Machine::interp());
    assert_eq!(6, run_with(&mut interp, &unit, &code, &[5]));
    assert_eq!(43, run_with(&mut interp, &unit, &code, &[42]));
}

#[test]
fn test_run_fact() {
    let unit = sample_fact();
    let code = compile_interp(&unit);
    let mut interp = Interpreter::new(Machine::interp());
    assert_eq!(1, run_with(&mut interp, &unit, &code, &[1]));
    assert_eq!(120, run_with(&mut interp, &unit, &code, &[5]));
    assert_eq!(3628800, run_with(&mut interp, &unit, &code, &[10]));
}

#[test]
fn test_run_both_branches() {
    let unit = sample_max();
    assert_eq!(5, run(&unit, &[3, 5]));
    assert_eq!(7, run(&unit, &[7, 2]));
    assert_eq!(-1, run(&unit, &[-1, -1]));
}

#[test]
fn test_cmp_cset_table() {
    let kinds = [CmpKind::Eq, CmpKind::Neq, CmpKind::Lt, CmpKind::Leq, CmpKind::Gt, CmpKind::Geq];
    let less = [0, 1, 1, 1, 0, 0];
    let equal = [1, 0, 0, 1, 0, 1];
    for (ix, kind) in kinds.iter().enumerate() {
        let unit = unit_cmp(*kind);
        assert_eq!(less[ix], run(&unit, &[3, 5]), "{:?} 3 5", kind);
        assert_eq!(equal[ix], run(&unit, &[5, 5]), "{:?} 5 5", kind);
    }
}

#[test]
fn test_flags_after_cmp() {
    let unit = unit_cmp(CmpKind::Eq);
    let code = compile_interp(&unit);
    let mut interp = Interpreter::new(Machine::interp());
    run_with(&mut interp, &unit, &code, &[3, 5]);
    assert_eq!(Cond::compare(3, 5), interp.flags());
    run_with(&mut interp, &unit, &code, &[5, 5]);
    let bits = Cond::EQ.bits() | Cond::LE.bits() | Cond::GE.bits();
    assert_eq!(bits, interp.flags().bits());
}

#[test]
fn test_flags_reset_between_runs() {
    let unit = unit_cmp(CmpKind::Eq);
    let code = compile_interp(&unit);
    let mut interp = Interpreter::new(Machine::interp());
    assert_eq!(1, run_with(&mut interp, &unit, &code, &[5, 5]));

    // CSET without a CMP sees no flags from the run before.
    let m = Machine::interp();
    let mut asm = Assembler::new(m);
    asm.cset(m.reg(0), Cond::EQ).ret();
    let stale = asm.finish().unwrap();
    assert_eq!(0, interp.run(&stale).unwrap());
    assert_eq!(0, interp.flags().bits());
}

#[test]
fn test_arithmetic_wraps() {
    let mut b = UnitBuilder::new("square");
    let x = b.param();
    let sq = b.mul(x, x);
    b.ret(sq);
    let square = b.finish();
    assert_eq!(0, run(&square, &[65536]));
    assert_eq!(49, run(&square, &[-7]));

    assert_eq!(i32::min_value(), run(&unit_add_const(1), &[i32::max_value()]));
}

#[test]
fn test_deterministic() {
    let unit = sample_fact();
    let code = compile_interp(&unit);
    let num_regs = Machine::interp().num_regs();

    let mut snapshots = vec![];
    for _ in 0..2 {
        let mut interp = Interpreter::new(Machine::interp());
        let res = run_with(&mut interp, &unit, &code, &[7]);
        let regs: Vec<i32> = (0..num_regs).map(|r| interp.get_reg(r)).collect();
        snapshots.push((res, regs));
    }
    assert_eq!(5040, snapshots[0].0);
    assert_eq!(snapshots[0], snapshots[1]);
}

#[test]
fn test_shared_bytecode_across_threads() {
    let unit = Arc::new(sample_fact());
    let code = Arc::new(compile_interp(&unit));
    let handles: Vec<_> = (1..5)
        .map(|n| {
            let unit = unit.clone();
            let code = code.clone();
            thread::spawn(move || {
                let mut interp = Interpreter::new(Machine::interp());
                run_with(&mut interp, &unit, &code, &[n])
            })
        })
        .collect();
    let results: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(vec![1, 2, 6, 24], results);
}

#[test]
fn test_reserved_opcodes_execute() {
    let m = Machine::interp();
    let mut asm = Assembler::new(m);
    let zero = asm.new_label();
    asm.add(m.reg(0), m.reg(1))
        .cbz(m.reg(2), zero)
        .mov(m.reg(0), -1)
        .bind(zero)
        .ret();
    let code = asm.finish().unwrap();

    let mut interp = Interpreter::new(m);
    interp.set_reg(0, 40);
    interp.set_reg(1, 2);
    interp.set_reg(2, 0);
    assert_eq!(42, interp.run(&code).unwrap());

    interp.set_reg(2, 1);
    assert_eq!(-1, interp.run(&code).unwrap());
}

#[test]
fn test_frame_limit() {
    let config = Config {
        dump: false,
        max_frame_size: 4,
    };
    let code = compile_interp(&sample_fact());
    let mut interp = Interpreter::with_config(Machine::interp(), &config);
    interp.set_reg(0, 3);
    assert_eq!(Error::FrameTooLarge {
                   size: 8,
                   limit: 4,
               },
               interp.run(&code).unwrap_err());
}

#[test]
fn test_stack_access_out_of_frame() {
    let m = Machine::interp();
    let mut asm = Assembler::new(m);
    asm.alloc_frame(4);
    let sp = asm.sp();
    asm.ldr(m.reg(1), sp, 8).ret();
    let code = asm.finish().unwrap();

    let err = Interpreter::new(m).run(&code).unwrap_err();
    assert_eq!(Error::StackOutOfBounds {
                   addr: 8,
                   frame_size: 4,
               },
               err);
}

#[test]
fn test_running_off_the_end() {
    let m = Machine::interp();
    let mut asm = Assembler::new(m);
    asm.mov(m.reg(1), 1);
    let code = asm.finish().unwrap();

    let err = Interpreter::new(m).run(&code).unwrap_err();
    assert_eq!(Error::Bytecode(assembler::Error::Truncated { offset: 3 }), err);
}

#[test]
#[should_panic]
fn test_get_reg_out_of_range_panics() {
    Interpreter::new(Machine::interp()).get_reg(256);
}

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert!(!config.dump);
    assert_eq!(super::config::DEFAULT_MAX_FRAME_SIZE, config.max_frame_size);
}

#[test]
fn test_hand_assembled_fact() {
    let m = Machine::interp();
    let n = m.reg(0);
    let i = m.reg(1);
    let acc = m.reg(8);
    let t = m.reg(9);

    let mut asm = Assembler::new(m);
    let sp = asm.sp();
    let acc_slot = asm.alloc_frame(4) as i16;
    let i_slot = asm.alloc_frame(4) as i16;
    let test = asm.new_label();
    let done = asm.new_label();

    asm.mov(i, 1)
        .str(sp, acc_slot, i)
        .str(sp, i_slot, i)
        .bind(test)
        .ldr(i, sp, i_slot)
        .cmp(i, n)
        .cset(t, Cond::GT)
        .cbnz(t, done)
        .ldr(acc, sp, acc_slot)
        .mul(acc, i)
        .str(sp, acc_slot, acc)
        .add(i, 1)
        .str(sp, i_slot, i)
        .jmp(test)
        .bind(done)
        .ldr(n, sp, acc_slot)
        .ret();
    let code = asm.finish().unwrap();
    assert_eq!(8, code.frame_size());

    let mut interp = Interpreter::new(m);
    for &(arg, expected) in &[(1, 1), (5, 120), (10, 3628800)] {
        interp.set_reg(0, arg);
        assert_eq!(expected, interp.run(&code).unwrap());
    }
}
