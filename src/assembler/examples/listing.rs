extern crate assembler;

use assembler::traits::*;
use assembler::{Assembler, Cond, Machine};

// Iterative factorial of R0, with the accumulator in a stack slot.
fn make_fact_code(asm: &mut Assembler) {
    let m = *asm.machine();
    let sp = asm.sp();
    let acc = asm.alloc_frame(4) as i16;
    let loop_head = asm.new_label();
    let done = asm.new_label();

    asm.mov(m.reg(1), 1)
        .str(sp, acc, m.reg(1))
        .bind(loop_head)
        .cmp(m.reg(1), m.reg(0))
        .cset(m.reg(2), Cond::GT)
        .cbnz(m.reg(2), done)
        .ldr(m.reg(3), sp, acc)
        .mul(m.reg(3), m.reg(1))
        .str(sp, acc, m.reg(3))
        .add(m.reg(1), 1)
        .jmp(loop_head)
        .bind(done)
        .ldr(m.reg(0), sp, acc)
        .ret();
}

fn main() {
    let mut asm = Assembler::new(Machine::interp());
    make_fact_code(&mut asm);
    let code = asm.finish().unwrap();
    println!("{} bytes, frame size {}", code.length(), code.frame_size());
    print!("{}", code);
}
