/// Basically a way to do multi-dispatch on different kinds of operands.

use crate::machine::Register;
use crate::opcode::Cond;

// Data movement.

pub trait EmitMov<Dst, Src> {
    fn mov(&mut self, dst: Dst, src: Src) -> &mut Self;
}

pub trait EmitAdd<Dst, Src> {
    fn add(&mut self, dst: Dst, src: Src) -> &mut Self;
}

pub trait EmitMul<Dst, Src> {
    fn mul(&mut self, dst: Dst, src: Src) -> &mut Self;
}

// Memory.

pub trait EmitStr {
    fn str(&mut self, base: Register, offset: i16, src: Register) -> &mut Self;
}

pub trait EmitLdr {
    fn ldr(&mut self, dst: Register, base: Register, offset: i16) -> &mut Self;
}

// Flags.

pub trait EmitCmp {
    fn cmp(&mut self, lhs: Register, rhs: Register) -> &mut Self;
    fn cset(&mut self, dst: Register, cond: Cond) -> &mut Self;
}

// Control flows.

pub trait EmitBranch<Op> {
    fn jmp(&mut self, op: Op) -> &mut Self;
    fn cbnz(&mut self, reg: Register, op: Op) -> &mut Self;
    fn cbz(&mut self, reg: Register, op: Op) -> &mut Self;
}

pub trait EmitRet {
    fn ret(&mut self) -> &mut Self;
}

pub trait EmitNop {
    fn nop(&mut self) -> &mut Self;
}
