/// The bytecode assembler. Labels live in an arena owned by the assembler
/// and are referred to by `LabelId`, so a label can neither outlive the
/// assembly nor escape it unbound.

use crate::bytecode::Bytecode;
use crate::emit::{Emit, Label};
use crate::error::{Error, Result};
use crate::machine::{Machine, Register};
use crate::opcode::{Cond, OpCode, Operand};
use crate::traits::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct LabelId(usize);

pub struct Assembler {
    machine: Machine,
    emit: Emit,
    labels: Vec<Label>,
    frame_size: usize,
}

fn fits_i8(value: i32) -> bool {
    value >= i8::min_value() as i32 && value <= i8::max_value() as i32
}

impl Assembler {
    pub fn new(machine: &Machine) -> Self {
        Assembler {
            machine: *machine,
            emit: Emit::new(),
            labels: vec![],
            frame_size: 0,
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn sp(&self) -> Register {
        self.machine.sp_reg()
    }

    pub fn here(&self) -> usize {
        self.emit.here()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Reserves `size` bytes of stack frame, returning their offset.
    pub fn alloc_frame(&mut self, size: usize) -> usize {
        let offset = self.frame_size;
        self.frame_size += size;
        offset
    }

    pub fn new_label(&mut self) -> LabelId {
        self.labels.push(Label::new());
        LabelId(self.labels.len() - 1)
    }

    pub fn bind(&mut self, label: LabelId) -> &mut Self {
        trace!("bind L{} @ {}", label.0, self.emit.here());
        self.labels[label.0].bind(&mut self.emit);
        self
    }

    /// Freezes the code into an immutable `Bytecode`. Every label must have
    /// been bound by now.
    pub fn finish(self) -> Result<Bytecode> {
        let unbound = self.labels.iter().filter(|l| !l.is_bound()).count();
        if unbound > 0 {
            return Err(Error::UnboundLabels(unbound));
        }
        debug!("assembled {} bytes, frame size {}",
               self.emit.here(),
               self.frame_size);
        Ok(Bytecode::new(self.emit.into(), self.frame_size, self.machine))
    }

    /// Encodes `op` by walking its operand table, the same table the
    /// decoder reads.
    fn encode(&mut self, op: OpCode, args: &[Arg]) {
        let start = self.emit.here();
        trace!("{:04} {}", start, op.mnemonic());

        let shape = op.operands();
        assert_eq!(shape.len(), args.len(), "{} takes {} operands", op.mnemonic(), shape.len());
        self.emit.write_byte(op.encoding());
        for (operand, arg) in shape.iter().zip(args) {
            match (*operand, *arg) {
                (Operand::Reg, Arg::Reg(reg)) | (Operand::Base, Arg::Reg(reg)) => self.reg(reg),
                (Operand::Imm8, Arg::Imm(value)) => {
                    assert!(fits_i8(value), "{} does not fit in 8 bits", value);
                    self.emit.write_byte(value as i8 as u8);
                }
                (Operand::Offset, Arg::Imm(value)) => {
                    assert!(value >= i16::min_value() as i32 && value <= i16::max_value() as i32,
                            "Offset {} out of range",
                            value);
                    let mut buf = [0; 2];
                    self.machine.write_i16(&mut buf, value as i16);
                    self.emit.write_bytes(&buf);
                }
                (Operand::Imm32, Arg::Imm(value)) => {
                    let mut buf = [0; 4];
                    self.machine.write_i32(&mut buf, value);
                    self.emit.write_bytes(&buf);
                }
                (Operand::Mask, Arg::Cond(cond)) => self.emit.write_byte(cond.bits()),
                (Operand::Disp, Arg::Label(label)) => {
                    self.labels[label.0].write_disp(&mut self.emit);
                }
                (operand, arg) => {
                    panic!("{}: {:?} given for a {:?} operand", op.mnemonic(), arg, operand)
                }
            }
        }
        debug_assert_eq!(op.len(), self.emit.here() - start);
    }

    fn reg(&mut self, reg: Register) {
        assert!(reg.index() < self.machine.num_regs(),
                "{} out of range for {}",
                reg,
                self.machine.name());
        self.emit.write_byte(reg.encoding());
    }
}

/// An operand value, matched against `Operand` by `encode`.
#[derive(Debug, Clone, Copy)]
enum Arg {
    Reg(Register),
    Imm(i32),
    Cond(Cond),
    Label(LabelId),
}

impl EmitNop for Assembler {
    fn nop(&mut self) -> &mut Self {
        self.encode(OpCode::Nop, &[]);
        self
    }
}

impl EmitMov<Register, Register> for Assembler {
    fn mov(&mut self, dst: Register, src: Register) -> &mut Self {
        self.encode(OpCode::Mov, &[Arg::Reg(dst), Arg::Reg(src)]);
        self
    }
}

impl EmitMov<Register, i32> for Assembler {
    fn mov(&mut self, dst: Register, src: i32) -> &mut Self {
        let op = if fits_i8(src) { OpCode::Movb } else { OpCode::Movw };
        self.encode(op, &[Arg::Reg(dst), Arg::Imm(src)]);
        self
    }
}

impl EmitAdd<Register, i32> for Assembler {
    fn add(&mut self, dst: Register, src: i32) -> &mut Self {
        let op = if fits_i8(src) { OpCode::Addb } else { OpCode::Addw };
        self.encode(op, &[Arg::Reg(dst), Arg::Imm(src)]);
        self
    }
}

impl EmitAdd<Register, Register> for Assembler {
    fn add(&mut self, dst: Register, src: Register) -> &mut Self {
        self.encode(OpCode::Add, &[Arg::Reg(dst), Arg::Reg(src)]);
        self
    }
}

impl EmitMul<Register, Register> for Assembler {
    fn mul(&mut self, dst: Register, src: Register) -> &mut Self {
        self.encode(OpCode::Mul, &[Arg::Reg(dst), Arg::Reg(src)]);
        self
    }
}

impl EmitStr for Assembler {
    fn str(&mut self, base: Register, offset: i16, src: Register) -> &mut Self {
        self.encode(OpCode::Str,
                    &[Arg::Reg(base), Arg::Imm(offset as i32), Arg::Reg(src)]);
        self
    }
}

impl EmitLdr for Assembler {
    fn ldr(&mut self, dst: Register, base: Register, offset: i16) -> &mut Self {
        self.encode(OpCode::Ldr,
                    &[Arg::Reg(dst), Arg::Reg(base), Arg::Imm(offset as i32)]);
        self
    }
}

impl EmitCmp for Assembler {
    fn cmp(&mut self, lhs: Register, rhs: Register) -> &mut Self {
        self.encode(OpCode::Cmp, &[Arg::Reg(lhs), Arg::Reg(rhs)]);
        self
    }

    fn cset(&mut self, dst: Register, cond: Cond) -> &mut Self {
        self.encode(OpCode::Cset, &[Arg::Reg(dst), Arg::Cond(cond)]);
        self
    }
}

impl EmitBranch<LabelId> for Assembler {
    fn jmp(&mut self, label: LabelId) -> &mut Self {
        self.encode(OpCode::Jmp, &[Arg::Label(label)]);
        self
    }

    fn cbnz(&mut self, reg: Register, label: LabelId) -> &mut Self {
        self.encode(OpCode::Cbnz, &[Arg::Reg(reg), Arg::Label(label)]);
        self
    }

    fn cbz(&mut self, reg: Register, label: LabelId) -> &mut Self {
        self.encode(OpCode::Cbz, &[Arg::Reg(reg), Arg::Label(label)]);
        self
    }
}

impl EmitRet for Assembler {
    fn ret(&mut self) -> &mut Self {
        self.encode(OpCode::Ret, &[]);
        self
    }
}
