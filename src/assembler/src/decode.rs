/// Instruction decoding shared by the disassembler and the interpreter.

use crate::error::{Error, Result};
use crate::machine::{Machine, Register};
use crate::opcode::{Cond, OpCode, Operand, MAX_OPERANDS};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Instr {
    opcode: OpCode,
    offset: usize,
    args: [i32; MAX_OPERANDS],
}

impl Instr {
    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Byte offset of the opcode.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.opcode.len()
    }

    /// Offset of the next instruction in program order.
    pub fn next(&self) -> usize {
        self.offset + self.len()
    }

    pub fn args(&self) -> &[i32] {
        &self.args[..self.opcode.operands().len()]
    }

    pub fn arg(&self, ix: usize) -> i32 {
        self.args()[ix]
    }

    pub fn reg(&self, ix: usize) -> Register {
        Register::from_u8(self.arg(ix) as u8)
    }

    pub fn cond(&self, ix: usize) -> Cond {
        Cond::from_bits(self.arg(ix) as u8)
    }

    /// Byte offset of operand `ix` within the code.
    pub fn operand_offset(&self, ix: usize) -> usize {
        let widths: usize = self.opcode.operands()[..ix].iter().map(|o| o.width()).sum();
        self.offset + 1 + widths
    }

    /// Absolute target of a branch: the displacement is relative to the
    /// position of the displacement field itself.
    pub fn branch_target(&self) -> Option<usize> {
        let ix = self.opcode.operands().iter().position(|o| *o == Operand::Disp)?;
        Some((self.operand_offset(ix) as isize + self.arg(ix) as isize) as usize)
    }
}

/// Decodes the instruction at `offset`. Never reads beyond `bytes`.
pub fn decode_at(machine: &Machine, bytes: &[u8], offset: usize) -> Result<Instr> {
    let opcode = match bytes.get(offset) {
        Some(&b) => {
            OpCode::from_u8(b).ok_or(Error::UnknownOpcode {
                    opcode: b,
                    offset: offset,
                })?
        }
        None => return Err(Error::Truncated { offset: offset }),
    };
    if offset + opcode.len() > bytes.len() {
        return Err(Error::Truncated { offset: offset });
    }

    let mut args = [0; MAX_OPERANDS];
    let mut pos = offset + 1;
    for (ix, operand) in opcode.operands().iter().enumerate() {
        let field = &bytes[pos..pos + operand.width()];
        args[ix] = match *operand {
            Operand::Reg | Operand::Base => {
                if field[0] as usize >= machine.num_regs() {
                    return Err(Error::BadRegister {
                        reg: field[0],
                        offset: offset,
                    });
                }
                field[0] as i32
            }
            Operand::Imm8 => field[0] as i8 as i32,
            Operand::Mask => field[0] as i32,
            Operand::Offset | Operand::Disp => machine.read_i16(field) as i32,
            Operand::Imm32 => machine.read_i32(field),
        };
        pos += operand.width();
    }

    Ok(Instr {
        opcode: opcode,
        offset: offset,
        args: args,
    })
}

/// Decodes a whole instruction stream in program order.
pub struct Instructions<'a> {
    machine: &'a Machine,
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(machine: &'a Machine, bytes: &'a [u8]) -> Self {
        Instructions {
            machine: machine,
            bytes: bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        match decode_at(self.machine, self.bytes, self.pos) {
            Ok(instr) => {
                self.pos = instr.next();
                Some(Ok(instr))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
