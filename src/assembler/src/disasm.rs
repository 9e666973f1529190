/// Textual listings of bytecode. One line per instruction: offset, mnemonic
/// and operands, then the raw bytes.

use crate::bytecode::Bytecode;
use crate::decode::Instr;
use crate::error::Result;
use crate::machine::Machine;
use crate::opcode::Operand;

use std::fmt::{self, Write};

// Raw bytes start at this column.
const BYTES_COLUMN: usize = 30;

pub fn disassemble(code: &Bytecode) -> Result<String> {
    let mut out = String::new();
    // Writing to a String can't fail.
    let _ = disassemble_into(code, &mut out)?;
    Ok(out)
}

/// Writes the listing to `out`. The outer result reports malformed code, the
/// inner one a failure of the sink.
pub fn disassemble_into<W: Write>(code: &Bytecode, out: &mut W) -> Result<fmt::Result> {
    let mut instrs = code.instructions();
    while let Some(instr) = instrs.next() {
        let instr = instr?;
        let line = format_instr(code.machine(), code.bytes(), &instr);
        if let Err(e) = writeln!(out, "{}", line) {
            return Ok(Err(e));
        }
    }
    assert_eq!(instrs.position(), code.length());
    Ok(Ok(()))
}

pub fn format_instr(machine: &Machine, bytes: &[u8], instr: &Instr) -> String {
    let mut line = format!("{:4} {}", instr.offset(), instr.opcode().mnemonic());

    let operands = instr.opcode().operands();
    let mut ix = 0;
    let mut first = true;
    while ix < operands.len() {
        line.push_str(if first { " " } else { ", " });
        first = false;

        match operands[ix] {
            Operand::Reg => line.push_str(&machine.fmt_reg(instr.reg(ix))),
            Operand::Base => {
                // Printed together with the offset that follows it.
                let offset = instr.arg(ix + 1);
                let sign = if offset < 0 { '-' } else { '+' };
                let _ = write!(line,
                               "[{}{}{}]",
                               machine.fmt_reg(instr.reg(ix)),
                               sign,
                               offset.abs());
                ix += 1;
            }
            Operand::Offset | Operand::Imm8 | Operand::Imm32 => {
                let _ = write!(line, "{}", instr.arg(ix));
            }
            Operand::Mask => {
                let cond = instr.cond(ix);
                match cond.name() {
                    Some(name) => line.push_str(name),
                    None => {
                        let _ = write!(line, "#{:#04x}", cond.bits());
                    }
                }
            }
            Operand::Disp => {
                let _ = write!(line, "{}", instr.branch_target().unwrap_or(0));
            }
        }
        ix += 1;
    }

    while line.len() < BYTES_COLUMN {
        line.push(' ');
    }
    for b in &bytes[instr.offset()..instr.next()] {
        let _ = write!(line, " {:02x}", b);
    }
    line
}
