/// Target descriptions for the bytecode.

use byteorder::{ByteOrder, LittleEndian};

use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Machine {
    name: &'static str,
    num_regs: usize,
    result_reg: usize,
    sp_reg: usize,
}

const INTERP: Machine = Machine {
    name: "interp",
    num_regs: 256,
    result_reg: 0,
    sp_reg: 255,
};

impl Machine {
    pub fn new(name: &'static str, num_regs: usize, result_reg: usize, sp_reg: usize) -> Self {
        // Register operands are encoded in a single byte.
        assert!(num_regs <= 256, "{}: too many registers ({})", name, num_regs);
        assert!(result_reg < num_regs && sp_reg < num_regs);
        Machine {
            name: name,
            num_regs: num_regs,
            result_reg: result_reg,
            sp_reg: sp_reg,
        }
    }

    /// The target run by the interpreter.
    pub fn interp() -> &'static Machine {
        &INTERP
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn num_regs(&self) -> usize {
        self.num_regs
    }

    pub fn result_reg(&self) -> Register {
        Register(self.result_reg as u8)
    }

    pub fn sp_reg(&self) -> Register {
        Register(self.sp_reg as u8)
    }

    /// Checked conversion from a register index.
    pub fn reg(&self, ix: usize) -> Register {
        assert!(ix < self.num_regs, "{}: no register {}", self.name, ix);
        Register(ix as u8)
    }

    pub fn fmt_reg(&self, reg: Register) -> String {
        assert!(reg.index() < self.num_regs);
        if reg.index() == self.sp_reg {
            "SP".to_owned()
        } else {
            format!("R{}", reg.0)
        }
    }

    pub fn read_i16(&self, bs: &[u8]) -> i16 {
        LittleEndian::read_i16(bs)
    }

    pub fn read_i32(&self, bs: &[u8]) -> i32 {
        LittleEndian::read_i32(bs)
    }

    pub fn write_i16(&self, bs: &mut [u8], value: i16) {
        LittleEndian::write_i16(bs, value)
    }

    pub fn write_i32(&self, bs: &mut [u8], value: i32) {
        LittleEndian::write_i32(bs, value)
    }
}

/// A physical register. The stack pointer is an ordinary register, only
/// special-cased when printed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Register(u8);

impl Register {
    pub(crate) fn from_u8(repr: u8) -> Self {
        Register(repr)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn encoding(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}
