/// The instruction set. Every consumer of the encoding (the assembler, the
/// decoder and through it the disassembler and the interpreter) goes through
/// `OpCode::operands`, so the operand layout is written down exactly once.

use self::Operand::*;

#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OpCode {
    Nop = 0x00,
    // reg := imm32
    Movw = 0x01,
    // return regs[result_reg]
    Ret = 0x02,
    // Reserved: dst += src. Never emitted by the code generator.
    Add = 0x03,
    // dst := src
    Mov = 0x04,
    // reg += imm32
    Addw = 0x05,
    // stack[base + offset] := src
    Str = 0x06,
    // dst := stack[base + offset]
    Ldr = 0x07,
    // dst *= src
    Mul = 0x08,
    // flags := compare(lhs, rhs)
    Cmp = 0x09,
    // dst := (flags & cond) != 0
    Cset = 0x0a,
    // pc := disp_field + disp
    Jmp = 0x0b,
    // Reserved: if reg == 0 then pc := disp_field + disp
    Cbz = 0x0c,
    // if reg != 0 then pc := disp_field + disp
    Cbnz = 0x0d,
    // reg := imm8
    Movb = 0x0e,
    // reg += imm8
    Addb = 0x0f,
}

/// The shape of a single operand field.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Operand {
    Reg,
    // A base register, always followed by its `Offset`.
    Base,
    Offset,
    Imm8,
    Imm32,
    // Condition bitmask.
    Mask,
    // Branch displacement, relative to the start of this field.
    Disp,
}

impl Operand {
    pub fn width(self) -> usize {
        match self {
            Reg | Base | Imm8 | Mask => 1,
            Offset | Disp => 2,
            Imm32 => 4,
        }
    }
}

pub const MAX_OPERANDS: usize = 3;

impl OpCode {
    pub fn from_u8(repr: u8) -> Option<Self> {
        use self::OpCode::*;

        Some(match repr {
            0x00 => Nop,
            0x01 => Movw,
            0x02 => Ret,
            0x03 => Add,
            0x04 => Mov,
            0x05 => Addw,
            0x06 => Str,
            0x07 => Ldr,
            0x08 => Mul,
            0x09 => Cmp,
            0x0a => Cset,
            0x0b => Jmp,
            0x0c => Cbz,
            0x0d => Cbnz,
            0x0e => Movb,
            0x0f => Addb,
            _ => return None,
        })
    }

    pub fn encoding(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        use self::OpCode::*;

        match self {
            Nop => "NOP",
            Movw => "MOVW",
            Ret => "RET",
            Add => "ADD",
            Mov => "MOV",
            Addw => "ADDW",
            Str => "STR",
            Ldr => "LDR",
            Mul => "MUL",
            Cmp => "CMP",
            Cset => "CSET",
            Jmp => "JMP",
            Cbz => "CBZ",
            Cbnz => "CBNZ",
            Movb => "MOVB",
            Addb => "ADDB",
        }
    }

    pub fn operands(self) -> &'static [Operand] {
        use self::OpCode::*;

        match self {
            Nop | Ret => &[],
            Movb | Addb => &[Reg, Imm8],
            Movw | Addw => &[Reg, Imm32],
            Add | Mov | Mul | Cmp => &[Reg, Reg],
            Str => &[Base, Offset, Reg],
            Ldr => &[Reg, Base, Offset],
            Cset => &[Reg, Mask],
            Jmp => &[Disp],
            Cbz | Cbnz => &[Reg, Disp],
        }
    }

    /// Encoded length including the opcode byte.
    pub fn len(self) -> usize {
        1 + self.operands().iter().map(|o| o.width()).sum::<usize>()
    }
}

/// Condition bits set by `CMP` and tested by `CSET`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Cond(u8);

impl Cond {
    pub const EQ: Cond = Cond(0x01);
    pub const NE: Cond = Cond(0x02);
    pub const GT: Cond = Cond(0x04);
    pub const LT: Cond = Cond(0x08);
    pub const GE: Cond = Cond(0x10);
    pub const LE: Cond = Cond(0x20);

    pub fn from_bits(bits: u8) -> Self {
        Cond(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Flags for a signed comparison of `lhs` against `rhs`.
    pub fn compare(lhs: i32, rhs: i32) -> Self {
        let mut flags = 0;
        if lhs == rhs {
            flags |= Cond::EQ.0;
        }
        if lhs != rhs {
            flags |= Cond::NE.0;
        }
        if lhs < rhs {
            flags |= Cond::LT.0;
        }
        if lhs <= rhs {
            flags |= Cond::LE.0;
        }
        if lhs > rhs {
            flags |= Cond::GT.0;
        }
        if lhs >= rhs {
            flags |= Cond::GE.0;
        }
        Cond(flags)
    }

    pub fn contains(self, other: Cond) -> bool {
        self.0 & other.0 != 0
    }

    pub fn name(self) -> Option<&'static str> {
        match self {
            Cond::EQ => Some("EQ"),
            Cond::NE => Some("NE"),
            Cond::GT => Some("GT"),
            Cond::LT => Some("LT"),
            Cond::GE => Some("GE"),
            Cond::LE => Some("LE"),
            _ => None,
        }
    }
}
