extern crate byteorder;
#[macro_use]
extern crate log;
extern crate thiserror;

pub mod machine;
pub mod opcode;
pub mod emit;
pub mod traits;
pub mod asm;
pub mod bytecode;
pub mod decode;
pub mod disasm;
pub mod error;

pub use asm::{Assembler, LabelId};
pub use bytecode::Bytecode;
pub use error::{Error, Result};
pub use machine::{Machine, Register};
pub use opcode::{Cond, OpCode};
