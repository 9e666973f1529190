use crate::decode::Instructions;
use crate::disasm;
use crate::machine::Machine;

use std::fmt;

/// A finished unit of bytecode. Immutable once built by the assembler, so it
/// can be shared freely between interpreters.
pub struct Bytecode {
    bytes: Box<[u8]>,
    frame_size: usize,
    machine: Machine,
}

impl Bytecode {
    pub(crate) fn new(bytes: Vec<u8>, frame_size: usize, machine: Machine) -> Self {
        Bytecode {
            bytes: bytes.into_boxed_slice(),
            frame_size: frame_size,
            machine: machine,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn length(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes of stack storage needed to run this code.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn instructions(&self) -> Instructions {
        Instructions::new(&self.machine, &self.bytes)
    }
}

impl fmt::Debug for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Bytecode")
            .field("machine", &self.machine.name())
            .field("length", &self.length())
            .field("frame_size", &self.frame_size)
            .finish()
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match disasm::disassemble_into(self, f) {
            Ok(res) => res,
            Err(e) => write!(f, "<{}>", e),
        }
    }
}
