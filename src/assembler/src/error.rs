use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("invalid bytecode {opcode:02x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("instruction at offset {offset} runs past the end of the bytecode")]
    Truncated { offset: usize },

    #[error("register {reg} out of range at offset {offset}")]
    BadRegister { reg: u8, offset: usize },

    #[error("{0} label(s) never bound")]
    UnboundLabels(usize),
}
