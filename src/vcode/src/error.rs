use crate::ir::OpKind;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("cannot compile vcode op {0} to bytecode")]
    Unsupported(OpKind),

    #[error(transparent)]
    Bytecode(#[from] assembler::Error),

    #[error("frame of {size} bytes exceeds the limit of {limit}")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("stack access at {addr} outside frame of {frame_size} bytes")]
    StackOutOfBounds { addr: i64, frame_size: usize },
}
