extern crate assembler;
extern crate bit_vec;
extern crate byteorder;
extern crate fnv;
#[macro_use]
extern crate log;
extern crate thiserror;

pub mod ir;
pub mod codegen;
pub mod interp;
pub mod config;
pub mod error;
mod tests;

pub use codegen::compile;
pub use config::Config;
pub use error::{Error, Result};
pub use interp::Interpreter;
